//! Key pair model and the file classification rule.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Substring that marks a file in an alias directory as a public key.
pub const PUBLIC_KEY_MARKER: &str = ".pub";

/// Whether a key pair is linked into the default identity location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveStatus {
    Active,
    Inactive,
    /// The default identity link exists but its target is unreadable.
    Unknown,
}

/// A stored SSH key pair discovered in the key store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyPair {
    /// The alias, equal to the name of the containing directory.
    pub alias: String,

    /// Absolute path of the private key file.
    pub private_key_path: PathBuf,

    /// Absolute path of the public key file.
    pub public_key_path: PathBuf,

    /// Active status relative to the default identity location.
    pub status: ActiveStatus,
}

impl KeyPair {
    /// Whether this pair is the one linked into the default identity location.
    pub fn is_active(&self) -> bool {
        self.status == ActiveStatus::Active
    }

    /// Name of the private key file inside the alias directory.
    pub fn private_key_name(&self) -> Option<&str> {
        self.private_key_path.file_name().and_then(|n| n.to_str())
    }

    /// Name of the public key file inside the alias directory.
    pub fn public_key_name(&self) -> Option<&str> {
        self.public_key_path.file_name().and_then(|n| n.to_str())
    }
}

/// The files found directly inside one alias directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    pub private_key: Option<PathBuf>,
    pub public_key: Option<PathBuf>,
}

impl Classified {
    /// Both halves, if the directory holds a complete pair.
    pub fn into_pair(self) -> Option<(PathBuf, PathBuf)> {
        match (self.private_key, self.public_key) {
            (Some(private), Some(public)) => Some((private, public)),
            _ => None,
        }
    }
}

/// Whether a file name denotes a public key.
pub fn is_public_key_name(name: &str) -> bool {
    name.contains(PUBLIC_KEY_MARKER)
}

/// Classify the direct file children of an alias directory.
///
/// Names containing `.pub` are public keys, every other file is a private
/// key. Entries are visited in name order and the last match of each kind
/// wins. Subdirectories are ignored.
pub fn classify_alias_dir(dir: &Path) -> std::io::Result<Classified> {
    let mut entries = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut classified = Classified::default();
    for entry in entries {
        if entry.file_type()?.is_dir() {
            continue;
        }

        let path = entry.path();
        if is_public_key_name(&entry.file_name().to_string_lossy()) {
            classified.public_key = Some(path);
        } else {
            classified.private_key = Some(path);
        }
    }

    Ok(classified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_public_key_name() {
        assert!(is_public_key_name("id_rsa.pub"));
        assert!(is_public_key_name("id_ed25519.pub"));
        assert!(is_public_key_name("key.pub.bak"));
        assert!(!is_public_key_name("id_rsa"));
        assert!(!is_public_key_name("public"));
    }

    #[test]
    fn test_classify_complete_pair() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("id_rsa"), "private").unwrap();
        fs::write(temp_dir.path().join("id_rsa.pub"), "public").unwrap();

        let classified = classify_alias_dir(temp_dir.path()).unwrap();
        let (private, public) = classified.into_pair().unwrap();

        assert_eq!(private, temp_dir.path().join("id_rsa"));
        assert_eq!(public, temp_dir.path().join("id_rsa.pub"));
    }

    #[test]
    fn test_classify_private_only() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("id_rsa"), "private").unwrap();

        let classified = classify_alias_dir(temp_dir.path()).unwrap();
        assert!(classified.public_key.is_none());
        assert!(classified.into_pair().is_none());
    }

    #[test]
    fn test_classify_ignores_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("id_rsa.pub"), "public").unwrap();
        fs::create_dir(temp_dir.path().join("nested")).unwrap();
        fs::write(temp_dir.path().join("nested").join("id_rsa"), "private").unwrap();

        let classified = classify_alias_dir(temp_dir.path()).unwrap();
        assert!(classified.private_key.is_none());
        assert!(classified.public_key.is_some());
    }

    #[test]
    fn test_classify_last_private_wins() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a_key"), "one").unwrap();
        fs::write(temp_dir.path().join("b_key"), "two").unwrap();
        fs::write(temp_dir.path().join("a_key.pub"), "public").unwrap();

        let classified = classify_alias_dir(temp_dir.path()).unwrap();
        assert_eq!(classified.private_key, Some(temp_dir.path().join("b_key")));
    }

    #[test]
    fn test_key_pair_accessors() {
        let pair = KeyPair {
            alias: "work".to_string(),
            private_key_path: PathBuf::from("/store/work/id_rsa"),
            public_key_path: PathBuf::from("/store/work/id_rsa.pub"),
            status: ActiveStatus::Active,
        };

        assert!(pair.is_active());
        assert_eq!(pair.private_key_name(), Some("id_rsa"));
        assert_eq!(pair.public_key_name(), Some("id_rsa.pub"));
    }

    #[test]
    fn test_key_pair_serialization() {
        let pair = KeyPair {
            alias: "work".to_string(),
            private_key_path: PathBuf::from("/store/work/id_rsa"),
            public_key_path: PathBuf::from("/store/work/id_rsa.pub"),
            status: ActiveStatus::Inactive,
        };

        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["alias"], "work");
        assert_eq!(json["status"], "inactive");
        assert_eq!(json["private_key_path"], "/store/work/id_rsa");
    }
}
