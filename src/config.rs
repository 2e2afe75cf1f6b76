//! Path configuration.
//!
//! Each path is taken from an explicit override first (a CLI flag or its
//! environment variable, resolved by clap), then falls back to a directory
//! under `$HOME`.

use crate::error::{Result, SkmError};
use std::path::{Path, PathBuf};

/// Directory name of the key store under `$HOME`.
pub const STORE_DIR_NAME: &str = ".skm";

/// Directory name of the SSH configuration under `$HOME`.
pub const SSH_DIR_NAME: &str = ".ssh";

/// Conventional private key file name, both in alias directories and in the
/// SSH directory.
pub const PRIVATE_KEY_NAME: &str = "id_rsa";

/// Conventional public key file name.
pub const PUBLIC_KEY_NAME: &str = "id_rsa.pub";

/// Alias under which `skm init` adopts pre-existing default keys.
pub const DEFAULT_ALIAS: &str = "default";

/// Resolved locations used by the key store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root directory holding one subdirectory per alias.
    pub store_path: PathBuf,

    /// SSH directory holding the default identity links.
    pub ssh_path: PathBuf,

    /// File name of the private key.
    pub private_key_name: String,

    /// File name of the public key.
    pub public_key_name: String,
}

impl Config {
    /// Build a configuration with explicit directories and conventional file names.
    pub fn new(store_path: impl Into<PathBuf>, ssh_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            ssh_path: ssh_path.into(),
            private_key_name: PRIVATE_KEY_NAME.to_string(),
            public_key_name: PUBLIC_KEY_NAME.to_string(),
        }
    }

    /// Resolve the configuration from optional overrides, falling back to `$HOME`.
    pub fn resolve(store: Option<PathBuf>, ssh: Option<PathBuf>) -> Result<Self> {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        Self::resolve_with_home(store, ssh, home.as_deref())
    }

    fn resolve_with_home(
        store: Option<PathBuf>,
        ssh: Option<PathBuf>,
        home: Option<&Path>,
    ) -> Result<Self> {
        let under_home = |name: &str| {
            home.map(|h| h.join(name)).ok_or_else(|| {
                SkmError::ConfigError(format!(
                    "HOME is not set; cannot locate ~/{}",
                    name
                ))
            })
        };

        let store_path = match store {
            Some(path) => path,
            None => under_home(STORE_DIR_NAME)?,
        };
        let ssh_path = match ssh {
            Some(path) => path,
            None => under_home(SSH_DIR_NAME)?,
        };

        Ok(Self::new(store_path, ssh_path))
    }

    /// Directory of one alias inside the store.
    pub fn alias_dir(&self, alias: &str) -> PathBuf {
        self.store_path.join(alias)
    }

    /// Default identity location of the private key.
    pub fn default_private_key(&self) -> PathBuf {
        self.ssh_path.join(&self.private_key_name)
    }

    /// Default identity location of the public key.
    pub fn default_public_key(&self) -> PathBuf {
        self.ssh_path.join(&self.public_key_name)
    }
}
