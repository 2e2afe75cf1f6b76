//! The "active key" slot.
//!
//! Exactly one key pair can occupy the default identity location at a time.
//! [`ActiveSlot`] is the contract the key store relies on; [`SymlinkSlot`]
//! backs it with a pair of symbolic links in the SSH directory.

use crate::config::Config;
use crate::error::{Result, SkmError};
use crate::storage::resolver::{resolve_link, Resolved};
use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Prefix of links staged before being renamed into place.
const STAGING_PREFIX: &str = ".skm-staged-";

/// Holder of the currently active key pair.
pub trait ActiveSlot {
    /// Where the active private key points, if anywhere.
    fn active_target(&self) -> Resolved;

    /// Point the slot at a new pair, replacing whatever it held before.
    fn set_active(&self, alias: &str, private_key: &Path, public_key: &Path) -> Result<()>;

    /// Empty the slot. An already empty slot is not an error.
    fn clear(&self) -> Result<()>;
}

/// An [`ActiveSlot`] made of two symbolic links at fixed paths.
#[derive(Debug, Clone)]
pub struct SymlinkSlot {
    private_link: PathBuf,
    public_link: PathBuf,
}

impl SymlinkSlot {
    pub fn new(private_link: PathBuf, public_link: PathBuf) -> Self {
        Self {
            private_link,
            public_link,
        }
    }

    /// The slot at the default identity location of `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.default_private_key(), config.default_public_key())
    }

    pub fn private_link(&self) -> &Path {
        &self.private_link
    }

    pub fn public_link(&self) -> &Path {
        &self.public_link
    }

    fn staging_path(link: &Path) -> PathBuf {
        let name = link
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let staged = format!("{}{}-{}", STAGING_PREFIX, name, std::process::id());
        link.with_file_name(staged)
    }

    fn stage(target: &Path, link: &Path) -> Result<PathBuf> {
        let staged = Self::staging_path(link);
        remove_if_present(&staged)?;
        symlink(target, &staged)?;
        Ok(staged)
    }
}

impl ActiveSlot for SymlinkSlot {
    fn active_target(&self) -> Resolved {
        resolve_link(&self.private_link)
    }

    fn set_active(&self, alias: &str, private_key: &Path, public_key: &Path) -> Result<()> {
        if let Some(dir) = self.private_link.parent() {
            fs::create_dir_all(dir)?;
        }
        if let Some(dir) = self.public_link.parent() {
            fs::create_dir_all(dir)?;
        }

        let staged_private = Self::stage(private_key, &self.private_link)?;
        let staged_public = match Self::stage(public_key, &self.public_link) {
            Ok(staged) => staged,
            Err(e) => {
                discard_staged(&staged_private);
                return Err(e);
            }
        };

        // Nothing is visible until the first rename; a failure here leaves
        // the previous pair in place.
        if let Err(e) = fs::rename(&staged_private, &self.private_link) {
            discard_staged(&staged_private);
            discard_staged(&staged_public);
            return Err(SkmError::StorageError(e));
        }

        if let Err(e) = fs::rename(&staged_public, &self.public_link) {
            discard_staged(&staged_public);
            let rollback = self.clear();
            return Err(SkmError::PartialActivationError {
                alias: alias.to_string(),
                reason: match rollback {
                    Ok(()) => format!("{}; default identity cleared", e),
                    Err(rb) => {
                        warn!(alias, error = %rb, "failed to clear half-committed identity");
                        format!("{}; rollback also failed: {}", e, rb)
                    }
                },
            });
        }

        debug!(
            alias,
            private = %self.private_link.display(),
            public = %self.public_link.display(),
            "default identity linked"
        );
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        remove_if_present(&self.private_link)?;
        remove_if_present(&self.public_link)?;
        debug!(ssh_key = %self.private_link.display(), "default identity cleared");
        Ok(())
    }
}

/// Remove a staged link on an error path, logging instead of failing.
fn discard_staged(path: &Path) {
    if let Err(e) = remove_if_present(path) {
        warn!(path = %path.display(), error = %e, "failed to remove staged link");
    }
}

/// Remove a file or link, treating absence as success.
fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SkmError::StorageError(e)),
    }
}
