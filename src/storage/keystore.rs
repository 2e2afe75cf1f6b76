//! Key store for managing named SSH key pairs.
//!
//! The store is a directory with one subdirectory per alias. Each alias
//! directory holds a private key and a public key. The active pair is the
//! one occupying the store's [`ActiveSlot`].

use crate::config::{Config, DEFAULT_ALIAS};
use crate::error::{Result, SkmError};
use crate::external;
use crate::storage::keypair::{classify_alias_dir, ActiveStatus, KeyPair};
use crate::storage::resolver::Resolved;
use crate::storage::slot::{ActiveSlot, SymlinkSlot};
use crate::ui::Confirm;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Program used to generate new key pairs.
const KEYGEN_PROGRAM: &str = "ssh-keygen";

/// A key store rooted at `config.store_path`.
#[derive(Debug, Clone)]
pub struct KeyStore<S: ActiveSlot = SymlinkSlot> {
    config: Config,
    slot: S,
}

impl KeyStore<SymlinkSlot> {
    /// Open the store described by `config`, backed by symbolic links in the
    /// SSH directory.
    ///
    /// Relative paths are made absolute so that link targets stay valid
    /// regardless of where the links live.
    pub fn open(mut config: Config) -> Result<Self> {
        config.store_path = absolutize(&config.store_path)?;
        config.ssh_path = absolutize(&config.ssh_path)?;
        let slot = SymlinkSlot::from_config(&config);
        Ok(Self { config, slot })
    }
}

impl<S: ActiveSlot> KeyStore<S> {
    /// Open a store with a custom active slot.
    pub fn with_slot(config: Config, slot: S) -> Self {
        Self { config, slot }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    fn status_of(&self, resolved: &Resolved, private_key: &Path) -> ActiveStatus {
        match resolved {
            Resolved::Target(target) if target == private_key => ActiveStatus::Active,
            Resolved::Target(_) | Resolved::Absent => ActiveStatus::Inactive,
            Resolved::Unknown => ActiveStatus::Unknown,
        }
    }
}

/// Options passed to the key generation program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeygenOptions {
    /// Key type (`-t`).
    pub key_type: String,

    /// Key size in bits (`-b`), left to the generator when `None`.
    pub bits: Option<u32>,

    /// Key comment (`-C`).
    pub comment: Option<String>,
}

impl Default for KeygenOptions {
    fn default() -> Self {
        Self {
            key_type: "rsa".to_string(),
            bits: None,
            comment: None,
        }
    }
}

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The alias directory was removed.
    Deleted {
        /// Whether the default identity links were cleared as well.
        was_active: bool,
    },

    /// The operator did not confirm; nothing changed.
    Declined,
}

/// List the candidate alias directories directly under `root`.
///
/// Non-directory entries are ignored. The result is sorted by name.
pub fn list_alias_dirs(root: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
    let mut dirs = Vec::new();

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(alias) => dirs.push((alias, entry.path())),
            Err(name) => warn!(name = ?name, "skipping alias directory with non UTF-8 name"),
        }
    }

    dirs.sort();
    Ok(dirs)
}

/// Discover every complete key pair in the store.
///
/// Aliases whose directory lacks a private or a public key are left out.
/// Read failures are logged and the pairs found so far are returned.
///
/// # Example
///
/// ```rust,no_run
/// use skm::config::Config;
/// use skm::storage::keystore::{load_keys, KeyStore};
///
/// # fn example() -> skm::error::Result<()> {
/// let store = KeyStore::open(Config::resolve(None, None)?)?;
/// for (alias, key) in load_keys(&store) {
///     println!("{} active={}", alias, key.is_active());
/// }
/// # Ok(())
/// # }
/// ```
pub fn load_keys<S: ActiveSlot>(store: &KeyStore<S>) -> BTreeMap<String, KeyPair> {
    let mut keys = BTreeMap::new();
    let root = &store.config.store_path;

    let dirs = match list_alias_dirs(root) {
        Ok(dirs) => dirs,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(store = %root.display(), "key store does not exist yet");
            return keys;
        }
        Err(e) => {
            warn!(store = %root.display(), error = %e, "failed to read key store");
            return keys;
        }
    };

    let resolved = store.slot.active_target();

    for (alias, dir) in dirs {
        let classified = match classify_alias_dir(&dir) {
            Ok(classified) => classified,
            Err(e) => {
                warn!(alias = %alias, error = %e, "failed to read alias directory");
                return keys;
            }
        };

        let Some((private_key_path, public_key_path)) = classified.into_pair() else {
            debug!(alias = %alias, "skipping incomplete key pair");
            continue;
        };

        let status = store.status_of(&resolved, &private_key_path);
        keys.insert(
            alias.clone(),
            KeyPair {
                alias,
                private_key_path,
                public_key_path,
                status,
            },
        );
    }

    keys
}

/// List all key pairs sorted by alias.
pub fn list_keys<S: ActiveSlot>(store: &KeyStore<S>) -> Vec<KeyPair> {
    load_keys(store).into_values().collect()
}

/// Look up one key pair by alias.
pub fn get_key<S: ActiveSlot>(store: &KeyStore<S>, alias: &str) -> Result<KeyPair> {
    load_keys(store)
        .remove(alias)
        .ok_or_else(|| SkmError::NotFoundError(alias.to_string()))
}

/// The key pair currently linked into the default identity location.
pub fn active_key<S: ActiveSlot>(store: &KeyStore<S>) -> Option<KeyPair> {
    load_keys(store).into_values().find(KeyPair::is_active)
}

/// Make `alias` the active key pair.
///
/// The alias must exist; the current default identity is left untouched
/// otherwise. Activating the already active alias is a no-op in effect.
///
/// # Example
///
/// ```rust,no_run
/// use skm::config::Config;
/// use skm::storage::keystore::{use_key, KeyStore};
///
/// # fn example() -> skm::error::Result<()> {
/// let store = KeyStore::open(Config::resolve(None, None)?)?;
/// let key = use_key(&store, "work")?;
/// assert!(key.is_active());
/// # Ok(())
/// # }
/// ```
pub fn use_key<S: ActiveSlot>(store: &KeyStore<S>, alias: &str) -> Result<KeyPair> {
    let mut key = get_key(store, alias)?;

    store
        .slot
        .set_active(alias, &key.private_key_path, &key.public_key_path)?;
    info!(alias, "activated SSH key");

    key.status = ActiveStatus::Active;
    Ok(key)
}

/// Delete `alias` after asking `confirm`.
///
/// If the key pair is active, the default identity links are cleared before
/// its directory is removed so no dangling links remain.
pub fn delete_key<S: ActiveSlot, C: Confirm + ?Sized>(
    store: &KeyStore<S>,
    alias: &str,
    confirm: &mut C,
) -> Result<DeleteOutcome> {
    let key = get_key(store, alias)?;
    let was_active = key.is_active();

    let question = if was_active {
        format!(
            "SSH key [{}] is currently in use, please confirm to delete it [y/n]: ",
            alias
        )
    } else {
        format!("Please confirm to delete SSH key [{}] [y/n]: ", alias)
    };

    if !confirm.confirm(&question) {
        debug!(alias, "deletion declined");
        return Ok(DeleteOutcome::Declined);
    }

    if was_active {
        store.slot.clear()?;
    }

    fs::remove_dir_all(store.config.alias_dir(alias))?;
    info!(alias, was_active, "deleted SSH key");

    Ok(DeleteOutcome::Deleted { was_active })
}

/// Rename `old` to `new`, keeping it active if it was.
pub fn rename_key<S: ActiveSlot>(store: &KeyStore<S>, old: &str, new: &str) -> Result<KeyPair> {
    validate_alias(new)?;
    let key = get_key(store, old)?;

    let target = store.config.alias_dir(new);
    if target.exists() {
        return Err(SkmError::AlreadyExistsError(new.to_string()));
    }

    fs::rename(store.config.alias_dir(old), &target)?;
    info!(old, new, "renamed SSH key");

    if key.is_active() {
        return use_key(store, new);
    }
    get_key(store, new)
}

/// Read the public key of `alias`, or of the active key pair when `None`.
pub fn read_public_key<S: ActiveSlot>(store: &KeyStore<S>, alias: Option<&str>) -> Result<String> {
    let key = match alias {
        Some(alias) => get_key(store, alias)?,
        None => active_key(store).ok_or(SkmError::NoActiveKeyError)?,
    };

    Ok(fs::read_to_string(&key.public_key_path)?)
}

/// Create the store directory and adopt an existing default key pair.
///
/// When the SSH directory holds regular (unlinked) key files, they are moved
/// into the `default` alias and linked back, bringing them under management.
/// Returns the adopted pair, if any.
pub fn init_store<S: ActiveSlot>(store: &KeyStore<S>) -> Result<Option<KeyPair>> {
    let config = &store.config;
    fs::create_dir_all(&config.store_path)?;
    debug!(store = %config.store_path.display(), "key store ready");

    let private_src = config.default_private_key();
    let public_src = config.default_public_key();
    if !is_regular_file(&private_src) || !is_regular_file(&public_src) {
        return Ok(None);
    }

    let alias_dir = config.alias_dir(DEFAULT_ALIAS);
    if alias_dir.exists() {
        warn!(
            alias = DEFAULT_ALIAS,
            "existing default keys not adopted: alias already exists"
        );
        return Ok(None);
    }

    fs::create_dir_all(&alias_dir)?;
    let private_dst = alias_dir.join(&config.private_key_name);
    let public_dst = alias_dir.join(&config.public_key_name);

    if let Err(e) = move_file(&private_src, &private_dst) {
        abandon_adoption(&alias_dir, &[]);
        return Err(e);
    }
    if let Err(e) = move_file(&public_src, &public_dst) {
        abandon_adoption(&alias_dir, &[(private_dst.as_path(), private_src.as_path())]);
        return Err(e);
    }
    info!(alias = DEFAULT_ALIAS, "adopted existing SSH key");

    match use_key(store, DEFAULT_ALIAS) {
        Ok(key) => Ok(Some(key)),
        Err(e) => {
            abandon_adoption(
                &alias_dir,
                &[
                    (private_dst.as_path(), private_src.as_path()),
                    (public_dst.as_path(), public_src.as_path()),
                ],
            );
            Err(e)
        }
    }
}

/// Move adopted files back to the SSH directory and drop the alias directory.
///
/// The directory is only removed once it is empty again, so a key that could
/// not be moved back is never deleted.
fn abandon_adoption(alias_dir: &Path, moved: &[(&Path, &Path)]) {
    for (from, to) in moved {
        if let Err(e) = move_file(from, to) {
            warn!(
                from = %from.display(),
                to = %to.display(),
                error = %e,
                "failed to move adopted key back"
            );
        }
    }
    if let Err(e) = fs::remove_dir(alias_dir) {
        warn!(dir = %alias_dir.display(), error = %e, "failed to remove alias directory");
    }
}

/// Generate a new key pair under `alias` with the external key generator.
///
/// The alias directory is removed again if generation fails.
pub fn create_key<S: ActiveSlot>(
    store: &KeyStore<S>,
    alias: &str,
    options: &KeygenOptions,
) -> Result<KeyPair> {
    validate_alias(alias)?;

    let dir = store.config.alias_dir(alias);
    if dir.exists() {
        return Err(SkmError::AlreadyExistsError(alias.to_string()));
    }
    fs::create_dir_all(&dir)?;

    let mut args = vec!["-t".to_string(), options.key_type.clone()];
    if let Some(bits) = options.bits {
        args.push("-b".to_string());
        args.push(bits.to_string());
    }
    if let Some(comment) = &options.comment {
        args.push("-C".to_string());
        args.push(comment.clone());
    }
    args.push("-f".to_string());
    args.push(store.config.private_key_name.clone());

    if let Err(e) = external::run(Some(&dir), KEYGEN_PROGRAM, &args) {
        if let Err(cleanup) = fs::remove_dir_all(&dir) {
            warn!(alias, error = %cleanup, "failed to remove alias directory");
        }
        return Err(e);
    }

    get_key(store, alias)
}

/// Check that `alias` is usable as a single directory name.
pub fn validate_alias(alias: &str) -> Result<()> {
    let mut components = Path::new(alias).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == alias => Ok(()),
        _ => Err(SkmError::InvalidAliasError(format!(
            "'{}' must be a plain directory name",
            alias
        ))),
    }
}

fn is_regular_file(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_file())
        .unwrap_or(false)
}

fn move_file(from: &Path, to: &Path) -> Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            fs::copy(from, to)?;
            fs::remove_file(from)?;
            Ok(())
        }
        Err(e) => Err(SkmError::StorageError(e)),
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
