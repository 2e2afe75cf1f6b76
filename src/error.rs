//! Error types for skm.
//!
//! Absent state (no active key, a malformed alias directory) is not an error;
//! it is modelled in the return types instead. Everything here is a failure
//! the operator should hear about.

use thiserror::Error;

/// The main error type for skm operations.
#[derive(Error, Debug)]
pub enum SkmError {
    /// Filesystem I/O failed
    #[error("Storage I/O error: {0}")]
    StorageError(#[from] std::io::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// No key pair is stored under the alias
    #[error("SSH key [{0}] not found")]
    NotFoundError(String),

    /// A key pair is already stored under the alias
    #[error("SSH key [{0}] already exists")]
    AlreadyExistsError(String),

    /// The alias cannot be used as a directory name
    #[error("Invalid alias: {0}")]
    InvalidAliasError(String),

    /// No key pair is linked into the default identity location
    #[error("No SSH key is currently in use")]
    NoActiveKeyError,

    /// Only one of the two default identity links could be committed
    #[error("Failed to activate SSH key [{alias}]: {reason}")]
    PartialActivationError { alias: String, reason: String },

    /// An external program exited unsuccessfully or could not be started
    #[error("Command `{program}` failed: {reason}")]
    ExternalCommandError { program: String, reason: String },

    /// Paths could not be resolved from flags, environment, or HOME
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// A specialized Result type for skm operations.
pub type Result<T> = std::result::Result<T, SkmError>;
