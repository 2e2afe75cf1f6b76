//! skm: manage multiple SSH key pairs from one place
//!
//! Key pairs live in a store directory (by default `~/.skm`), one
//! subdirectory per alias. The *active* pair is linked into the default SSH
//! identity location (`~/.ssh/id_rsa` and `~/.ssh/id_rsa.pub`), so an SSH
//! client picks it up without extra configuration.
//!
//! # Architecture
//!
//! - [`storage::resolver`] resolves what the default identity location points to
//! - [`storage::keystore`] discovers, activates, renames and deletes key pairs
//! - [`storage::slot`] owns the default identity links and swaps them safely
//! - [`backup`] names backup archives and delegates archiving to `tar`
//!
//! Key generation and archiving are left to `ssh-keygen` and `tar`.
//!
//! # Example
//!
//! ```rust,no_run
//! use skm::config::Config;
//! use skm::error::Result;
//! use skm::storage::keystore::{list_keys, use_key, KeyStore};
//!
//! fn example() -> Result<()> {
//!     let store = KeyStore::open(Config::resolve(None, None)?)?;
//!     use_key(&store, "work")?;
//!     for key in list_keys(&store) {
//!         println!("{} {}", if key.is_active() { "->" } else { "  " }, key.alias);
//!     }
//!     Ok(())
//! }
//! ```

pub mod backup;
pub mod config;
pub mod error;
pub mod external;
pub mod storage;
pub mod ui;

// Re-export commonly used types
pub use error::{Result, SkmError};
pub use storage::keypair::{ActiveStatus, KeyPair};
pub use storage::keystore::KeyStore;
