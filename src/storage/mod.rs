//! Key storage module.
//!
//! This module discovers named SSH key pairs on disk and tracks which one is
//! linked into the default identity location.

pub mod keypair;
pub mod keystore;
pub mod resolver;
pub mod slot;
