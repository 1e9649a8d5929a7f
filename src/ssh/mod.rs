// src/ssh/mod.rs

//! SSH credential staging for plugins installed from private git remotes.
//!
//! - [`keys`] gathers key sources from a pipeline (pure).
//! - [`stager`] materialises them for the duration of one run.

pub mod keys;
pub mod stager;

pub use keys::{CollectedKeys, DEPRECATED_KEYS_WARNING, collect_ssh_keys};
pub use stager::SshStaging;
