// src/config/mod.rs

//! Project file loading and validation.
//!
//! - [`model`] is the TOML-backed data model.
//! - [`loader`] reads it from disk.
//! - [`validate`] checks pipeline ids and plugin names.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ProjectFile, ProjectSection, RawProjectFile};
