// src/env/mod.rs

//! Environment resolution for the meltano child process.
//!
//! - [`naming`] holds the variable naming rules (the CLI's config wire format).
//! - [`value`] renders configured values as variable text, by setting kind.
//! - [`source`] abstracts where env references are read from.
//! - [`resolver`] layers everything into the final map.

pub mod naming;
pub mod resolver;
pub mod source;
pub mod value;

pub use resolver::{EnvMap, PipelineEnv, git_ssh_command, meltano_config_to_env, plugin_config_to_env};
pub use source::{EnvSource, MapEnv, ProcessEnv};
