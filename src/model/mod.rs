// src/model/mod.rs

//! Data model consumed by the run engine.
//!
//! - [`plugin`]: plugin definitions, plugin instances and their config values.
//! - [`pipeline`]: pipelines, project-level meltano config and run flags.

pub mod pipeline;
pub mod plugin;

pub use pipeline::{ConfigGroup, MeltanoConfig, Pipeline, RunFlags};
pub use plugin::{
    ConfigValue, KeySource, Plugin, PluginCatalog, PluginConfig, PluginDefinition, Setting,
    SettingOption, env_reference,
};
