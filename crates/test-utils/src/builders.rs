#![allow(dead_code)]

use meltrun::model::{
    ConfigValue, KeySource, Pipeline, Plugin, PluginCatalog, PluginConfig, PluginDefinition,
    Setting,
};
use meltrun::types::{PluginType, SettingKind};

/// Builder for `Pipeline` to simplify test setup.
pub struct PipelineBuilder {
    pipeline: Pipeline,
}

impl PipelineBuilder {
    pub fn new(id: &str, extractor: &str, loader: &str) -> Self {
        Self {
            pipeline: Pipeline::new(id, Plugin::new(extractor), Plugin::new(loader)),
        }
    }

    pub fn extractor(mut self, plugin: Plugin) -> Self {
        self.pipeline.extractor = plugin;
        self
    }

    pub fn loader(mut self, plugin: Plugin) -> Self {
        self.pipeline.loader = plugin;
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.pipeline.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn deprecated_key(mut self, key: KeySource) -> Self {
        self.pipeline.git_ssh_private_keys.push(key);
        self
    }

    pub fn state_suffix(mut self, suffix: &str) -> Self {
        self.pipeline.state_suffix = Some(suffix.to_string());
        self
    }

    pub fn build(self) -> Pipeline {
        self.pipeline
    }
}

/// Builder for `Plugin`.
pub struct PluginBuilder {
    plugin: Plugin,
}

impl PluginBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            plugin: Plugin::new(name),
        }
    }

    pub fn literal(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.config().set(key, ConfigValue::literal(value));
        self
    }

    pub fn from_env(mut self, key: &str, var: &str) -> Self {
        self.config().set(key, ConfigValue::env(var));
        self
    }

    pub fn ssh_key(mut self, key: KeySource) -> Self {
        self.plugin.git_ssh_private_key = Some(key);
        self
    }

    fn config(&mut self) -> &mut PluginConfig {
        self.plugin.config.get_or_insert_with(PluginConfig::new)
    }

    pub fn build(self) -> Plugin {
        self.plugin
    }
}

/// Builder for a `PluginCatalog` of declared settings.
#[derive(Default)]
pub struct CatalogBuilder {
    catalog: PluginCatalog,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plugin(mut self, plugin_type: PluginType, name: &str, settings: &[(&str, SettingKind)]) -> Self {
        let settings = settings
            .iter()
            .map(|(name, kind)| Setting::new(*name, *kind))
            .collect();
        self.catalog
            .insert(plugin_type, PluginDefinition::new(name, settings));
        self
    }

    pub fn build(self) -> PluginCatalog {
        self.catalog
    }
}
