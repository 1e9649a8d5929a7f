// src/model/plugin.rs

//! Plugin definitions (what a plugin declares) and plugin instances (how a
//! pipeline configures it).

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::types::{PluginType, SettingKind};

/// One declared configuration field of a plugin.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Setting {
    pub name: String,

    /// Missing kinds default to `string`, as meltano does.
    #[serde(default)]
    pub kind: SettingKind,

    /// Allowed values for `options` settings.
    #[serde(default)]
    pub options: Vec<SettingOption>,

    #[serde(default)]
    pub description: Option<String>,
}

impl Setting {
    pub fn new(name: impl Into<String>, kind: SettingKind) -> Self {
        Self {
            name: name.into(),
            kind,
            options: Vec::new(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SettingOption {
    pub value: Value,
    #[serde(default)]
    pub label: Option<String>,
}

/// The declared shape of a plugin: its name and ordered settings.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PluginDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub settings: Vec<Setting>,
}

impl PluginDefinition {
    pub fn new(name: impl Into<String>, settings: Vec<Setting>) -> Self {
        Self {
            name: name.into(),
            settings,
        }
    }

    pub fn setting(&self, name: &str) -> Option<&Setting> {
        self.settings.iter().find(|s| s.name == name)
    }
}

/// Plugin definitions by type and name, as declared in the project file.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PluginCatalog {
    #[serde(default)]
    pub extractors: BTreeMap<String, PluginDefinition>,
    #[serde(default)]
    pub loaders: BTreeMap<String, PluginDefinition>,
}

impl PluginCatalog {
    pub fn get(&self, plugin_type: PluginType, name: &str) -> Option<&PluginDefinition> {
        self.group(plugin_type).get(name)
    }

    pub fn insert(&mut self, plugin_type: PluginType, definition: PluginDefinition) {
        let group = match plugin_type {
            PluginType::Extractor => &mut self.extractors,
            PluginType::Loader => &mut self.loaders,
        };
        group.insert(definition.name.clone(), definition);
    }

    fn group(&self, plugin_type: PluginType) -> &BTreeMap<String, PluginDefinition> {
        match plugin_type {
            PluginType::Extractor => &self.extractors,
            PluginType::Loader => &self.loaders,
        }
    }

    /// Fill in definition names from their table keys where omitted.
    pub(crate) fn normalise_names(&mut self) {
        for group in [&mut self.extractors, &mut self.loaders] {
            for (name, def) in group.iter_mut() {
                if def.name.is_empty() {
                    def.name = name.clone();
                }
            }
        }
    }
}

/// A configured value: either literal JSON, or a reference to an
/// environment variable read at resolution time.
///
/// In config files a reference is written as `{ env = "NAME" }`.
///
/// The shape is recognised before the setting's kind is consulted, so an
/// object-kind setting cannot hold the literal mapping `{"env": "<string>"}`.
/// Add a second field, or supply the whole object through an environment
/// variable, to pass such a value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    FromEnv(String),
    Literal(Value),
}

impl ConfigValue {
    pub fn env(name: impl Into<String>) -> Self {
        ConfigValue::FromEnv(name.into())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        ConfigValue::Literal(value.into())
    }

    /// Interpret a raw JSON value, recognising the env-reference shape.
    pub fn from_json(value: &Value) -> Self {
        match env_reference(value) {
            Some(name) => ConfigValue::FromEnv(name.to_string()),
            None => ConfigValue::Literal(value.clone()),
        }
    }

    fn into_json(self) -> Value {
        match self {
            ConfigValue::FromEnv(name) => {
                let mut map = Map::new();
                map.insert("env".to_string(), Value::String(name));
                Value::Object(map)
            }
            ConfigValue::Literal(value) => value,
        }
    }
}

/// `Some(name)` when `value` is an object holding exactly one string field `env`.
pub fn env_reference(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) if map.len() == 1 => map.get("env").and_then(Value::as_str),
        _ => None,
    }
}

/// Ordered mapping of setting name to configured value for one plugin.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct PluginConfig(Map<String, Value>);

impl PluginConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: ConfigValue) {
        self.0.insert(key.into(), value.into_json());
    }

    pub fn with(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<ConfigValue> {
        self.0.get(key).map(ConfigValue::from_json)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ConfigValue)> + '_ {
        self.0
            .iter()
            .map(|(k, v)| (k.as_str(), ConfigValue::from_json(v)))
    }
}

/// Where an SSH private key comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum KeySource {
    Literal(String),
    FromEnv { env: String },
}

impl KeySource {
    pub fn env(name: impl Into<String>) -> Self {
        KeySource::FromEnv { env: name.into() }
    }
}

impl From<&str> for KeySource {
    fn from(s: &str) -> Self {
        KeySource::Literal(s.to_string())
    }
}

/// An extractor or loader as referenced by a pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Plugin {
    pub name: String,

    #[serde(default)]
    pub config: Option<PluginConfig>,

    /// Key used to fetch this plugin's source over git+ssh.
    #[serde(default)]
    pub git_ssh_private_key: Option<KeySource>,
}

impl Plugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: None,
            git_ssh_private_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn env_reference_requires_single_string_field() {
        assert_eq!(env_reference(&json!({"env": "TOKEN"})), Some("TOKEN"));
        assert_eq!(env_reference(&json!({"env": "TOKEN", "x": 1})), None);
        assert_eq!(env_reference(&json!({"env": 1})), None);
        assert_eq!(env_reference(&json!("TOKEN")), None);
    }

    #[test]
    fn env_shaped_object_is_always_a_reference() {
        let value = json!({"env": "production"});
        assert_eq!(
            ConfigValue::from_json(&value),
            ConfigValue::FromEnv("production".to_string())
        );
        let widened = json!({"env": "production", "region": "eu"});
        assert_eq!(ConfigValue::from_json(&widened), ConfigValue::Literal(widened.clone()));
    }

    #[test]
    fn plugin_config_keeps_insertion_order_and_env_refs() {
        let cfg = PluginConfig::new()
            .with("zeta", ConfigValue::literal(1))
            .with("alpha", ConfigValue::env("ALPHA"));

        let entries: Vec<_> = cfg.iter().collect();
        assert_eq!(entries[0], ("zeta", ConfigValue::literal(1)));
        assert_eq!(entries[1], ("alpha", ConfigValue::env("ALPHA")));
    }

    #[test]
    fn key_source_deserializes_from_string_or_env_table() {
        let lit: KeySource = serde_json::from_value(json!("-----BEGIN")).unwrap();
        let env: KeySource = serde_json::from_value(json!({"env": "SSH_KEY"})).unwrap();
        assert_eq!(lit, KeySource::from("-----BEGIN"));
        assert_eq!(env, KeySource::env("SSH_KEY"));
    }
}
