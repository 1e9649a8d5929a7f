// src/model/pipeline.rs

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::model::plugin::{KeySource, Plugin};
use crate::types::{PluginType, StateStrategy};

/// One free-form group of project-level meltano settings.
///
/// Values may be nested mappings and may contain `{ env = "NAME" }`
/// references at any depth.
pub type ConfigGroup = Map<String, Value>;

/// Project-level meltano settings, passed as `MELTANO_<GROUP>_<FIELD>`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeltanoConfig {
    #[serde(default)]
    pub state_backend: Option<ConfigGroup>,
    #[serde(default)]
    pub venv: Option<ConfigGroup>,
    #[serde(default)]
    pub cli: Option<ConfigGroup>,
    #[serde(default)]
    pub elt: Option<ConfigGroup>,
}

impl MeltanoConfig {
    /// Groups in emission order, with their env-name segment.
    pub fn groups(&self) -> impl Iterator<Item = (&'static str, &ConfigGroup)> {
        [
            ("state_backend", self.state_backend.as_ref()),
            ("venv", self.venv.as_ref()),
            ("cli", self.cli.as_ref()),
            ("elt", self.elt.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, group)| group.map(|g| (name, g)))
    }
}

/// "Run extractor X into loader Y", with everything needed to do so.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Pipeline {
    /// Unique within a batch of pipelines.
    pub id: String,

    pub extractor: Plugin,
    pub loader: Plugin,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    /// Explicit environment for the child; wins over plugin config.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub meltano_config: Option<MeltanoConfig>,

    /// Deprecated: configure `git_ssh_private_key` on each plugin instead.
    #[serde(default)]
    pub git_ssh_private_keys: Vec<KeySource>,

    /// Appended to the state id via `--state-id-suffix`.
    #[serde(default)]
    pub state_suffix: Option<String>,
}

impl Pipeline {
    pub fn new(id: impl Into<String>, extractor: Plugin, loader: Plugin) -> Self {
        Self {
            id: id.into(),
            extractor,
            loader,
            description: None,
            tags: BTreeMap::new(),
            env: BTreeMap::new(),
            meltano_config: None,
            git_ssh_private_keys: Vec::new(),
            state_suffix: None,
        }
    }

    pub fn plugins(&self) -> [(PluginType, &Plugin); 2] {
        [
            (PluginType::Extractor, &self.extractor),
            (PluginType::Loader, &self.loader),
        ]
    }

    /// The configured description, or `"<extractor> → <loader>"`.
    pub fn display_description(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| format!("{} → {}", self.extractor.name, self.loader.name))
    }

    /// Tags identifying the plugins, overlaid with the configured tags.
    pub fn effective_tags(&self) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::new();
        tags.insert("extractor".to_string(), self.extractor.name.clone());
        tags.insert("loader".to_string(), self.loader.name.clone());
        tags.extend(self.tags.clone());
        tags
    }
}

/// Per-invocation flags for `meltano run`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RunFlags {
    /// Ignore existing state.
    #[serde(default)]
    pub full_refresh: bool,

    /// Refresh the catalog before running.
    #[serde(default)]
    pub refresh_catalog: bool,

    #[serde(default)]
    pub state_strategy: StateStrategy,

    /// Passed as `meltano --log-level=<level>`.
    #[serde(default)]
    pub log_level: Option<String>,

    /// Stream selection filter for the extractor.
    #[serde(default)]
    pub select_filter: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn description_defaults_to_plugin_arrow() {
        let p = Pipeline::new("p", Plugin::new("tap-a"), Plugin::new("target-b"));
        assert_eq!(p.display_description(), "tap-a → target-b");
    }

    #[test]
    fn configured_tags_override_plugin_tags() {
        let mut p = Pipeline::new("p", Plugin::new("tap-a"), Plugin::new("target-b"));
        p.tags.insert("loader".into(), "custom".into());
        p.tags.insert("team".into(), "data".into());

        let tags = p.effective_tags();
        assert_eq!(tags["extractor"], "tap-a");
        assert_eq!(tags["loader"], "custom");
        assert_eq!(tags["team"], "data");
    }

    #[test]
    fn meltano_groups_follow_fixed_order() {
        let cfg: MeltanoConfig = serde_json::from_value(json!({
            "elt": {"buffer_size": 1},
            "state_backend": {"uri": "s3://x"},
        }))
        .unwrap();
        let names: Vec<_> = cfg.groups().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["state_backend", "elt"]);
    }

    #[test]
    fn unknown_meltano_group_is_rejected() {
        let res: Result<MeltanoConfig, _> =
            serde_json::from_value(json!({"database": {"uri": "x"}}));
        assert!(res.is_err());
    }
}
