// src/env/resolver.rs

//! Builds the exact environment handed to the meltano child process.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value};

use crate::env::naming::{
    DEFAULT_LOG_FORMAT, GIT_SSH_COMMAND_VAR, LOG_FORMAT_VAR, PROJECT_ROOT_VAR, meltano_env_key,
    plugin_env_key, select_filter_key,
};
use crate::env::source::EnvSource;
use crate::env::value::{infer_kind, render_env_text, render_literal, to_json_text};
use crate::errors::Result;
use crate::model::{
    ConfigValue, MeltanoConfig, Pipeline, Plugin, PluginDefinition, RunFlags, env_reference,
};
use crate::types::{PluginType, SettingKind};

/// Environment variable name → value.
pub type EnvMap = BTreeMap<String, String>;

/// Kinds of the underscore-prefixed settings meltano reserves for each
/// plugin type. Used when a plugin definition does not declare them.
fn reserved_kind(plugin_type: PluginType, setting: &str) -> Option<SettingKind> {
    let kind = match (plugin_type, setting) {
        (PluginType::Extractor, "_select" | "_select_filter") => SettingKind::Array,
        (PluginType::Extractor, "_metadata" | "_schema") => SettingKind::Object,
        (PluginType::Extractor, "_catalog" | "_state" | "_load_schema") => SettingKind::String,
        (PluginType::Extractor, "_use_cached_catalog") => SettingKind::Boolean,
        (PluginType::Loader, "_dialect") => SettingKind::String,
        _ => return None,
    };
    Some(kind)
}

/// Render one plugin's config as `<PLUGIN>_<SETTING>` variables.
///
/// The setting kind comes from the definition, then the reserved settings
/// of the plugin type, then the shape of the value itself.
pub fn plugin_config_to_env(
    plugin_type: PluginType,
    plugin: &Plugin,
    definition: Option<&PluginDefinition>,
    lookup: &dyn EnvSource,
) -> Result<EnvMap> {
    let mut env = EnvMap::new();
    let Some(config) = plugin.config.as_ref() else {
        return Ok(env);
    };

    for (setting, value) in config.iter() {
        let declared = definition
            .and_then(|d| d.setting(setting))
            .map(|s| s.kind)
            .or_else(|| reserved_kind(plugin_type, setting));

        let rendered = match value {
            ConfigValue::FromEnv(var) => match lookup.var(&var) {
                Some(raw) => Some(render_env_text(
                    declared.unwrap_or_default(),
                    &var,
                    raw,
                )?),
                None => None,
            },
            ConfigValue::Literal(v) => {
                let kind = declared.unwrap_or_else(|| infer_kind(&v));
                render_literal(kind, &v)?
            }
        };

        if let Some(text) = rendered {
            env.insert(plugin_env_key(&plugin.name, setting), text);
        }
    }

    Ok(env)
}

/// Render project-level groups as `MELTANO_<GROUP>_<FIELD>[_<KEY>...]`.
pub fn meltano_config_to_env(config: &MeltanoConfig, lookup: &dyn EnvSource) -> Result<EnvMap> {
    let mut env = EnvMap::new();
    for (group, fields) in config.groups() {
        let mut path = vec![group.to_string()];
        flatten_group(&mut path, fields, lookup, &mut env)?;
    }
    Ok(env)
}

fn flatten_group(
    path: &mut Vec<String>,
    fields: &Map<String, Value>,
    lookup: &dyn EnvSource,
    env: &mut EnvMap,
) -> Result<()> {
    for (field, value) in fields {
        path.push(field.clone());
        if let Some(var) = env_reference(value) {
            if let Some(text) = lookup.var(var) {
                env.insert(meltano_env_key(path.as_slice()), text);
            }
        } else if let Value::Object(nested) = value {
            flatten_group(path, nested, lookup, env)?;
        } else if let Some(text) = render_literal(infer_kind(value), value)? {
            env.insert(meltano_env_key(path.as_slice()), text);
        }
        path.pop();
    }
    Ok(())
}

/// Everything that shapes one pipeline's child environment.
#[derive(Debug, Clone, Copy)]
pub struct PipelineEnv<'a> {
    pub pipeline: &'a Pipeline,
    pub extractor: Option<&'a PluginDefinition>,
    pub loader: Option<&'a PluginDefinition>,
    pub flags: &'a RunFlags,
    /// Staged SSH client config, if any keys were configured.
    pub ssh_config_path: Option<&'a Path>,
}

impl<'a> PipelineEnv<'a> {
    pub fn new(pipeline: &'a Pipeline, flags: &'a RunFlags) -> Self {
        Self {
            pipeline,
            extractor: None,
            loader: None,
            flags,
            ssh_config_path: None,
        }
    }

    pub fn with_definitions(
        mut self,
        extractor: Option<&'a PluginDefinition>,
        loader: Option<&'a PluginDefinition>,
    ) -> Self {
        self.extractor = extractor;
        self.loader = loader;
        self
    }

    pub fn with_ssh_config(mut self, path: Option<&'a Path>) -> Self {
        self.ssh_config_path = path;
        self
    }

    /// Layer, later wins by key:
    ///
    /// 1. `base_env` without `MELTANO_PROJECT_ROOT`
    /// 2. meltano config groups
    /// 3. extractor config
    /// 4. loader config
    /// 5. pipeline `env`
    /// 6. `MELTANO_CLI_LOG_FORMAT=json`, only if still unset
    /// 7. `GIT_SSH_COMMAND`
    /// 8. `<EXTRACTOR>__SELECT_FILTER`
    ///
    /// `base_env` is left untouched.
    pub fn build(&self, base_env: &EnvMap, lookup: &dyn EnvSource) -> Result<EnvMap> {
        let pipeline = self.pipeline;

        let mut env = base_env.clone();
        env.remove(PROJECT_ROOT_VAR);

        if let Some(cfg) = pipeline.meltano_config.as_ref() {
            env.extend(meltano_config_to_env(cfg, lookup)?);
        }

        env.extend(plugin_config_to_env(
            PluginType::Extractor,
            &pipeline.extractor,
            self.extractor,
            lookup,
        )?);
        env.extend(plugin_config_to_env(
            PluginType::Loader,
            &pipeline.loader,
            self.loader,
            lookup,
        )?);
        env.extend(pipeline.env.clone());

        env.entry(LOG_FORMAT_VAR.to_string())
            .or_insert_with(|| DEFAULT_LOG_FORMAT.to_string());

        if let Some(path) = self.ssh_config_path {
            env.insert(GIT_SSH_COMMAND_VAR.to_string(), git_ssh_command(path));
        }

        if let Some(filter) = self.flags.select_filter.as_ref().filter(|f| !f.is_empty()) {
            env.insert(
                select_filter_key(&pipeline.extractor.name),
                to_json_text(filter)?,
            );
        }

        Ok(env)
    }
}

/// `GIT_SSH_COMMAND` value pointing ssh at a staged client config.
pub fn git_ssh_command(config_path: &Path) -> String {
    format!("ssh -F {}", config_path.display())
}
