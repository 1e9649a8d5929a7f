// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// How `meltano run` should reconcile state produced by this run.
///
/// - `Auto`: let meltano decide (default); no flag is passed.
/// - `Merge`: merge new state into the existing state.
/// - `Overwrite`: replace the existing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateStrategy {
    #[default]
    Auto,
    Merge,
    Overwrite,
}

impl StateStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateStrategy::Auto => "auto",
            StateStrategy::Merge => "merge",
            StateStrategy::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for StateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(StateStrategy::Auto),
            "merge" => Ok(StateStrategy::Merge),
            "overwrite" => Ok(StateStrategy::Overwrite),
            other => Err(format!(
                "invalid state_strategy: {other} (expected \"auto\", \"merge\" or \"overwrite\")"
            )),
        }
    }
}

/// Declared kind of a plugin setting. Governs how a value is rendered into
/// an environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
    #[default]
    String,
    Integer,
    Float,
    Boolean,
    Options,
    Array,
    Object,
}

impl SettingKind {
    /// Kinds whose values travel as JSON text.
    pub fn is_structured(&self) -> bool {
        matches!(self, SettingKind::Array | SettingKind::Object)
    }
}

/// Which side of the pipeline a plugin sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginType {
    Extractor,
    Loader,
}

impl fmt::Display for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PluginType::Extractor => "extractor",
            PluginType::Loader => "loader",
        })
    }
}
