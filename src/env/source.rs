// src/env/source.rs

use std::collections::BTreeMap;
use std::fmt::Debug;

/// Where `{ env = "NAME" }` references and env-sourced SSH keys are read from.
///
/// Production code reads the process environment via [`ProcessEnv`]; tests
/// hand in a [`MapEnv`] so they never touch global state.
pub trait EnvSource: Send + Sync + Debug {
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the current process environment.
///
/// Variables that are set but not valid unicode are treated as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl ProcessEnv {
    /// Snapshot of the whole process environment, skipping non-unicode entries.
    pub fn snapshot() -> BTreeMap<String, String> {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }
}

/// Fixed set of variables.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: BTreeMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvSource for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}
