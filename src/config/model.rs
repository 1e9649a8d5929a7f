// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::exec::DEFAULT_EXECUTABLE;
use crate::model::{Pipeline, PluginCatalog};

/// Project file exactly as deserialized from TOML, before validation.
///
/// ```toml
/// [project]
/// dir = "meltano"
///
/// [plugins.extractors.tap-github]
/// settings = [{ name = "repositories", kind = "array" }]
///
/// [[pipeline]]
/// id = "github-to-postgres"
/// extractor = { name = "tap-github" }
/// loader = { name = "target-postgres" }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawProjectFile {
    #[serde(default)]
    pub project: ProjectSection,

    #[serde(default)]
    pub plugins: PluginCatalog,

    #[serde(default)]
    pub pipeline: Vec<Pipeline>,
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    /// Meltano project directory, relative to the config file. The child
    /// runs here.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Program to invoke; looked up on `PATH` when not a path.
    #[serde(default = "default_executable")]
    pub executable: String,
}

fn default_executable() -> String {
    DEFAULT_EXECUTABLE.to_string()
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            dir: None,
            executable: default_executable(),
        }
    }
}

/// A validated project file. Only obtainable through
/// [`crate::config::load_and_validate`] or `TryFrom<RawProjectFile>`.
#[derive(Debug, Clone)]
pub struct ProjectFile {
    pub project: ProjectSection,
    pub plugins: PluginCatalog,
    pub pipeline: Vec<Pipeline>,
}

impl ProjectFile {
    pub(crate) fn new_unchecked(raw: RawProjectFile) -> Self {
        Self {
            project: raw.project,
            plugins: raw.plugins,
            pipeline: raw.pipeline,
        }
    }

    pub fn pipeline(&self, id: &str) -> Option<&Pipeline> {
        self.pipeline.iter().find(|p| p.id == id)
    }

    pub fn project_dir(&self) -> Option<&Path> {
        self.project.dir.as_deref()
    }

    pub fn executable(&self) -> &str {
        &self.project.executable
    }
}
