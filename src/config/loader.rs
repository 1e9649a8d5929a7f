// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ProjectFile, RawProjectFile};
use crate::config::validate::resolve_project_dir;
use crate::errors::Result;

/// Read and deserialize a project file without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawProjectFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawProjectFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a project file and validate it:
///
/// - at least one pipeline,
/// - unique, non-empty pipeline ids,
/// - every plugin named.
///
/// A relative `project.dir` is resolved against the file's directory.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ProjectFile> {
    let raw_config = load_from_path(&path)?;
    let mut config = ProjectFile::try_from(raw_config)?;
    resolve_project_dir(&mut config, path.as_ref());
    Ok(config)
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("Meltrun.toml")
}
