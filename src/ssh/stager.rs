// src/ssh/stager.rs

//! Ephemeral SSH credentials for git-authenticated plugin sources.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempDir};

use crate::env::EnvSource;
use crate::env::git_ssh_command;
use crate::errors::{MeltrunError, Result};
use crate::logs::{Level, RunSink};
use crate::model::KeySource;

const DIR_PREFIX: &str = "meltano_ssh_";
const CONFIG_SUFFIX: &str = "_ssh_config";

/// Key files plus an ssh client config, all inside one private temp dir.
///
/// The directory and everything in it is removed when this guard drops,
/// whichever way the run ends.
#[derive(Debug)]
pub struct SshStaging {
    dir: TempDir,
    config_path: PathBuf,
    key_paths: Vec<PathBuf>,
}

impl SshStaging {
    /// Write `keys` to disk. Returns `None`, touching nothing, when `keys`
    /// is empty.
    ///
    /// An env-sourced key whose variable is unset is a configuration error;
    /// one that is set but empty is skipped.
    pub fn stage(
        keys: &[KeySource],
        lookup: &dyn EnvSource,
        sink: &mut dyn RunSink,
    ) -> Result<Option<Self>> {
        Self::stage_in(&std::env::temp_dir(), keys, lookup, sink)
    }

    /// [`SshStaging::stage`], with the staging directory created under `base`.
    pub fn stage_in(
        base: &Path,
        keys: &[KeySource],
        lookup: &dyn EnvSource,
        sink: &mut dyn RunSink,
    ) -> Result<Option<Self>> {
        if keys.is_empty() {
            return Ok(None);
        }

        sink.log(Level::Info, "Setting up SSH configuration for Git authentication");

        // Dropped on every early return below, taking written keys with it.
        let dir = Builder::new().prefix(DIR_PREFIX).tempdir_in(base)?;
        let mut key_paths = Vec::with_capacity(keys.len());

        for (index, source) in keys.iter().enumerate() {
            let content = resolve_key(index, source, lookup)?;
            if content.is_empty() {
                continue;
            }
            let path = write_private_file(
                dir.path(),
                &format!("_id_rsa_{index}"),
                &normalise_key(&content),
            )?;
            key_paths.push(path);
        }

        let config_path = write_private_file(dir.path(), CONFIG_SUFFIX, &render_config(&key_paths))?;

        Ok(Some(Self {
            dir,
            config_path,
            key_paths,
        }))
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn key_paths(&self) -> &[PathBuf] {
        &self.key_paths
    }

    /// `ssh -F <config>`, for `GIT_SSH_COMMAND`.
    pub fn git_ssh_command(&self) -> String {
        git_ssh_command(&self.config_path)
    }
}

fn resolve_key(index: usize, source: &KeySource, lookup: &dyn EnvSource) -> Result<String> {
    match source {
        KeySource::Literal(text) => Ok(text.clone()),
        KeySource::FromEnv { env } => lookup.var(env).ok_or_else(|| {
            MeltrunError::config(format!(
                "Environment variable for SSH key at index {index} is not set"
            ))
        }),
    }
}

/// Turn literal `\n` sequences into newlines and end with exactly one.
pub fn normalise_key(raw: &str) -> String {
    let mut key = raw.replace("\\n", "\n");
    let trimmed = key.trim_end_matches('\n').len();
    key.truncate(trimmed);
    key.push('\n');
    key
}

/// One `Host *` stanza per key file, separated by blank lines.
pub fn render_config(key_paths: &[PathBuf]) -> String {
    key_paths
        .iter()
        .map(|path| {
            format!(
                "Host *\n    IdentityFile {}\n    IdentitiesOnly yes\n    StrictHostKeyChecking no\n    UserKnownHostsFile /dev/null\n",
                path.display()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_private_file(dir: &Path, suffix: &str, content: &str) -> Result<PathBuf> {
    let mut file = Builder::new().suffix(suffix).tempfile_in(dir)?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    restrict_to_owner(file.path())?;
    let path = file.into_temp_path().keep().map_err(io::Error::from)?;
    Ok(path)
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> io::Result<()> {
    Ok(())
}
