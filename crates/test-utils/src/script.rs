use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// An executable shell script standing in for `meltano`.
///
/// The script body receives the real argv, so it can echo `$@` or check
/// environment variables. The directory goes away with the value.
pub struct FakeMeltano {
    dir: TempDir,
    path: PathBuf,
}

impl FakeMeltano {
    pub fn new(body: &str) -> Self {
        let dir = TempDir::new().expect("create script dir");
        let path = dir.path().join("meltano");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write fake meltano");
        make_executable(&path);
        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn executable(&self) -> String {
        self.path.display().to_string()
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path).expect("stat script").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("chmod script");
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}
