// ABOUTME: Stages a charm source tree into the repository layout juju expects.
// ABOUTME: Copies <source> into <tmp>/<series>/<charm-name>/, skipping excluded directories.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Series used when the caller does not name one.
pub const DEFAULT_SERIES: &str = "precise";

/// Directory basenames never copied into a staged repository.
pub const DEFAULT_EXCLUDES: &[&str] = &[".bzr", ".venv"];

#[derive(Debug, Error)]
pub enum StageError {
    #[error("charm source not found: {0}")]
    SourceMissing(PathBuf),

    #[error("charm source is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("cannot derive a charm name from {0}")]
    NoCharmName(PathBuf),

    #[error("I/O error staging {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Builds ephemeral charm repositories under the system temp directory.
///
/// Every call to [`stage`](Stager::stage) allocates a fresh, uniquely named
/// repository root. Nothing is deleted here; staged repositories are left to
/// the OS temp reaper.
#[derive(Debug, Clone)]
pub struct Stager {
    excluded: BTreeSet<String>,
}

impl Default for Stager {
    fn default() -> Self {
        Self {
            excluded: DEFAULT_EXCLUDES.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl Stager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stager with a custom excluded-basename set.
    pub fn with_excluded<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }

    /// Basenames skipped during the copy.
    pub fn excluded(&self) -> impl Iterator<Item = &str> {
        self.excluded.iter().map(String::as_str)
    }

    /// Stage `source` into `<tmp>/<series>/<charm-name>/`, returning the
    /// repository root (not the charm directory).
    ///
    /// The charm name is the final path segment of `source`. On failure a
    /// partially built repository may be left behind.
    pub fn stage(&self, source: &Path, series: &str) -> Result<PathBuf, StageError> {
        if !source.exists() {
            return Err(StageError::SourceMissing(source.to_path_buf()));
        }
        if !source.is_dir() {
            return Err(StageError::NotADirectory(source.to_path_buf()));
        }
        let charm_name = source
            .file_name()
            .ok_or_else(|| StageError::NoCharmName(source.to_path_buf()))?;

        // keep() detaches the directory from tempfile's drop-time cleanup.
        let repository = tempfile::Builder::new()
            .prefix("charm-repo-")
            .tempdir()
            .map_err(|source| io_at(&std::env::temp_dir(), source))?
            .keep();

        let charm_dir = repository.join(series).join(charm_name);
        fs::create_dir_all(&charm_dir).map_err(|source| io_at(&charm_dir, source))?;
        self.copy_tree(source, &charm_dir)?;
        Ok(repository)
    }

    fn copy_tree(&self, from: &Path, to: &Path) -> Result<(), StageError> {
        for entry in fs::read_dir(from).map_err(|source| io_at(from, source))? {
            let entry = entry.map_err(|source| io_at(from, source))?;
            let name = entry.file_name();
            if let Some(name) = name.to_str()
                && self.excluded.contains(name)
            {
                continue;
            }
            let src = entry.path();
            let dst = to.join(&name);
            let file_type = entry.file_type().map_err(|source| io_at(&src, source))?;
            if file_type.is_dir() {
                fs::create_dir(&dst).map_err(|source| io_at(&dst, source))?;
                self.copy_tree(&src, &dst)?;
            } else {
                // Symlinks are followed, matching a plain file copy.
                fs::copy(&src, &dst).map_err(|source| io_at(&dst, source))?;
            }
        }
        Ok(())
    }
}

fn io_at(path: &Path, source: io::Error) -> StageError {
    StageError::Io {
        path: path.to_path_buf(),
        source,
    }
}
