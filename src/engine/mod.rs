//! File Operations Engine
//!
//! `FileOps` validates and executes each filesystem command. It keeps no
//! state besides the session working directory; every call re-reads the live
//! filesystem. Validation failures are logged and returned, never retried.

pub mod archive;
pub mod listing;
pub mod read;
pub mod remove;
pub mod search;
pub mod transfer;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info};

use crate::fs::{resolve_path, FileSystem, FsError, OsFs};

pub use archive::ArchiveFormat;
pub use search::{SearchMatch, SearchResults};

/// The command engine for one shell session.
pub struct FileOps {
    fs: Arc<dyn FileSystem>,
    cwd: PathBuf,
}

impl FileOps {
    /// Create an engine whose relative paths resolve against `cwd`.
    pub fn new(fs: Arc<dyn FileSystem>, cwd: impl AsRef<Path>) -> Self {
        let cwd = resolve_path(Path::new("/"), cwd.as_ref());
        Self { fs, cwd }
    }

    /// Engine over the host filesystem.
    pub fn native(cwd: impl AsRef<Path>) -> Self {
        Self::new(Arc::new(OsFs::new()), cwd)
    }

    /// Current session working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// Resolve a path against the session working directory.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        resolve_path(&self.cwd, path.as_ref())
    }

    /// Change the session working directory. A leading `~` expands to a home
    /// directory (`~` and `~/x` for the invoking user, `~name` for `name`).
    pub fn change_directory(&mut self, path: impl AsRef<Path>) -> Result<(), FsError> {
        let expanded = self.expand_tilde(path.as_ref());
        let full = self.resolve(&expanded);

        if !self.fs.exists(&full) {
            error!(path = %expanded.display(), "folder not found");
            return Err(FsError::not_found(&expanded, "cd"));
        }
        if !self.fs.stat(&full).map_err(fail)?.is_directory {
            error!(path = %expanded.display(), "not a directory");
            return Err(FsError::not_directory(&expanded, "cd"));
        }

        info!(path = %full.display(), "changing directory");
        self.cwd = full;
        Ok(())
    }

    fn expand_tilde(&self, path: &Path) -> PathBuf {
        let text = path.to_string_lossy();
        let Some(rest) = text.strip_prefix('~') else {
            return path.to_path_buf();
        };
        let (user, tail) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx + 1..]),
            None => (rest, ""),
        };
        let home = if user.is_empty() {
            self.fs.home_dir(None)
        } else {
            self.fs.home_dir(Some(user))
        };
        match home {
            Some(home) if tail.is_empty() => home,
            Some(home) => home.join(tail),
            None => path.to_path_buf(),
        }
    }
}

/// Log an OS-level failure on its way out of the engine.
pub(crate) fn fail(err: FsError) -> FsError {
    error!(error = %err, "operation failed");
    err
}
