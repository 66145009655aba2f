// src/engine/remove.rs
use std::path::Path;

use tracing::{error, info};

use super::{fail, FileOps};
use crate::fs::{normalize_path, FsError};

impl FileOps {
    /// Delete a file, symlink or (with `recursive`) a directory tree.
    ///
    /// The filesystem root and the parent of the working directory are
    /// never removed, whatever `recursive` says.
    pub fn remove(&self, recursive: bool, path: impl AsRef<Path>) -> Result<(), FsError> {
        let shown = path.as_ref();
        let full = self.resolve(shown);

        let stat = match self.fs.lstat(&full) {
            Ok(stat) => stat,
            Err(_) => {
                error!(path = %shown.display(), "path does not exist");
                return Err(FsError::not_found(shown, "rm"));
            }
        };

        let parent = normalize_path(&self.cwd.join(".."));
        if full == Path::new("/") || full == parent {
            error!(path = %full.display(), "path is either a root or parent directory");
            return Err(FsError::permission_denied(shown, "rm"));
        }

        if stat.is_directory {
            if !recursive {
                error!(path = %shown.display(), "cannot remove a directory with recursive=false");
                return Err(FsError::recursion_required(shown, "rm"));
            }
            info!(path = %full.display(), "removing directory tree");
            self.fs.remove_tree(&full).map_err(fail)
        } else {
            info!(path = %full.display(), "removing file");
            self.fs.remove_file(&full).map_err(fail)
        }
    }
}
