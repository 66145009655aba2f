// src/engine/transfer.rs
use std::io;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use super::{fail, FileOps};
use crate::fs::FsError;

impl FileOps {
    /// Copy `source` to `dest` and return the path that was created.
    ///
    /// Directories need `recursive` and are copied as a whole tree to `dest`,
    /// which must not exist yet. Files overwrite an existing destination file
    /// and land inside `dest` when it is a directory.
    pub fn copy(
        &self,
        recursive: bool,
        source: impl AsRef<Path>,
        dest: impl AsRef<Path>,
    ) -> Result<PathBuf, FsError> {
        let (source, dest) = (source.as_ref(), dest.as_ref());
        let src = self.resolve(source);
        let dst = self.resolve(dest);

        if !self.fs.exists(&src) {
            error!(source = %source.display(), "source not found");
            return Err(FsError::not_found(source, "cp"));
        }
        let src_stat = self.fs.stat(&src).map_err(fail)?;
        let dest_stat = self.fs.stat(&dst).ok();

        if src_stat.is_directory && dest_stat.as_ref().is_some_and(|s| s.is_file) {
            error!(source = %source.display(), dest = %dest.display(), "can't copy a directory onto a file");
            return Err(FsError::is_directory(source, "cp"));
        }
        if src_stat.is_directory && !recursive {
            error!(source = %source.display(), "can't copy a directory without recursion");
            return Err(FsError::recursion_required(source, "cp"));
        }

        info!(source = %src.display(), dest = %dst.display(), recursive, "copying");
        if src_stat.is_directory {
            self.fs.copy_tree(&src, &dst).map_err(fail)?;
            return Ok(dst);
        }

        let target = if dest_stat.is_some_and(|s| s.is_directory) {
            dst.join(src.file_name().unwrap_or_default())
        } else {
            dst
        };
        if target == src {
            let err = FsError::Io {
                path: source.display().to_string(),
                operation: "cp".to_string(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "source and destination are the same file"),
            };
            error!(error = %err, "refusing to copy a file onto itself");
            return Err(err);
        }
        self.fs.copy_file(&src, &target).map_err(fail)?;
        Ok(target)
    }

    /// Move `source` to `dest` and return where it landed.
    ///
    /// An existing directory at `dest` receives the source under its own
    /// name. Crossing filesystems falls back to copy + delete.
    pub fn move_path(&self, source: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<PathBuf, FsError> {
        let (source, dest) = (source.as_ref(), dest.as_ref());
        let src = self.resolve(source);
        let dst = self.resolve(dest);

        if !self.fs.exists(&src) {
            error!(source = %source.display(), "source not found, can't move");
            return Err(FsError::not_found(source, "mv"));
        }

        let target = if self.fs.stat(&dst).is_ok_and(|s| s.is_directory) && dst != src {
            let inside = dst.join(src.file_name().unwrap_or_default());
            if self.fs.lstat(&inside).is_ok() {
                error!(target = %inside.display(), "destination already exists");
                return Err(FsError::already_exists(&inside, "mv"));
            }
            inside
        } else {
            dst
        };

        info!(source = %src.display(), dest = %target.display(), "moving");
        match self.fs.rename(&src, &target) {
            Ok(()) => Ok(target),
            Err(FsError::Io { source: ref io_err, .. }) if io_err.raw_os_error() == Some(libc::EXDEV) => {
                warn!(source = %src.display(), "cross-device move, copying instead");
                self.move_across_devices(&src, &target)?;
                Ok(target)
            }
            Err(err @ FsError::PermissionDenied { .. }) => {
                error!(source = %source.display(), "permission denied");
                Err(err)
            }
            Err(err) => Err(fail(err)),
        }
    }

    fn move_across_devices(&self, src: &Path, target: &Path) -> Result<(), FsError> {
        let stat = self.fs.lstat(src).map_err(fail)?;
        if stat.is_directory {
            self.fs.copy_tree(src, target).map_err(fail)?;
            self.fs.remove_tree(src).map_err(fail)
        } else {
            self.fs.copy_file(src, target).map_err(fail)?;
            self.fs.remove_file(src).map_err(fail)
        }
    }
}
