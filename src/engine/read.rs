// src/engine/read.rs
use std::io;
use std::path::Path;

use tracing::{error, info};

use super::{fail, FileOps};
use crate::fs::{FileContent, FsError, ReadMode};

impl FileOps {
    /// Read a whole file. Text mode insists on valid UTF-8.
    pub fn cat(&self, filename: impl AsRef<Path>, mode: ReadMode) -> Result<FileContent, FsError> {
        let shown = filename.as_ref();
        let full = self.resolve(shown);

        if !self.fs.exists(&full) {
            error!(path = %shown.display(), "file not found");
            return Err(FsError::not_found(shown, "cat"));
        }
        if self.fs.stat(&full).map_err(fail)?.is_directory {
            error!(path = %shown.display(), "entered filename is not a file");
            return Err(FsError::is_directory(shown, "cat"));
        }

        info!(path = %full.display(), ?mode, "reading file");
        let bytes = self.fs.read_file(&full).map_err(fail)?;
        match mode {
            ReadMode::Binary => Ok(FileContent::Binary(bytes)),
            ReadMode::Text => String::from_utf8(bytes).map(FileContent::Text).map_err(|e| {
                let err = FsError::Io {
                    path: shown.display().to_string(),
                    operation: "read".to_string(),
                    source: io::Error::new(io::ErrorKind::InvalidData, e.utf8_error()),
                };
                error!(error = %err, "file is not valid UTF-8");
                err
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cat_file_text_mode() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test.txt"), "hi hi hih hi").unwrap();
        let ops = FileOps::native(dir.path());

        let result = ops.cat("test.txt", ReadMode::Text).unwrap();
        assert_eq!(result, FileContent::Text("hi hi hih hi".to_string()));
    }

    #[test]
    fn test_cat_file_bytes_mode() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test.bin"), b"\x00\xffBinary content").unwrap();
        let ops = FileOps::native(dir.path());

        let result = ops.cat("test.bin", ReadMode::Binary).unwrap();
        assert_eq!(result, FileContent::Binary(b"\x00\xffBinary content".to_vec()));
    }

    #[test]
    fn test_cat_invalid_utf8_in_text_mode() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.txt"), b"\xff\xfe").unwrap();
        let ops = FileOps::native(dir.path());

        let err = ops.cat("bad.txt", ReadMode::Text).unwrap_err();
        assert!(matches!(err, FsError::Io { .. }));
    }

    #[test]
    fn test_cat_not_existing_file() {
        let dir = TempDir::new().unwrap();
        let ops = FileOps::native(dir.path());
        let err = ops.cat("nonexistent.txt", ReadMode::Text).unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));
    }

    #[test]
    fn test_cat_directory_error() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("testdir")).unwrap();
        let ops = FileOps::native(dir.path());
        let err = ops.cat("testdir", ReadMode::Text).unwrap_err();
        assert!(matches!(err, FsError::IsDirectory { .. }));
    }
}
