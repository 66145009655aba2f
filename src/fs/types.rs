//! File System Types
//!
//! Core types and the trait the command engine talks to.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

/// File system errors
#[derive(Error, Debug)]
pub enum FsError {
    #[error("ENOENT: no such file or directory, {operation} '{path}'")]
    NotFound { path: String, operation: String },

    #[error("ENOTDIR: not a directory, {operation} '{path}'")]
    NotDirectory { path: String, operation: String },

    #[error("EISDIR: illegal operation on a directory, {operation} '{path}'")]
    IsDirectory { path: String, operation: String },

    #[error("EISDIR: -r not specified; omitting directory, {operation} '{path}'")]
    RecursionRequired { path: String, operation: String },

    #[error("EEXIST: file already exists, {operation} '{path}'")]
    AlreadyExists { path: String, operation: String },

    #[error("EPERM: operation not permitted, {operation} '{path}'")]
    PermissionDenied { path: String, operation: String },

    #[error("EFTYPE: wrong archive format, {operation} '{path}': {reason}")]
    WrongFormat { path: String, operation: String, reason: String },

    #[error("EINVAL: invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("EIO: {operation} '{path}': {source}")]
    Io {
        path: String,
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    pub fn not_found(path: &Path, operation: &str) -> Self {
        FsError::NotFound { path: display(path), operation: operation.to_string() }
    }

    pub fn not_directory(path: &Path, operation: &str) -> Self {
        FsError::NotDirectory { path: display(path), operation: operation.to_string() }
    }

    pub fn is_directory(path: &Path, operation: &str) -> Self {
        FsError::IsDirectory { path: display(path), operation: operation.to_string() }
    }

    pub fn recursion_required(path: &Path, operation: &str) -> Self {
        FsError::RecursionRequired { path: display(path), operation: operation.to_string() }
    }

    pub fn already_exists(path: &Path, operation: &str) -> Self {
        FsError::AlreadyExists { path: display(path), operation: operation.to_string() }
    }

    pub fn permission_denied(path: &Path, operation: &str) -> Self {
        FsError::PermissionDenied { path: display(path), operation: operation.to_string() }
    }

    pub fn wrong_format(path: &Path, operation: &str, reason: impl Into<String>) -> Self {
        FsError::WrongFormat {
            path: display(path),
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }

    /// Map an OS error onto the taxonomy, keeping the path and operation.
    pub fn from_io(source: io::Error, path: &Path, operation: &str) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::not_found(path, operation),
            io::ErrorKind::PermissionDenied => Self::permission_denied(path, operation),
            io::ErrorKind::AlreadyExists => Self::already_exists(path, operation),
            _ => match source.raw_os_error() {
                Some(libc::ENOTDIR) => Self::not_directory(path, operation),
                Some(libc::EISDIR) => Self::is_directory(path, operation),
                Some(libc::EPERM) => Self::permission_denied(path, operation),
                _ => FsError::Io {
                    path: display(path),
                    operation: operation.to_string(),
                    source,
                },
            },
        }
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

/// How `cat` hands file contents back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    #[default]
    Text,
    Binary,
}

/// File content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    Binary(Vec<u8>),
}

impl FileContent {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileContent::Text(text) => text.as_bytes(),
            FileContent::Binary(bytes) => bytes,
        }
    }
}

impl From<String> for FileContent {
    fn from(s: String) -> Self {
        FileContent::Text(s)
    }
}

impl From<Vec<u8>> for FileContent {
    fn from(v: Vec<u8>) -> Self {
        FileContent::Binary(v)
    }
}

/// File status information
#[derive(Debug, Clone)]
pub struct FsStat {
    pub is_file: bool,
    pub is_directory: bool,
    pub is_symlink: bool,
    pub mode: u32,
    pub nlink: u64,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub mtime: SystemTime,
}

/// Directory entry with type information
#[derive(Debug, Clone)]
pub struct DirentEntry {
    pub name: String,
    pub is_file: bool,
    pub is_directory: bool,
    pub is_symlink: bool,
}

/// One node yielded by [`FileSystem::walk`].
#[derive(Debug, Clone)]
pub struct WalkEntry {
    pub path: PathBuf,
    /// Path relative to the walk root; empty for the root itself.
    pub relative: PathBuf,
    pub is_file: bool,
    pub is_directory: bool,
    pub is_symlink: bool,
}

/// Options for walk operation
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    pub follow_links: bool,
    pub include_root: bool,
}

/// Owns its state, so it can outlive the borrow of the filesystem.
pub type WalkIter = Box<dyn Iterator<Item = Result<WalkEntry, FsError>> + Send>;

/// Abstract filesystem interface the command engine runs on.
///
/// Paths handed in are already resolved against the session working
/// directory. Nothing here caches metadata.
pub trait FileSystem: Send + Sync {
    /// Check if a path exists (follows symlinks)
    fn exists(&self, path: &Path) -> bool;

    /// Get file/directory information (follows symlinks)
    fn stat(&self, path: &Path) -> Result<FsStat, FsError>;

    /// Get file/directory information (does not follow symlinks)
    fn lstat(&self, path: &Path) -> Result<FsStat, FsError>;

    /// Read directory contents in enumeration order
    fn read_dir(&self, path: &Path) -> Result<Vec<DirentEntry>, FsError>;

    /// Read the contents of a file as bytes
    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError>;

    /// Write content to a file, creating or truncating it
    fn write_file(&self, path: &Path, content: &[u8]) -> Result<(), FsError>;

    /// Create a single directory
    fn create_dir(&self, path: &Path) -> Result<(), FsError>;

    /// Create a directory and any missing parents
    fn create_dir_all(&self, path: &Path) -> Result<(), FsError>;

    /// Copy one file byte-for-byte, overwriting `dest`
    fn copy_file(&self, src: &Path, dest: &Path) -> Result<u64, FsError>;

    /// Copy a whole tree; `dest` must not exist yet
    fn copy_tree(&self, src: &Path, dest: &Path) -> Result<(), FsError>;

    /// Rename within one filesystem
    fn rename(&self, src: &Path, dest: &Path) -> Result<(), FsError>;

    /// Unlink a file or symlink
    fn remove_file(&self, path: &Path) -> Result<(), FsError>;

    /// Remove a directory and everything below it
    fn remove_tree(&self, path: &Path) -> Result<(), FsError>;

    /// Create a symbolic link at `link_path` pointing to `target`
    fn symlink(&self, target: &Path, link_path: &Path) -> Result<(), FsError>;

    /// Read the target of a symbolic link
    fn read_link(&self, path: &Path) -> Result<PathBuf, FsError>;

    /// Change permission bits
    fn set_mode(&self, path: &Path, mode: u32) -> Result<(), FsError>;

    /// Lazily walk `root` depth-first in enumeration order
    fn walk(&self, root: &Path, options: &WalkOptions) -> WalkIter;

    /// Login name for a uid, or the number itself
    fn user_name(&self, uid: u32) -> String;

    /// Group name for a gid, or the number itself
    fn group_name(&self, gid: u32) -> String;

    /// Home directory of `user`, or of the invoking user when `None`
    fn home_dir(&self, user: Option<&str>) -> Option<PathBuf>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_maps_kinds() {
        let path = Path::new("/tmp/x");
        let err = FsError::from_io(io::Error::from(io::ErrorKind::NotFound), path, "stat");
        assert!(matches!(err, FsError::NotFound { .. }));

        let err = FsError::from_io(io::Error::from(io::ErrorKind::PermissionDenied), path, "rename");
        assert!(matches!(err, FsError::PermissionDenied { .. }));

        let err = FsError::from_io(io::Error::from_raw_os_error(libc::ENOTDIR), path, "open");
        assert!(matches!(err, FsError::NotDirectory { .. }));

        let err = FsError::from_io(io::Error::new(io::ErrorKind::InvalidData, "bad"), path, "read");
        assert!(matches!(err, FsError::Io { .. }));
    }

    #[test]
    fn test_error_messages() {
        let err = FsError::not_found(Path::new("/nope"), "ls");
        assert_eq!(err.to_string(), "ENOENT: no such file or directory, ls '/nope'");

        let err = FsError::recursion_required(Path::new("dir"), "rm");
        assert!(err.to_string().contains("-r not specified"));
    }

    #[test]
    fn test_file_content_bytes() {
        assert_eq!(FileContent::from("hi".to_string()).as_bytes(), b"hi");
        assert_eq!(FileContent::from(vec![0u8, 1]).as_bytes(), &[0, 1]);
    }
}
