//! Native File System Implementation
//!
//! `FileSystem` over the host filesystem via `std::fs`, `walkdir` for tree
//! traversal and libc for passwd/group lookups.

use std::ffi::{CStr, CString};
use std::fs;
use std::io;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::types::*;

/// The host filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl OsFs {
    pub fn new() -> Self {
        OsFs
    }
}

fn to_stat(meta: &fs::Metadata, is_symlink: bool) -> FsStat {
    FsStat {
        is_file: meta.is_file(),
        is_directory: meta.is_dir(),
        is_symlink,
        mode: meta.mode(),
        nlink: meta.nlink(),
        uid: meta.uid(),
        gid: meta.gid(),
        size: meta.size(),
        mtime: meta.modified().unwrap_or(std::time::UNIX_EPOCH),
    }
}

fn walk_error(err: walkdir::Error, root: &Path, operation: &str) -> FsError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
    let message = err.to_string();
    match err.into_io_error() {
        Some(source) => FsError::from_io(source, &path, operation),
        None => FsError::Io {
            path: path.display().to_string(),
            operation: operation.to_string(),
            source: io::Error::new(io::ErrorKind::Other, message),
        },
    }
}

impl FileSystem for OsFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn stat(&self, path: &Path) -> Result<FsStat, FsError> {
        let meta = fs::metadata(path).map_err(|e| FsError::from_io(e, path, "stat"))?;
        Ok(to_stat(&meta, false))
    }

    fn lstat(&self, path: &Path) -> Result<FsStat, FsError> {
        let meta = fs::symlink_metadata(path).map_err(|e| FsError::from_io(e, path, "lstat"))?;
        Ok(to_stat(&meta, meta.file_type().is_symlink()))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirentEntry>, FsError> {
        let reader = fs::read_dir(path).map_err(|e| FsError::from_io(e, path, "scandir"))?;
        let mut entries = Vec::new();
        for entry in reader {
            let entry = entry.map_err(|e| FsError::from_io(e, path, "scandir"))?;
            let file_type = entry.file_type().map_err(|e| FsError::from_io(e, &entry.path(), "scandir"))?;
            entries.push(DirentEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_file: file_type.is_file(),
                is_directory: file_type.is_dir(),
                is_symlink: file_type.is_symlink(),
            });
        }
        Ok(entries)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        fs::read(path).map_err(|e| FsError::from_io(e, path, "open"))
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> Result<(), FsError> {
        fs::write(path, content).map_err(|e| FsError::from_io(e, path, "write"))
    }

    fn create_dir(&self, path: &Path) -> Result<(), FsError> {
        fs::create_dir(path).map_err(|e| FsError::from_io(e, path, "mkdir"))
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FsError> {
        fs::create_dir_all(path).map_err(|e| FsError::from_io(e, path, "mkdir"))
    }

    fn copy_file(&self, src: &Path, dest: &Path) -> Result<u64, FsError> {
        fs::copy(src, dest).map_err(|e| FsError::from_io(e, dest, "copyfile"))
    }

    fn copy_tree(&self, src: &Path, dest: &Path) -> Result<(), FsError> {
        if fs::symlink_metadata(dest).is_ok() {
            return Err(FsError::already_exists(dest, "copytree"));
        }
        // Snapshot the tree first so a destination inside `src` is not walked.
        let entries = WalkDir::new(src)
            .follow_links(true)
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| walk_error(e, src, "copytree"))?;
        for entry in entries {
            let relative = match entry.path().strip_prefix(src) {
                Ok(relative) => relative,
                Err(_) => continue,
            };
            let target = dest.join(relative);
            if entry.file_type().is_dir() {
                self.create_dir(&target)?;
            } else {
                fs::copy(entry.path(), &target).map_err(|e| FsError::from_io(e, &target, "copytree"))?;
            }
        }
        Ok(())
    }

    fn rename(&self, src: &Path, dest: &Path) -> Result<(), FsError> {
        fs::rename(src, dest).map_err(|e| FsError::from_io(e, src, "rename"))
    }

    fn remove_file(&self, path: &Path) -> Result<(), FsError> {
        fs::remove_file(path).map_err(|e| FsError::from_io(e, path, "unlink"))
    }

    fn remove_tree(&self, path: &Path) -> Result<(), FsError> {
        fs::remove_dir_all(path).map_err(|e| FsError::from_io(e, path, "rmtree"))
    }

    fn symlink(&self, target: &Path, link_path: &Path) -> Result<(), FsError> {
        std::os::unix::fs::symlink(target, link_path)
            .map_err(|e| FsError::from_io(e, link_path, "symlink"))
    }

    fn read_link(&self, path: &Path) -> Result<PathBuf, FsError> {
        fs::read_link(path).map_err(|e| FsError::from_io(e, path, "readlink"))
    }

    fn set_mode(&self, path: &Path, mode: u32) -> Result<(), FsError> {
        fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
            .map_err(|e| FsError::from_io(e, path, "chmod"))
    }

    fn walk(&self, root: &Path, options: &WalkOptions) -> WalkIter {
        let root = root.to_path_buf();
        let min_depth = if options.include_root { 0 } else { 1 };
        let walker = WalkDir::new(&root)
            .follow_links(options.follow_links)
            .min_depth(min_depth)
            .into_iter();
        Box::new(walker.map(move |entry| match entry {
            Ok(entry) => {
                let file_type = entry.file_type();
                let relative = entry
                    .path()
                    .strip_prefix(&root)
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                Ok(WalkEntry {
                    path: entry.path().to_path_buf(),
                    relative,
                    is_file: file_type.is_file(),
                    is_directory: file_type.is_dir(),
                    is_symlink: entry.path_is_symlink(),
                })
            }
            Err(err) => Err(walk_error(err, &root, "walk")),
        }))
    }

    fn user_name(&self, uid: u32) -> String {
        passwd_by_uid(uid)
            .map(|pw| pw.name)
            .unwrap_or_else(|| uid.to_string())
    }

    fn group_name(&self, gid: u32) -> String {
        group_name_by_gid(gid).unwrap_or_else(|| gid.to_string())
    }

    fn home_dir(&self, user: Option<&str>) -> Option<PathBuf> {
        match user {
            None => std::env::var_os("HOME")
                .filter(|home| !home.is_empty())
                .map(PathBuf::from)
                .or_else(|| passwd_by_uid(unsafe { libc::getuid() }).map(|pw| pw.home)),
            Some(name) => passwd_by_name(name).map(|pw| pw.home),
        }
    }
}

// ============================================================================
// passwd / group lookups
// ============================================================================

struct PasswdEntry {
    name: String,
    home: PathBuf,
}

const LOOKUP_BUF_LEN: usize = 16 * 1024;

unsafe fn passwd_entry(pwd: &libc::passwd) -> PasswdEntry {
    let name = CStr::from_ptr(pwd.pw_name).to_string_lossy().into_owned();
    let home = CStr::from_ptr(pwd.pw_dir).to_string_lossy().into_owned();
    PasswdEntry { name, home: PathBuf::from(home) }
}

fn passwd_by_uid(uid: libc::uid_t) -> Option<PasswdEntry> {
    let mut buf = vec![0 as libc::c_char; LOOKUP_BUF_LEN];
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut result: *mut libc::passwd = std::ptr::null_mut();
    let rc = unsafe { libc::getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result) };
    if rc != 0 || result.is_null() {
        return None;
    }
    Some(unsafe { passwd_entry(&pwd) })
}

fn passwd_by_name(name: &str) -> Option<PasswdEntry> {
    let c_name = CString::new(name).ok()?;
    let mut buf = vec![0 as libc::c_char; LOOKUP_BUF_LEN];
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut result: *mut libc::passwd = std::ptr::null_mut();
    let rc = unsafe {
        libc::getpwnam_r(c_name.as_ptr(), &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result)
    };
    if rc != 0 || result.is_null() {
        return None;
    }
    Some(unsafe { passwd_entry(&pwd) })
}

fn group_name_by_gid(gid: libc::gid_t) -> Option<String> {
    let mut buf = vec![0 as libc::c_char; LOOKUP_BUF_LEN];
    let mut grp: libc::group = unsafe { std::mem::zeroed() };
    let mut result: *mut libc::group = std::ptr::null_mut();
    let rc = unsafe { libc::getgrgid_r(gid, &mut grp, buf.as_mut_ptr(), buf.len(), &mut result) };
    if rc != 0 || result.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(grp.gr_name) }.to_string_lossy().into_owned())
}
