// src/engine/archive/zipfile.rs
use std::io::{self, Cursor, Read, Write};
use std::path::Path;

use tracing::{debug, warn};
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::{clear_symlink, member_target};
use crate::fs::path::is_contained;
use crate::fs::{normalize_path, FileSystem, FsError, WalkOptions};

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

fn write_error(err: ZipError, path: &Path) -> FsError {
    match err {
        ZipError::Io(source) => FsError::from_io(source, path, "zip"),
        other => FsError::Io {
            path: path.display().to_string(),
            operation: "zip".to_string(),
            source: io::Error::new(io::ErrorKind::Other, other.to_string()),
        },
    }
}

fn member_name(top: &Path, relative: &Path) -> String {
    top.join(relative)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Deflated zip of everything under `root`, with member names rooted at `top`.
/// Symlinks are followed and stored as what they point to.
pub fn pack_tree(fs: &dyn FileSystem, root: &Path, top: &Path) -> Result<Vec<u8>, FsError> {
    let options = WalkOptions { follow_links: true, include_root: true };
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for node in fs.walk(root, &options) {
        let node = node?;
        let name = member_name(top, &node.relative);
        if name.is_empty() {
            continue;
        }
        let stat = fs.stat(&node.path)?;
        let member = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(stat.mode & 0o7777);
        debug!(member = %name, "adding to zip");

        if stat.is_directory {
            writer.add_directory(name, member).map_err(|e| write_error(e, &node.path))?;
        } else {
            let content = fs.read_file(&node.path)?;
            writer.start_file(name, member).map_err(|e| write_error(e, &node.path))?;
            writer
                .write_all(&content)
                .map_err(|e| FsError::from_io(e, &node.path, "zip"))?;
        }
    }

    let cursor = writer.finish().map_err(|e| write_error(e, root))?;
    Ok(cursor.into_inner())
}

/// Extract a zip into `dest` and return the number of members written.
///
/// Members whose names leave `dest`, members below a symlink, and symlinks
/// pointing outside `dest` are skipped.
pub fn unpack_into(fs: &dyn FileSystem, data: &[u8], dest: &Path, archive: &Path) -> Result<usize, FsError> {
    let bad = |e: ZipError| FsError::wrong_format(archive, "unzip", e.to_string());
    let mut zip = ZipArchive::new(Cursor::new(data)).map_err(bad)?;

    let mut written = 0;
    for index in 0..zip.len() {
        let mut member = zip.by_index(index).map_err(bad)?;
        let Some(relative) = member.enclosed_name().map(Path::to_path_buf).filter(|p| is_contained(p)) else {
            warn!(member = %member.name(), "skipping member outside the destination");
            continue;
        };
        let Some(target) = member_target(fs, dest, &relative) else {
            warn!(member = %member.name(), "skipping member below a symlink");
            continue;
        };
        if let Some(parent) = target.parent() {
            fs.create_dir_all(parent)?;
        }

        let mode = member.unix_mode();
        if member.is_dir() {
            if fs.lstat(&target).is_ok_and(|s| s.is_symlink) {
                warn!(member = %member.name(), "skipping directory shadowed by a symlink");
                continue;
            }
            fs.create_dir_all(&target)?;
            written += 1;
            continue;
        }

        let mut content = Vec::with_capacity(member.size() as usize);
        member
            .read_to_end(&mut content)
            .map_err(|e| FsError::wrong_format(archive, "unzip", e.to_string()))?;

        if mode.is_some_and(|m| m & S_IFMT == S_IFLNK) {
            let link_target = String::from_utf8_lossy(&content).into_owned();
            let base = target.parent().unwrap_or(dest);
            if !normalize_path(&base.join(&link_target)).starts_with(normalize_path(dest)) {
                warn!(member = %member.name(), target = %link_target, "skipping symlink leaving the destination");
                continue;
            }
            if fs.lstat(&target).is_ok() {
                fs.remove_file(&target)?;
            }
            fs.symlink(Path::new(&link_target), &target)?;
        } else {
            clear_symlink(fs, &target)?;
            fs.write_file(&target, &content)?;
            if let Some(mode) = mode {
                fs.set_mode(&target, mode & 0o7777)?;
            }
        }
        written += 1;
    }
    Ok(written)
}
