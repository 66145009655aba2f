//! Directory Archiving
//!
//! `pack` turns a directory into a zip or gzip-compressed tar; `unpack`
//! extracts one into an existing directory. Both formats are built and read
//! fully in memory through the `FileSystem` trait.

mod gztar;
mod zipfile;

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use super::{fail, FileOps};
use crate::fs::path::file_name_lossy;
use crate::fs::{FileSystem, FsError};

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    GzipTar,
}

impl ArchiveFormat {
    pub const ALL: [ArchiveFormat; 2] = [ArchiveFormat::Zip, ArchiveFormat::GzipTar];

    /// Canonical file extension, including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => ".zip",
            ArchiveFormat::GzipTar => ".tar.gz",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::GzipTar => "gztar",
        }
    }

    fn pack_verb(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::GzipTar => "tar",
        }
    }

    fn unpack_verb(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "unzip",
            ArchiveFormat::GzipTar => "untar",
        }
    }

    /// Final archive path for a requested name: any known archive extension
    /// (or failing that, the last extension) is replaced by this format's.
    pub fn archive_path(self, requested: &Path) -> PathBuf {
        let name = file_name_lossy(requested);
        let stem = ArchiveFormat::ALL
            .iter()
            .find_map(|f| name.strip_suffix(f.extension()))
            .map(str::to_string)
            .unwrap_or_else(|| {
                Path::new(&name)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
        let stem = if stem.is_empty() || stem == "/" { "archive".to_string() } else { stem };
        requested.with_file_name(format!("{}{}", stem, self.extension()))
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a member named `relative` lands under `dest`.
///
/// `None` when a directory on the way is already a symlink, since writing
/// through it could leave `dest`.
fn member_target(fs: &dyn FileSystem, dest: &Path, relative: &Path) -> Option<PathBuf> {
    let mut target = dest.to_path_buf();
    let mut components = relative.components().peekable();
    while let Some(component) = components.next() {
        target.push(component);
        if components.peek().is_some() && fs.lstat(&target).is_ok_and(|s| s.is_symlink) {
            return None;
        }
    }
    Some(target)
}

/// Unlink an existing symlink at `target` so a member replaces the link
/// instead of writing through it.
fn clear_symlink(fs: &dyn FileSystem, target: &Path) -> Result<(), FsError> {
    if fs.lstat(target).is_ok_and(|s| s.is_symlink) {
        fs.remove_file(target)?;
    }
    Ok(())
}

impl FileOps {
    /// Archive `folder` as `archive_name` and return the archive's path.
    pub fn pack(
        &self,
        folder: impl AsRef<Path>,
        archive_name: impl AsRef<Path>,
        format: ArchiveFormat,
    ) -> Result<PathBuf, FsError> {
        let shown = folder.as_ref();
        let full = self.resolve(shown);
        let verb = format.pack_verb();

        if !self.fs.exists(&full) {
            error!(folder = %shown.display(), "folder does not exist");
            return Err(FsError::not_found(shown, verb));
        }
        if !self.fs.stat(&full).map_err(fail)?.is_directory {
            error!(folder = %shown.display(), "folder is not a directory, archiving unavailable");
            return Err(FsError::not_directory(shown, verb));
        }

        let requested = self.resolve(archive_name.as_ref());
        let archive = format.archive_path(&requested);
        if let Some(taken) = [&requested, &archive].into_iter().find(|p| self.fs.lstat(p).is_ok()) {
            error!(archive = %taken.display(), "archive already exists");
            return Err(FsError::already_exists(taken, verb));
        }

        info!(folder = %full.display(), archive = %archive.display(), %format, "archiving directory");
        let top = full.file_name().map(PathBuf::from).unwrap_or_default();
        let bytes = match format {
            ArchiveFormat::Zip => zipfile::pack_tree(self.fs.as_ref(), &full, &top),
            ArchiveFormat::GzipTar => gztar::pack_tree(self.fs.as_ref(), &full, &top),
        }
        .map_err(fail)?;
        self.fs.write_file(&archive, &bytes).map_err(fail)?;
        Ok(archive)
    }

    /// Extract `archive` into the existing directory `dest`.
    ///
    /// Returns how many members were written.
    pub fn unpack(
        &self,
        archive: impl AsRef<Path>,
        dest: impl AsRef<Path>,
        format: ArchiveFormat,
    ) -> Result<usize, FsError> {
        let (shown, dest_shown) = (archive.as_ref(), dest.as_ref());
        let full = self.resolve(shown);
        let dest = self.resolve(dest_shown);
        let verb = format.unpack_verb();

        if !self.fs.exists(&full) {
            error!(archive = %shown.display(), "archive does not exist");
            return Err(FsError::not_found(shown, verb));
        }
        if !self.fs.exists(&dest) {
            error!(dest = %dest_shown.display(), "destination does not exist");
            return Err(FsError::not_found(dest_shown, verb));
        }

        let is_file = self.fs.stat(&full).map_err(fail)?.is_file;
        if !is_file || !file_name_lossy(&full).ends_with(format.extension()) {
            error!(archive = %shown.display(), %format, "invalid archive format");
            return Err(FsError::wrong_format(
                shown,
                verb,
                format!("expected a {} file", format.extension()),
            ));
        }
        if !self.fs.stat(&dest).map_err(fail)?.is_directory {
            error!(dest = %dest_shown.display(), "destination is not a directory");
            return Err(FsError::not_directory(dest_shown, verb));
        }

        info!(archive = %full.display(), dest = %dest.display(), %format, "extracting archive");
        let data = self.fs.read_file(&full).map_err(fail)?;
        match format {
            ArchiveFormat::Zip => zipfile::unpack_into(self.fs.as_ref(), &data, &dest, shown),
            ArchiveFormat::GzipTar => gztar::unpack_into(self.fs.as_ref(), &data, &dest, shown),
        }
        .map_err(fail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileOps) {
        let dir = TempDir::new().unwrap();
        let ops = FileOps::native(dir.path());
        (dir, ops)
    }

    fn sample_tree(root: &Path) {
        fs::create_dir_all(root.join("data/nested")).unwrap();
        fs::write(root.join("data/file.txt"), "File content").unwrap();
        fs::write(root.join("data/nested/deep.txt"), "deep").unwrap();
        fs::write(root.join("data/run.sh"), "#!/bin/sh\n").unwrap();
        fs::set_permissions(root.join("data/run.sh"), fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_archive_path() {
        let zip = ArchiveFormat::Zip;
        let tar = ArchiveFormat::GzipTar;
        assert_eq!(zip.archive_path(Path::new("/w/archive")), PathBuf::from("/w/archive.zip"));
        assert_eq!(zip.archive_path(Path::new("/w/archive.zip")), PathBuf::from("/w/archive.zip"));
        assert_eq!(tar.archive_path(Path::new("/w/backup.tar.gz")), PathBuf::from("/w/backup.tar.gz"));
        assert_eq!(tar.archive_path(Path::new("/w/backup.zip")), PathBuf::from("/w/backup.tar.gz"));
        assert_eq!(zip.archive_path(Path::new("/w/notes.txt")), PathBuf::from("/w/notes.zip"));
        assert_eq!(zip.archive_path(Path::new("/w/.zip")), PathBuf::from("/w/archive.zip"));
    }

    #[test]
    fn test_zip_roundtrip_and_existing_archive() {
        let (dir, ops) = setup();
        sample_tree(dir.path());

        let archive = ops.pack("data", "archive", ArchiveFormat::Zip).unwrap();
        assert_eq!(archive, dir.path().join("archive.zip"));
        assert!(archive.is_file());

        let err = ops.pack("data", "archive", ArchiveFormat::Zip).unwrap_err();
        assert!(matches!(err, FsError::AlreadyExists { .. }));
        let err = ops.pack("data", "data", ArchiveFormat::Zip).unwrap_err();
        assert!(matches!(err, FsError::AlreadyExists { .. }));

        fs::create_dir(dir.path().join("out")).unwrap();
        ops.unpack("archive.zip", "out", ArchiveFormat::Zip).unwrap();
        let out = dir.path().join("out/data");
        assert_eq!(fs::read_to_string(out.join("file.txt")).unwrap(), "File content");
        assert_eq!(fs::read_to_string(out.join("nested/deep.txt")).unwrap(), "deep");
        let mode = fs::metadata(out.join("run.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_tar_roundtrip_with_symlink() {
        let (dir, ops) = setup();
        sample_tree(dir.path());
        std::os::unix::fs::symlink("file.txt", dir.path().join("data/alias")).unwrap();

        let archive = ops.pack("data", "backup.tar.gz", ArchiveFormat::GzipTar).unwrap();
        assert_eq!(archive, dir.path().join("backup.tar.gz"));

        fs::create_dir(dir.path().join("out")).unwrap();
        ops.unpack("backup.tar.gz", "out", ArchiveFormat::GzipTar).unwrap();
        let out = dir.path().join("out/data");
        assert_eq!(fs::read_to_string(out.join("nested/deep.txt")).unwrap(), "deep");
        assert_eq!(fs::read_link(out.join("alias")).unwrap(), PathBuf::from("file.txt"));
        assert_eq!(fs::read_to_string(out.join("alias")).unwrap(), "File content");
    }

    #[test]
    fn test_pack_missing_or_file_folder() {
        let (dir, ops) = setup();
        let err = ops.pack("nope", "a", ArchiveFormat::Zip).unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));

        fs::write(dir.path().join("plain.txt"), "x").unwrap();
        let err = ops.pack("plain.txt", "a", ArchiveFormat::GzipTar).unwrap_err();
        assert!(matches!(err, FsError::NotDirectory { .. }));
    }

    #[test]
    fn test_unpack_checks() {
        let (dir, ops) = setup();
        sample_tree(dir.path());
        ops.pack("data", "a", ArchiveFormat::Zip).unwrap();

        let err = ops.unpack("missing.zip", ".", ArchiveFormat::Zip).unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));

        let err = ops.unpack("a.zip", "nowhere", ArchiveFormat::Zip).unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));

        let err = ops.unpack("a.zip", "data/file.txt", ArchiveFormat::Zip).unwrap_err();
        assert!(matches!(err, FsError::NotDirectory { .. }));

        let err = ops.unpack("a.zip", ".", ArchiveFormat::GzipTar).unwrap_err();
        assert!(matches!(err, FsError::WrongFormat { .. }));

        fs::write(dir.path().join("fake.tar.gz"), "not gzip").unwrap();
        let err = ops.unpack("fake.tar.gz", ".", ArchiveFormat::GzipTar).unwrap_err();
        assert!(matches!(err, FsError::WrongFormat { .. }));
    }
}
