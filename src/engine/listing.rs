// src/engine/listing.rs
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use tracing::{error, info};

use super::{fail, FileOps};
use crate::fs::{FsError, FsStat};

const S_IFMT: u32 = 0o170000;

/// `ls -l` style mode string: type character plus three rwx triplets, with
/// setuid/setgid/sticky folded into the execute columns.
pub fn format_mode(mode: u32) -> String {
    let file_type = match mode & S_IFMT {
        0o040000 => 'd',
        0o120000 => 'l',
        0o020000 => 'c',
        0o060000 => 'b',
        0o010000 => 'p',
        0o140000 => 's',
        _ => '-',
    };
    let bit = |mask: u32, c: char| if mode & mask != 0 { c } else { '-' };

    [
        file_type,
        bit(0o400, 'r'),
        bit(0o200, 'w'),
        exec_bit(mode, 0o100, 0o4000, 's'),
        bit(0o040, 'r'),
        bit(0o020, 'w'),
        exec_bit(mode, 0o010, 0o2000, 's'),
        bit(0o004, 'r'),
        bit(0o002, 'w'),
        exec_bit(mode, 0o001, 0o1000, 't'),
    ]
    .iter()
    .collect()
}

fn exec_bit(mode: u32, exec_mask: u32, special_mask: u32, special: char) -> char {
    match (mode & exec_mask != 0, mode & special_mask != 0) {
        (true, true) => special,
        (false, true) => special.to_ascii_uppercase(),
        (true, false) => 'x',
        (false, false) => '-',
    }
}

/// Modification time as `Mon DD HH:MM` in local time.
pub fn format_time(mtime: SystemTime) -> String {
    let local: DateTime<Local> = DateTime::from(mtime);
    local.format("%b %d %H:%M").to_string()
}

impl FileOps {
    /// List a directory. Entries come back in enumeration order; names
    /// starting with `.` are dropped unless `show_hidden`.
    pub fn list(
        &self,
        path: impl AsRef<Path>,
        show_hidden: bool,
        long_form: bool,
    ) -> Result<Vec<String>, FsError> {
        let shown = path.as_ref();
        let full = self.resolve(shown);

        if !self.fs.exists(&full) {
            error!(path = %shown.display(), "folder not found");
            return Err(FsError::not_found(shown, "ls"));
        }
        if !self.fs.stat(&full).map_err(fail)?.is_directory {
            error!(path = %shown.display(), "not a directory");
            return Err(FsError::not_directory(shown, "ls"));
        }

        info!(path = %full.display(), show_hidden, long_form, "listing directory");
        let entries = self.fs.read_dir(&full).map_err(fail)?;

        let mut contents = Vec::with_capacity(entries.len());
        for entry in entries {
            if !show_hidden && entry.name.starts_with('.') {
                continue;
            }
            if long_form {
                let stat = self.entry_stat(&full.join(&entry.name))?;
                contents.push(self.long_line(&stat, &entry.name));
            } else {
                contents.push(entry.name);
            }
        }
        Ok(contents)
    }

    // Follows symlinks like `ls -lL`, but a dangling link still gets a line.
    fn entry_stat(&self, path: &Path) -> Result<FsStat, FsError> {
        self.fs
            .stat(path)
            .or_else(|_| self.fs.lstat(path))
            .map_err(fail)
    }

    fn long_line(&self, stat: &FsStat, name: &str) -> String {
        format!(
            "{} {} {} {} {} {} {}",
            format_mode(stat.mode),
            stat.nlink,
            self.fs.user_name(stat.uid),
            self.fs.group_name(stat.gid),
            stat.size,
            format_time(stat.mtime),
            name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileOps) {
        let dir = TempDir::new().unwrap();
        let ops = FileOps::native(dir.path());
        (dir, ops)
    }

    #[test]
    fn test_format_mode() {
        assert_eq!(format_mode(0o100644), "-rw-r--r--");
        assert_eq!(format_mode(0o040755), "drwxr-xr-x");
        assert_eq!(format_mode(0o120777), "lrwxrwxrwx");
        assert_eq!(format_mode(0o104755), "-rwsr-xr-x");
        assert_eq!(format_mode(0o041777), "drwxrwxrwt");
        assert_eq!(format_mode(0o102644), "-rw-r-Sr--");
    }

    #[test]
    fn test_format_time_shape() {
        let text = format_time(SystemTime::now());
        // "Mon DD HH:MM"
        assert_eq!(text.len(), 12);
        assert_eq!(&text[9..10], ":");
    }

    #[test]
    fn test_ls_default() {
        let (dir, ops) = setup();
        fs::write(dir.path().join("file1.txt"), "").unwrap();
        fs::write(dir.path().join("file2.txt"), "").unwrap();

        let result = ops.list(".", false, false).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.contains(&"file1.txt".to_string()));
        assert!(result.contains(&"file2.txt".to_string()));
    }

    #[test]
    fn test_ls_hides_dotfiles() {
        let (dir, ops) = setup();
        fs::write(dir.path().join(".invisible"), "").unwrap();
        fs::write(dir.path().join("visible.txt"), "").unwrap();
        fs::create_dir(dir.path().join(".config")).unwrap();

        let result = ops.list(dir.path(), false, false).unwrap();
        assert_eq!(result, vec!["visible.txt".to_string()]);
    }

    #[test]
    fn test_ls_show_all() {
        let (dir, ops) = setup();
        fs::write(dir.path().join(".shadow_blade"), "").unwrap();
        fs::write(dir.path().join("visible.txt"), "").unwrap();

        let result = ops.list(dir.path(), true, false).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.contains(&".shadow_blade".to_string()));
    }

    #[test]
    fn test_ls_long_form() {
        let (dir, ops) = setup();
        fs::write(dir.path().join("data.bin"), b"12345").unwrap();

        let result = ops.list(dir.path(), false, true).unwrap();
        assert_eq!(result.len(), 1);
        let fields: Vec<&str> = result[0].split_whitespace().collect();
        // mode nlinks owner group size Mon DD HH:MM name
        assert_eq!(fields.len(), 9);
        assert!(fields[0].starts_with("-rw"));
        assert_eq!(fields[1], "1");
        assert_eq!(fields[4], "5");
        assert_eq!(fields[8], "data.bin");
    }

    #[test]
    fn test_ls_directory_not_found() {
        let (_dir, ops) = setup();
        let err = ops.list("BOJlWE6CTBO", false, false).unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));
    }

    #[test]
    fn test_ls_path_is_file() {
        let (dir, ops) = setup();
        fs::write(dir.path().join("Hailrake.txt"), "").unwrap();
        let err = ops.list("Hailrake.txt", false, false).unwrap_err();
        assert!(matches!(err, FsError::NotDirectory { .. }));
    }
}
