// src/engine/search.rs
//! Lazy regex search over files and directory trees.

use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::vec;

use regex_lite::Regex;
use tracing::{error, info, warn};

use super::FileOps;
use crate::fs::path::file_name_lossy;
use crate::fs::{FileSystem, FsError, WalkIter, WalkOptions};

/// One matching line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub path: PathBuf,
    /// 1-based
    pub line_number: usize,
    pub line: String,
}

impl fmt::Display for SearchMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}:{}", file_name_lossy(&self.path), self.line_number, self.line)
    }
}

/// Iterator over the matches of one `grep` call.
///
/// Targets are validated as they are reached, so an error item can follow
/// matches from earlier targets. The iterator ends after yielding an error.
pub struct SearchResults {
    fs: Arc<dyn FileSystem>,
    regex: Regex,
    recursive: bool,
    /// (as typed, resolved)
    targets: VecDeque<(PathBuf, PathBuf)>,
    walker: Option<WalkIter>,
    current: Option<(PathBuf, vec::IntoIter<(usize, String)>)>,
    done: bool,
}

impl SearchResults {
    fn open_file(&mut self, path: PathBuf) {
        match self.fs.read_file(&path) {
            Ok(bytes) => {
                let lines: Vec<(usize, String)> = String::from_utf8_lossy(&bytes)
                    .lines()
                    .enumerate()
                    .filter(|(_, line)| self.regex.is_match(line))
                    .map(|(i, line)| (i + 1, line.to_string()))
                    .collect();
                self.current = Some((path, lines.into_iter()));
            }
            Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable file"),
        }
    }

    /// Next file to scan from the active walk, if any.
    fn next_from_walk(&mut self) -> Option<Result<PathBuf, FsError>> {
        let walker = self.walker.as_mut()?;
        for node in walker.by_ref() {
            match node {
                Ok(node) if node.is_file => return Some(Ok(node.path)),
                Ok(node) if node.is_symlink => {
                    if self.fs.stat(&node.path).is_ok_and(|s| s.is_file) {
                        return Some(Ok(node.path));
                    }
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "skipping unreadable entry"),
            }
        }
        self.walker = None;
        None
    }

    /// Advance to the next target, returning a file to scan or an error.
    fn next_target(&mut self) -> Option<Result<PathBuf, FsError>> {
        let (shown, full) = self.targets.pop_front()?;
        if !self.fs.exists(&full) {
            error!(path = %shown.display(), "no such file or directory");
            return Some(Err(FsError::not_found(&shown, "grep")));
        }
        let is_directory = match self.fs.stat(&full) {
            Ok(stat) => stat.is_directory,
            Err(err) => return Some(Err(err)),
        };
        if !is_directory {
            return Some(Ok(full));
        }
        if !self.recursive {
            error!(path = %shown.display(), "is a directory");
            return Some(Err(FsError::is_directory(&shown, "grep")));
        }
        let options = WalkOptions { follow_links: false, include_root: false };
        self.walker = Some(self.fs.walk(&full, &options));
        None
    }
}

impl Iterator for SearchResults {
    type Item = Result<SearchMatch, FsError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if let Some((path, lines)) = self.current.as_mut() {
                if let Some((line_number, line)) = lines.next() {
                    return Some(Ok(SearchMatch { path: path.clone(), line_number, line }));
                }
                self.current = None;
            }

            if self.walker.is_some() {
                if let Some(Ok(path)) = self.next_from_walk() {
                    self.open_file(path);
                }
                continue;
            }

            if self.targets.is_empty() {
                self.done = true;
                break;
            }
            match self.next_target() {
                Some(Ok(path)) => self.open_file(path),
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err));
                }
                None => {}
            }
        }
        None
    }
}

/// Strip one pair of matching surrounding quotes.
fn unquote(pattern: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|&q| pattern.strip_prefix(q).and_then(|p| p.strip_suffix(q)))
        .unwrap_or(pattern)
}

impl FileOps {
    /// Search `files` for lines matching `pattern`.
    ///
    /// The pattern is compiled up front; nothing is read until the returned
    /// iterator is advanced.
    pub fn search<P: AsRef<Path>>(
        &self,
        recursive: bool,
        ignore_case: bool,
        pattern: &str,
        files: &[P],
    ) -> Result<SearchResults, FsError> {
        let pattern = unquote(pattern);
        let source = if ignore_case { format!("(?i){}", pattern) } else { pattern.to_string() };
        let regex = Regex::new(&source).map_err(|e| {
            error!(pattern, error = %e, "invalid pattern");
            FsError::InvalidPattern { pattern: pattern.to_string(), reason: e.to_string() }
        })?;

        info!(pattern, recursive, ignore_case, targets = files.len(), "searching");
        let targets = files
            .iter()
            .map(|f| (f.as_ref().to_path_buf(), self.resolve(f)))
            .collect();
        Ok(SearchResults {
            fs: Arc::clone(&self.fs),
            regex,
            recursive,
            targets,
            walker: None,
            current: None,
            done: false,
        })
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

    fn collect(results: SearchResults) -> Vec<String> {
        results.map(|m| m.unwrap().to_string()).collect()
    }

    #[test]
    fn test_grep_ignore_case() {
        let (dir, ops) = setup();
        fs::write(dir.path().join("f.txt"), "ABCDEF\nxyz\n").unwrap();

        let found = collect(ops.search(false, true, "abc", &["f.txt"]).unwrap());
        assert_eq!(found, vec!["f.txt: 1:ABCDEF"]);

        let found = collect(ops.search(false, false, "abc", &["f.txt"]).unwrap());
        assert!(found.is_empty());
    }

    #[test]
    fn test_grep_strips_quotes_and_numbers_lines() {
        let (dir, ops) = setup();
        fs::write(dir.path().join("log.txt"), "ok\nerror: one\nok\nerror: two").unwrap();

        let found: Vec<SearchMatch> = ops
            .search(false, false, "\"^error\"", &["log.txt"])
            .unwrap()
            .map(Result::unwrap)
            .collect();
        let numbers: Vec<usize> = found.iter().map(|m| m.line_number).collect();
        assert_eq!(numbers, vec![2, 4]);
        assert_eq!(found[1].line, "error: two");
    }

    #[test]
    fn test_unquote_strips_one_matching_pair() {
        assert_eq!(unquote("\"^error\""), "^error");
        assert_eq!(unquote("'a b'"), "a b");
        assert_eq!(unquote("rock'n'roll'"), "rock'n'roll'");
        assert_eq!(unquote("\"\"x\"\""), "\"x\"");
        assert_eq!(unquote("\"mixed'"), "\"mixed'");
        assert_eq!(unquote("\""), "\"");
    }

    #[test]
    fn test_grep_recursive() {
        let (dir, ops) = setup();
        fs::create_dir_all(dir.path().join("src/deep")).unwrap();
        fs::write(dir.path().join("src/a.rs"), "fn main() {}\n").unwrap();
        fs::write(dir.path().join("src/deep/b.rs"), "fn helper() {}\nstruct X;\n").unwrap();
        fs::write(dir.path().join("src/deep/c.txt"), "nothing\n").unwrap();

        let mut found = collect(ops.search(true, false, "fn ", &["src"]).unwrap());
        found.sort();
        assert_eq!(found, vec!["a.rs: 1:fn main() {}", "b.rs: 1:fn helper() {}"]);
    }

    #[test]
    fn test_grep_recursive_survives_undecodable_file() {
        let (dir, ops) = setup();
        fs::create_dir(dir.path().join("mixed")).unwrap();
        fs::write(dir.path().join("mixed/blob.bin"), b"\xff\xfe\x00needle?").unwrap();
        fs::write(dir.path().join("mixed/notes.txt"), "a needle here\n").unwrap();

        let mut found = collect(ops.search(true, false, "needle", &["mixed"]).unwrap());
        found.sort();
        assert_eq!(found.len(), 2);
        assert_eq!(found[1], "notes.txt: 1:a needle here");
    }

    #[test]
    fn test_grep_directory_without_recursive() {
        let (dir, ops) = setup();
        fs::create_dir(dir.path().join("src")).unwrap();
        let mut results = ops.search(false, false, "x", &["src"]).unwrap();
        assert!(matches!(results.next(), Some(Err(FsError::IsDirectory { .. }))));
        assert!(results.next().is_none());
    }

    #[test]
    fn test_grep_error_after_earlier_matches() {
        let (dir, ops) = setup();
        fs::write(dir.path().join("a.txt"), "hit\n").unwrap();

        let mut results = ops.search(false, false, "hit", &["a.txt", "missing.txt", "a.txt"]).unwrap();
        assert!(matches!(results.next(), Some(Ok(_))));
        assert!(matches!(results.next(), Some(Err(FsError::NotFound { .. }))));
        assert!(results.next().is_none());
    }

    #[test]
    fn test_grep_invalid_pattern() {
        let (dir, ops) = setup();
        fs::write(dir.path().join("a.txt"), "x").unwrap();
        let err = ops.search(false, false, "(unclosed", &["a.txt"]).err().unwrap();
        assert!(matches!(err, FsError::InvalidPattern { .. }));
    }

    #[test]
    fn test_grep_is_lazy() {
        let (dir, ops) = setup();
        fs::write(dir.path().join("a.txt"), "x\n").unwrap();
        let results = ops.search(false, false, "x", &["a.txt"]).unwrap();
        fs::write(dir.path().join("a.txt"), "y\n").unwrap();
        assert!(collect(results).is_empty());
    }
}
