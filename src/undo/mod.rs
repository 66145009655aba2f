//! Undo
//!
//! Reverses the most recent copy or move found in history. Removals are
//! recognized but cannot be reversed.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::engine::FileOps;
use crate::fs::FsError;
use crate::history::{HistoryStore, UndoAction};

/// What `undo` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoOutcome {
    /// No copy, move or remove in history.
    Nothing,
    Moved { number: usize, from: PathBuf, to: PathBuf },
    RemovedCopies { number: usize, paths: Vec<PathBuf> },
    NotReversible { number: usize },
}

impl fmt::Display for UndoOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndoOutcome::Nothing => write!(f, "nothing to undo"),
            UndoOutcome::Moved { number, from, to } => {
                write!(f, "undid #{}: moved {} back to {}", number, from.display(), to.display())
            }
            UndoOutcome::RemovedCopies { number, paths } => {
                let shown: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
                write!(f, "undid #{}: removed {}", number, shown.join(", "))
            }
            UndoOutcome::NotReversible { number } => {
                write!(f, "#{} removed files; that cannot be undone", number)
            }
        }
    }
}

/// Undo the latest destructive command in `history`.
pub fn undo(history: &HistoryStore, ops: &FileOps) -> Result<UndoOutcome, FsError> {
    let records = history.read_records()?;
    let Some(record) = records.iter().rev().find(|r| r.action.is_destructive()) else {
        info!("no destructive command in history");
        return Ok(UndoOutcome::Nothing);
    };
    let number = record.entry.number;
    info!(number, command = %record.entry.command, "undoing");

    match &record.action {
        UndoAction::Move { source, dest } => {
            let to = ops.move_path(dest, source)?;
            Ok(UndoOutcome::Moved { number, from: ops.resolve(dest), to })
        }
        UndoAction::Copy { sources, dest, created, .. } => {
            let paths = if created.is_empty() {
                copies_from_text(ops, sources, dest)
            } else {
                created.clone()
            };
            for path in &paths {
                ops.remove(true, path)?;
            }
            Ok(UndoOutcome::RemovedCopies { number, paths })
        }
        UndoAction::Remove { paths, .. } => {
            warn!(number, count = paths.len(), "removal cannot be undone");
            Ok(UndoOutcome::NotReversible { number })
        }
        UndoAction::Other => Ok(UndoOutcome::Nothing),
    }
}

/// Best guess at what a copy created when only its text survives.
fn copies_from_text(ops: &FileOps, sources: &[PathBuf], dest: &Path) -> Vec<PathBuf> {
    let full = ops.resolve(dest);
    match ops.fs().stat(&full) {
        Ok(stat) if stat.is_directory => sources
            .iter()
            .filter_map(|s| s.file_name())
            .map(|name| full.join(name))
            .collect(),
        Ok(stat) if stat.is_file => vec![full],
        _ => {
            warn!(dest = %full.display(), "copy destination is gone, nothing to remove");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Invocation;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileOps, HistoryStore) {
        let dir = TempDir::new().unwrap();
        let ops = FileOps::native(dir.path());
        let history = HistoryStore::new(dir.path().join(".fsh_history"));
        history.ensure_exists().unwrap();
        (dir, ops, history)
    }

    #[test]
    fn test_undo_move_from_text() {
        let (dir, ops, history) = setup();
        fs::write(dir.path().join("b.txt"), "moved").unwrap();
        fs::remove_file(history.journal_path()).unwrap();
        history.append("ls").unwrap();
        history.append("mv a.txt b.txt").unwrap();

        let outcome = undo(&history, &ops).unwrap();
        assert!(matches!(outcome, UndoOutcome::Moved { number: 2, .. }));
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "moved");
        assert!(!dir.path().join("b.txt").exists());
    }

    #[test]
    fn test_undo_move_from_journal_after_cd() {
        let (dir, mut ops, history) = setup();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        let landed = ops.move_path("a.txt", "sub").unwrap();
        history
            .record(&Invocation {
                line: "mv a.txt sub".into(),
                action: UndoAction::Move { source: dir.path().join("a.txt"), dest: landed },
            })
            .unwrap();

        ops.change_directory("sub").unwrap();
        undo(&history, &ops).unwrap();
        assert!(dir.path().join("a.txt").exists());
        assert!(!dir.path().join("sub/a.txt").exists());
    }

    #[test]
    fn test_undo_copy_into_directory_from_text() {
        let (dir, ops, history) = setup();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir(dir.path().join("box")).unwrap();
        ops.copy(false, "a.txt", "box").unwrap();
        fs::remove_file(history.journal_path()).unwrap();
        history.append("cp a.txt box").unwrap();

        let outcome = undo(&history, &ops).unwrap();
        assert_eq!(
            outcome,
            UndoOutcome::RemovedCopies { number: 1, paths: vec![dir.path().join("box/a.txt")] }
        );
        assert!(dir.path().join("a.txt").exists());
        assert!(dir.path().join("box").exists());
        assert!(!dir.path().join("box/a.txt").exists());
    }

    #[test]
    fn test_undo_copy_uses_created_paths() {
        let (dir, ops, history) = setup();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/f"), "f").unwrap();
        let created = ops.copy(true, "src", "backup").unwrap();
        history
            .record(&Invocation {
                line: "cp -r src backup".into(),
                action: UndoAction::Copy {
                    recursive: true,
                    sources: vec![dir.path().join("src")],
                    dest: dir.path().join("backup"),
                    created: vec![created],
                },
            })
            .unwrap();

        undo(&history, &ops).unwrap();
        assert!(!dir.path().join("backup").exists());
        assert!(dir.path().join("src/f").exists());
    }

    #[test]
    fn test_undo_copy_with_missing_destination_removes_nothing() {
        let (dir, ops, history) = setup();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        history.append("cp a.txt gone.txt").unwrap();

        let outcome = undo(&history, &ops).unwrap();
        assert_eq!(outcome, UndoOutcome::RemovedCopies { number: 1, paths: Vec::new() });
        assert!(dir.path().join("a.txt").exists());
    }

    #[test]
    fn test_undo_remove_is_not_reversible() {
        let (_dir, ops, history) = setup();
        history.append("mv a b").unwrap();
        history.append("rm gone.txt").unwrap();
        history.append("cat x").unwrap();
        assert_eq!(undo(&history, &ops).unwrap(), UndoOutcome::NotReversible { number: 2 });
    }

    #[test]
    fn test_undo_with_nothing_destructive() {
        let (_dir, ops, history) = setup();
        assert_eq!(undo(&history, &ops).unwrap(), UndoOutcome::Nothing);
        history.append("ls -l").unwrap();
        assert_eq!(undo(&history, &ops).unwrap(), UndoOutcome::Nothing);
    }

    #[test]
    fn test_undo_propagates_engine_errors() {
        let (_dir, ops, history) = setup();
        history.append("mv a.txt b.txt").unwrap();
        let err = undo(&history, &ops).unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));
    }
}
