// src/history/store.rs
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::record::{Invocation, UndoAction};
use crate::fs::FsError;

/// One line of the history log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// 1-based position in the log
    pub number: usize,
    pub command: String,
}

/// A history entry together with its undo action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub entry: HistoryEntry,
    pub action: UndoAction,
}

/// Append-only command log plus a JSON Lines journal of typed actions.
///
/// The text log is the source of truth for numbering. The journal sits next
/// to it and may cover only the most recent part of the log.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    journal_path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut journal = path.clone().into_os_string();
        journal.push(".journal");
        Self { path, journal_path: PathBuf::from(journal) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    /// Create the log and journal if missing.
    pub fn ensure_exists(&self) -> Result<(), FsError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| FsError::from_io(e, parent, "mkdir"))?;
        }
        for path in [&self.path, &self.journal_path] {
            if !path.exists() {
                info!(path = %path.display(), "creating history file");
                File::create(path).map_err(|e| FsError::from_io(e, path, "open"))?;
            }
        }
        Ok(())
    }

    /// Append a raw command line. Does nothing if the log does not exist.
    pub fn append(&self, command_line: &str) -> Result<(), FsError> {
        self.record(&Invocation::from_line(command_line))
    }

    /// Append an invocation to the log, and to the journal if it exists.
    pub fn record(&self, invocation: &Invocation) -> Result<(), FsError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "history log missing, not recording");
            return Ok(());
        }
        let line = invocation.line.replace(['\n', '\r'], " ");
        append_line(&self.path, &line)?;

        if self.journal_path.exists() {
            let json = serde_json::to_string(&Invocation { line, action: invocation.action.clone() })
                .map_err(|e| FsError::Io {
                    path: self.journal_path.display().to_string(),
                    operation: "write".to_string(),
                    source: e.into(),
                })?;
            append_line(&self.journal_path, &json)?;
        }
        Ok(())
    }

    /// Every logged command, numbered from 1.
    pub fn read_all(&self) -> Result<Vec<HistoryEntry>, FsError> {
        let Some(text) = read_if_exists(&self.path)? else {
            return Ok(Vec::new());
        };
        Ok(text
            .lines()
            .enumerate()
            .map(|(i, line)| HistoryEntry { number: i + 1, command: line.to_string() })
            .collect())
    }

    /// Every logged command with its undo action.
    ///
    /// Journal entries are matched against the tail of the log. Where they do
    /// not line up, the action is recovered from the text instead.
    pub fn read_records(&self) -> Result<Vec<HistoryRecord>, FsError> {
        let entries = self.read_all()?;
        let journal: Vec<Invocation> = match read_if_exists(&self.journal_path)? {
            Some(text) => text
                .lines()
                .enumerate()
                .filter_map(|(i, raw)| match serde_json::from_str(raw) {
                    Ok(invocation) => Some(invocation),
                    Err(err) => {
                        warn!(line = i + 1, error = %err, "skipping malformed journal line");
                        None
                    }
                })
                .collect(),
            None => Vec::new(),
        };

        let offset = entries.len().saturating_sub(journal.len());
        let skipped = journal.len().saturating_sub(entries.len());
        Ok(entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                let action = i
                    .checked_sub(offset)
                    .and_then(|j| journal.get(j + skipped))
                    .filter(|inv| inv.line == entry.command)
                    .map(|inv| inv.action.clone())
                    .unwrap_or_else(|| UndoAction::parse(&entry.command));
                HistoryRecord { entry, action }
            })
            .collect())
    }
}

fn append_line(path: &Path, line: &str) -> Result<(), FsError> {
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| FsError::from_io(e, path, "open"))?;
    writeln!(file, "{}", line).map_err(|e| FsError::from_io(e, path, "write"))
}

fn read_if_exists(path: &Path) -> Result<Option<String>, FsError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(FsError::from_io(e, path, "open")),
    }
}
