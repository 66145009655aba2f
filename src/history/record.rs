// src/history/record.rs
//! What each history line did, in a form undo can act on.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::words::split_words;

/// The reversible effect of one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UndoAction {
    Copy {
        recursive: bool,
        sources: Vec<PathBuf>,
        dest: PathBuf,
        /// Paths the copy created. Empty when recovered from text.
        #[serde(default)]
        created: Vec<PathBuf>,
    },
    Move {
        source: PathBuf,
        dest: PathBuf,
    },
    Remove {
        recursive: bool,
        paths: Vec<PathBuf>,
    },
    /// Nothing to undo.
    Other,
}

fn is_recursive_flag(word: &str) -> bool {
    matches!(word, "-r" | "-R" | "--recursive")
}

impl UndoAction {
    /// Recover an action from a bare history line. Paths stay as typed.
    pub fn parse(line: &str) -> UndoAction {
        let Ok(words) = split_words(line) else {
            return UndoAction::Other;
        };
        let Some((verb, args)) = words.split_first() else {
            return UndoAction::Other;
        };

        match verb.as_str() {
            "mv" if args.len() >= 2 => UndoAction::Move {
                source: PathBuf::from(&args[args.len() - 2]),
                dest: PathBuf::from(&args[args.len() - 1]),
            },
            "cp" => {
                let recursive = args.iter().any(|a| is_recursive_flag(a));
                let mut operands: Vec<PathBuf> = args
                    .iter()
                    .filter(|a| !is_recursive_flag(a))
                    .map(PathBuf::from)
                    .collect();
                if operands.len() < 2 {
                    return UndoAction::Other;
                }
                let dest = operands.pop().unwrap_or_default();
                UndoAction::Copy { recursive, sources: operands, dest, created: Vec::new() }
            }
            "rm" => {
                let recursive = args.iter().any(|a| is_recursive_flag(a));
                let paths: Vec<PathBuf> = args
                    .iter()
                    .filter(|a| !is_recursive_flag(a))
                    .map(PathBuf::from)
                    .collect();
                if paths.is_empty() {
                    UndoAction::Other
                } else {
                    UndoAction::Remove { recursive, paths }
                }
            }
            _ => UndoAction::Other,
        }
    }

    /// Copy, move or remove.
    pub fn is_destructive(&self) -> bool {
        !matches!(self, UndoAction::Other)
    }
}

/// A command line together with what it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub line: String,
    pub action: UndoAction,
}

impl Invocation {
    /// Invocation whose action is recovered from the line itself.
    pub fn from_line(line: impl Into<String>) -> Self {
        let line = line.into();
        let action = UndoAction::parse(&line);
        Invocation { line, action }
    }

    /// Invocation with nothing to undo.
    pub fn plain(line: impl Into<String>) -> Self {
        Invocation { line: line.into(), action: UndoAction::Other }
    }
}
