//! Command History
//!
//! A plain-text log of every command line, one per line, plus a JSON Lines
//! journal recording what each destructive command actually did so `undo`
//! can reverse it with absolute paths.

pub mod record;
pub mod store;
pub mod words;

pub use record::{Invocation, UndoAction};
pub use store::{HistoryEntry, HistoryRecord, HistoryStore};
pub use words::{join_words, quote_word, split_words, WordsError};
