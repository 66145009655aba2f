//! fsh - a file-management shell
//!
//! A handful of POSIX-style file commands (`ls`, `cd`, `cp`, `mv`, `rm`,
//! `cat`, `grep`, `tar`/`zip` and their unpacking counterparts) run against
//! the native filesystem, with a persistent history and `undo` for the last
//! copy or move.

pub mod commands;
pub mod config;
pub mod engine;
pub mod fs;
pub mod history;
pub mod shell;
pub mod undo;

pub use engine::FileOps;
pub use fs::FsError;
pub use history::HistoryStore;
pub use shell::Shell;
