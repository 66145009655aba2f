//! File System Module
//!
//! Filesystem abstraction the command engine runs on:
//! - `FileSystem`: the trait, with the error taxonomy every command reports
//! - `OsFs`: the host filesystem

pub mod os_fs;
pub mod path;
pub mod types;

pub use os_fs::OsFs;
pub use path::{normalize_path, resolve_path};
pub use types::*;
