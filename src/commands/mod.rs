// src/commands/mod.rs
pub mod archive_cmd;
pub mod cat;
pub mod cd_cmd;
pub mod cp;
pub mod grep;
pub mod history_cmd;
pub mod ls;
pub mod mv;
pub mod registry;
pub mod rm;
pub mod types;
pub mod undo_cmd;

pub use registry::{create_default_registry, CommandRegistry};
pub use types::{parse_args, Command, CommandContext, CommandResult};

use std::path::Path;

use crate::history::quote_word;

/// Shell-quoted form of a path for a canonical history line.
pub(crate) fn quoted(path: impl AsRef<Path>) -> String {
    quote_word(&path.as_ref().to_string_lossy())
}
