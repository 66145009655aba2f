//! Interactive Session
//!
//! Reads command lines, dispatches them through the registry and records
//! every recognized command in history, whether it succeeded or not.

use std::io::{self, BufRead, Write};

use tracing::{debug, warn};

use crate::commands::{create_default_registry, CommandContext, CommandRegistry};
use crate::engine::FileOps;
use crate::history::{split_words, HistoryStore, Invocation};

/// Exit status for a verb nobody registered.
pub const NOT_FOUND_STATUS: i32 = 127;
/// Exit status for a line that could not be tokenized.
pub const USAGE_STATUS: i32 = 2;

pub struct Shell {
    ops: FileOps,
    history: HistoryStore,
    registry: CommandRegistry,
}

impl Shell {
    pub fn new(ops: FileOps, history: HistoryStore) -> Self {
        Self::with_registry(ops, history, create_default_registry())
    }

    pub fn with_registry(ops: FileOps, history: HistoryStore, registry: CommandRegistry) -> Self {
        Self { ops, history, registry }
    }

    pub fn ops(&self) -> &FileOps {
        &self.ops
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Run one command line and return its exit status.
    pub fn run_line(&mut self, line: &str, stdout: &mut dyn Write, stderr: &mut dyn Write) -> io::Result<i32> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(0);
        }

        let words = match split_words(line) {
            Ok(words) => words,
            Err(e) => {
                writeln!(stderr, "fsh: {}", e)?;
                self.record(&Invocation::plain(line), stderr)?;
                return Ok(USAGE_STATUS);
            }
        };
        let Some((verb, args)) = words.split_first() else {
            return Ok(0);
        };

        if verb == "help" {
            writeln!(stdout, "commands: {}", self.registry.names().join(", "))?;
            writeln!(stdout, "run `<command> --help` for usage; `exit` leaves")?;
            return Ok(0);
        }

        let Some(command) = self.registry.get(verb) else {
            writeln!(stderr, "fsh: {}: command not found", verb)?;
            return Ok(NOT_FOUND_STATUS);
        };

        debug!(verb = %verb, args = args.len(), "dispatching");
        let mut ctx = CommandContext { args: args.to_vec(), ops: &mut self.ops, history: &self.history };
        let result = command.execute(&mut ctx);
        stdout.write_all(result.stdout.as_bytes())?;
        stderr.write_all(result.stderr.as_bytes())?;

        let invocation = result.invocation.unwrap_or_else(|| Invocation::plain(line));
        self.record(&invocation, stderr)?;
        Ok(result.exit_code)
    }

    fn record(&self, invocation: &Invocation, stderr: &mut dyn Write) -> io::Result<()> {
        if let Err(e) = self.history.record(invocation) {
            warn!(error = %e, "failed to record history");
            writeln!(stderr, "fsh: history: {}", e)?;
        }
        Ok(())
    }

    /// Read-eval loop until EOF, `exit` or `quit`. Returns the last status.
    pub fn run<R: BufRead>(
        &mut self,
        input: R,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        prompt: &str,
    ) -> io::Result<i32> {
        let mut status = 0;
        let mut lines = input.lines();
        loop {
            write!(stdout, "{}", prompt)?;
            stdout.flush()?;
            let Some(line) = lines.next().transpose()? else {
                writeln!(stdout)?;
                break;
            };
            if matches!(line.trim(), "exit" | "quit") {
                break;
            }
            status = self.run_line(&line, stdout, stderr)?;
        }
        Ok(status)
    }
}
