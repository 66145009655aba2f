// src/commands/types.rs
use clap::Parser;

use crate::engine::FileOps;
use crate::history::{HistoryStore, Invocation};

/// Result of running one command
#[derive(Debug, Clone, Default)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    /// What to record in history. `None` records the line as typed.
    pub invocation: Option<Invocation>,
}

impl CommandResult {
    pub fn success(stdout: String) -> Self {
        Self { stdout, ..Self::default() }
    }

    pub fn error(stderr: String) -> Self {
        Self { stderr, exit_code: 1, ..Self::default() }
    }

    pub fn with_exit_code(stdout: String, stderr: String, exit_code: i32) -> Self {
        Self { stdout, stderr, exit_code, invocation: None }
    }

    pub fn recording(mut self, invocation: Invocation) -> Self {
        self.invocation = Some(invocation);
        self
    }
}

/// Everything a command may touch while it runs
pub struct CommandContext<'a> {
    /// Arguments after the command name
    pub args: Vec<String>,
    pub ops: &'a mut FileOps,
    pub history: &'a HistoryStore,
}

pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult;
}

/// Parse `args` with clap as if typed after `name`.
///
/// `--help` comes back as a successful result carrying the help text, usage
/// errors as exit code 2.
pub fn parse_args<T: Parser>(name: &str, args: &[String]) -> Result<T, CommandResult> {
    let argv = std::iter::once(name.to_string()).chain(args.iter().cloned());
    T::try_parse_from(argv).map_err(|err| {
        let text = err.to_string();
        if err.use_stderr() {
            CommandResult::with_exit_code(String::new(), text, 2)
        } else {
            CommandResult::success(text)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Parser, Debug)]
    struct Demo {
        #[arg(short = 'r')]
        recursive: bool,
        paths: Vec<String>,
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args_ok() {
        let demo: Demo = parse_args("demo", &args(&["-r", "a", "b"])).unwrap();
        assert!(demo.recursive);
        assert_eq!(demo.paths, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_args_help_and_errors() {
        let help = parse_args::<Demo>("demo", &args(&["--help"])).unwrap_err();
        assert_eq!(help.exit_code, 0);
        assert!(help.stdout.contains("Usage"));

        let bad = parse_args::<Demo>("demo", &args(&["--nope"])).unwrap_err();
        assert_eq!(bad.exit_code, 2);
        assert!(!bad.stderr.is_empty());
    }
}
