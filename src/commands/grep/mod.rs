// src/commands/grep/mod.rs
use clap::Parser;

use crate::commands::{parse_args, quoted, Command, CommandContext, CommandResult};
use crate::history::{quote_word, Invocation};

#[derive(Parser, Debug)]
#[command(name = "grep", about = "Print lines matching a regular expression")]
struct GrepArgs {
    /// Search directories recursively
    #[arg(short = 'r', short_alias = 'R', long = "recursive")]
    recursive: bool,

    #[arg(short = 'i', long = "ignore-case")]
    ignore_case: bool,

    #[arg(allow_hyphen_values = true)]
    pattern: String,

    #[arg(default_value = ".")]
    files: Vec<String>,
}

impl GrepArgs {
    fn canonical(&self) -> String {
        let mut words = vec!["grep".to_string()];
        if self.recursive {
            words.push("-r".to_string());
        }
        if self.ignore_case {
            words.push("-i".to_string());
        }
        if self.pattern.starts_with('-') {
            words.push("--".to_string());
        }
        words.push(quote_word(&self.pattern));
        words.extend(self.files.iter().map(quoted));
        words.join(" ")
    }
}

pub struct GrepCommand;

impl Command for GrepCommand {
    fn name(&self) -> &'static str {
        "grep"
    }

    /// Exit status: 0 when something matched, 1 when nothing did, 2 on error.
    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult {
        let args: GrepArgs = match parse_args(self.name(), &ctx.args) {
            Ok(args) => args,
            Err(result) => return result,
        };
        let invocation = Invocation::plain(args.canonical());

        let results = match ctx.ops.search(args.recursive, args.ignore_case, &args.pattern, args.files.as_slice()) {
            Ok(results) => results,
            Err(e) => {
                return CommandResult::with_exit_code(String::new(), format!("grep: {}\n", e), 2)
                    .recording(invocation)
            }
        };

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut matched = false;
        for item in results {
            match item {
                Ok(found) => {
                    matched = true;
                    stdout.push_str(&found.to_string());
                    stdout.push('\n');
                }
                Err(e) => stderr.push_str(&format!("grep: {}\n", e)),
            }
        }

        let exit_code = match (stderr.is_empty(), matched) {
            (false, _) => 2,
            (true, true) => 0,
            (true, false) => 1,
        };
        CommandResult::with_exit_code(stdout, stderr, exit_code).recording(invocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::Fixture;
    use std::fs;

    #[test]
    fn test_grep_prints_name_and_line() {
        let mut fx = Fixture::new();
        fs::write(fx.path("f.txt"), "ABCDEF\nnope\n").unwrap();

        let result = fx.run(&GrepCommand, &["-i", "abc", "f.txt"]);
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, "f.txt: 1:ABCDEF\n");
    }

    #[test]
    fn test_grep_exit_codes() {
        let mut fx = Fixture::new();
        fs::write(fx.path("f.txt"), "abc\n").unwrap();

        assert_eq!(fx.run(&GrepCommand, &["zzz", "f.txt"]).exit_code, 1);
        assert_eq!(fx.run(&GrepCommand, &["(", "f.txt"]).exit_code, 2);
        assert_eq!(fx.run(&GrepCommand, &["abc", "missing.txt"]).exit_code, 2);
    }

    #[test]
    fn test_grep_hyphen_pattern() {
        let mut fx = Fixture::new();
        fs::write(fx.path("f.txt"), "a -> b\n").unwrap();

        let result = fx.run(&GrepCommand, &["-r", "->", "f.txt"]);
        assert_eq!(result.stdout, "f.txt: 1:a -> b\n");
        assert_eq!(result.invocation.unwrap().line, "grep -r -- '->' f.txt");
    }
}
