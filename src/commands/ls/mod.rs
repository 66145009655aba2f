// src/commands/ls/mod.rs
use clap::Parser;

use crate::commands::{parse_args, quoted, Command, CommandContext, CommandResult};
use crate::history::Invocation;

#[derive(Parser, Debug)]
#[command(name = "ls", about = "List directory contents")]
struct LsArgs {
    /// Long listing: mode, links, owner, group, size, mtime, name
    #[arg(short = 'l', long = "long")]
    long: bool,

    /// Include entries starting with '.'
    #[arg(short = 'a', long = "all")]
    all: bool,

    #[arg(default_value = ".")]
    paths: Vec<String>,
}

impl LsArgs {
    fn canonical(&self) -> String {
        let mut words = vec!["ls".to_string()];
        if self.long {
            words.push("-l".to_string());
        }
        if self.all {
            words.push("-a".to_string());
        }
        words.extend(self.paths.iter().map(quoted));
        words.join(" ")
    }
}

pub struct LsCommand;

impl Command for LsCommand {
    fn name(&self) -> &'static str {
        "ls"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult {
        let args: LsArgs = match parse_args(self.name(), &ctx.args) {
            Ok(args) => args,
            Err(result) => return result,
        };

        let mut stdout = String::new();
        let mut stderr = String::new();
        for path in &args.paths {
            match ctx.ops.list(path, args.all, args.long) {
                Ok(lines) => {
                    stdout.push_str(&format!("{}: \n", path));
                    for line in lines {
                        stdout.push_str(&line);
                        stdout.push('\n');
                    }
                }
                Err(e) => stderr.push_str(&format!("ls: {}\n", e)),
            }
        }

        let exit_code = if stderr.is_empty() { 0 } else { 1 };
        CommandResult::with_exit_code(stdout, stderr, exit_code).recording(Invocation::plain(args.canonical()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::Fixture;
    use std::fs;

    #[test]
    fn test_ls_hides_dotfiles_by_default() {
        let mut fx = Fixture::new();
        fs::write(fx.path("visible.txt"), "").unwrap();
        fs::write(fx.path(".hidden"), "").unwrap();

        let result = fx.run(&LsCommand, &[]);
        assert_eq!(result.exit_code, 0);
        assert!(result.stdout.starts_with(".: \n"));
        assert!(result.stdout.contains("visible.txt"));
        assert!(!result.stdout.contains(".hidden"));

        let result = fx.run(&LsCommand, &["-a"]);
        assert!(result.stdout.contains(".hidden"));
    }

    #[test]
    fn test_ls_long_form_line() {
        let mut fx = Fixture::new();
        fs::create_dir(fx.path("box")).unwrap();
        fs::write(fx.path("box/data.bin"), "12345").unwrap();

        let result = fx.run(&LsCommand, &["-l", "box"]);
        let line = result.stdout.lines().nth(1).unwrap();
        assert!(line.starts_with("-rw"));
        assert!(line.ends_with(" data.bin"));
        assert!(line.contains(" 5 "));
    }

    #[test]
    fn test_ls_missing_path_reports_error() {
        let mut fx = Fixture::new();
        let result = fx.run(&LsCommand, &["--all", "nope", "."]);
        assert_eq!(result.exit_code, 1);
        assert!(result.stderr.starts_with("ls: ENOENT"));
        assert!(result.stdout.starts_with(".: \n"));
        assert_eq!(result.invocation.unwrap().line, "ls -a nope .");
    }
}
