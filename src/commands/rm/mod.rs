// src/commands/rm/mod.rs
use clap::Parser;

use crate::commands::{parse_args, quoted, Command, CommandContext, CommandResult};
use crate::history::{Invocation, UndoAction};

#[derive(Parser, Debug)]
#[command(name = "rm", about = "Remove files or directories")]
struct RmArgs {
    /// Remove directories and their contents
    #[arg(short = 'r', short_alias = 'R', long = "recursive")]
    recursive: bool,

    #[arg(required = true)]
    paths: Vec<String>,
}

pub struct RmCommand;

impl Command for RmCommand {
    fn name(&self) -> &'static str {
        "rm"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult {
        let args: RmArgs = match parse_args(self.name(), &ctx.args) {
            Ok(args) => args,
            Err(result) => return result,
        };
        let mut line = vec!["rm".to_string()];
        if args.recursive {
            line.push("-r".to_string());
        }
        line.extend(args.paths.iter().map(quoted));
        let line = line.join(" ");

        let mut stderr = String::new();
        let mut removed = Vec::new();
        for path in &args.paths {
            match ctx.ops.remove(args.recursive, path) {
                Ok(()) => removed.push(ctx.ops.resolve(path)),
                Err(e) => stderr.push_str(&format!("rm: {}\n", e)),
            }
        }

        let invocation = if removed.is_empty() {
            Invocation::plain(line)
        } else {
            Invocation { line, action: UndoAction::Remove { recursive: args.recursive, paths: removed } }
        };
        let exit_code = if stderr.is_empty() { 0 } else { 1 };
        CommandResult::with_exit_code(String::new(), stderr, exit_code).recording(invocation)
    }
}
