// src/commands/cp/mod.rs
use clap::Parser;

use crate::commands::{parse_args, quoted, Command, CommandContext, CommandResult};
use crate::history::{Invocation, UndoAction};

#[derive(Parser, Debug)]
#[command(name = "cp", about = "Copy files and directories")]
struct CpArgs {
    /// Copy directories and their contents
    #[arg(short = 'r', short_alias = 'R', long = "recursive")]
    recursive: bool,

    /// SOURCE... DEST
    #[arg(num_args = 2.., required = true)]
    paths: Vec<String>,
}

pub struct CpCommand;

impl Command for CpCommand {
    fn name(&self) -> &'static str {
        "cp"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult {
        let mut args: CpArgs = match parse_args(self.name(), &ctx.args) {
            Ok(args) => args,
            Err(result) => return result,
        };
        let dest = args.paths.pop().unwrap_or_default();
        let sources = args.paths;

        let mut line = vec!["cp".to_string()];
        if args.recursive {
            line.push("-r".to_string());
        }
        line.extend(sources.iter().chain(std::iter::once(&dest)).map(quoted));
        let line = line.join(" ");

        let mut stderr = String::new();
        let mut created = Vec::new();
        for source in &sources {
            match ctx.ops.copy(args.recursive, source, &dest) {
                Ok(path) => created.push(path),
                Err(e) => stderr.push_str(&format!("cp: {}\n", e)),
            }
        }

        let invocation = if created.is_empty() {
            Invocation::plain(line)
        } else {
            Invocation {
                line,
                action: UndoAction::Copy {
                    recursive: args.recursive,
                    sources: sources.iter().map(|s| ctx.ops.resolve(s)).collect(),
                    dest: ctx.ops.resolve(&dest),
                    created,
                },
            }
        };
        let exit_code = if stderr.is_empty() { 0 } else { 1 };
        CommandResult::with_exit_code(String::new(), stderr, exit_code).recording(invocation)
    }
}
