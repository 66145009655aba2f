// src/commands/mv/mod.rs
use clap::Parser;

use crate::commands::{parse_args, quoted, Command, CommandContext, CommandResult};
use crate::history::{Invocation, UndoAction};

#[derive(Parser, Debug)]
#[command(name = "mv", about = "Move or rename a file or directory")]
struct MvArgs {
    source: String,
    dest: String,
}

pub struct MvCommand;

impl Command for MvCommand {
    fn name(&self) -> &'static str {
        "mv"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult {
        let args: MvArgs = match parse_args(self.name(), &ctx.args) {
            Ok(args) => args,
            Err(result) => return result,
        };
        let line = format!("mv {} {}", quoted(&args.source), quoted(&args.dest));
        let source = ctx.ops.resolve(&args.source);

        match ctx.ops.move_path(&args.source, &args.dest) {
            Ok(landed) => CommandResult::default().recording(Invocation {
                line,
                action: UndoAction::Move { source, dest: landed },
            }),
            Err(e) => CommandResult::error(format!("mv: {}\n", e)).recording(Invocation::plain(line)),
        }
    }
}
