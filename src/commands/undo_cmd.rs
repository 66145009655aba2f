use clap::Parser;

use crate::commands::{parse_args, Command, CommandContext, CommandResult};
use crate::undo::undo;

#[derive(Parser, Debug)]
#[command(name = "undo", about = "Reverse the last copy or move")]
struct UndoArgs {}

pub struct UndoCommand;

impl Command for UndoCommand {
    fn name(&self) -> &'static str {
        "undo"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult {
        if let Err(result) = parse_args::<UndoArgs>(self.name(), &ctx.args) {
            return result;
        }
        match undo(ctx.history, &*ctx.ops) {
            Ok(outcome) => CommandResult::success(format!("{}\n", outcome)),
            Err(e) => CommandResult::error(format!("undo: {}\n", e)),
        }
    }
}
