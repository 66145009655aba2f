use clap::Parser;

use crate::commands::{parse_args, Command, CommandContext, CommandResult};

#[derive(Parser, Debug)]
#[command(name = "history", about = "Show the command history")]
struct HistoryArgs {}

pub struct HistoryCommand;

impl Command for HistoryCommand {
    fn name(&self) -> &'static str {
        "history"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult {
        if let Err(result) = parse_args::<HistoryArgs>(self.name(), &ctx.args) {
            return result;
        }
        match ctx.history.read_all() {
            Ok(entries) => CommandResult::success(
                entries
                    .iter()
                    .map(|e| format!("{}: {}\n", e.number, e.command))
                    .collect(),
            ),
            Err(e) => CommandResult::error(format!("history: {}\n", e)),
        }
    }
}
