use clap::Parser;

use crate::commands::{parse_args, quoted, Command, CommandContext, CommandResult};
use crate::history::Invocation;

#[derive(Parser, Debug)]
#[command(name = "cd", about = "Change the working directory")]
struct CdArgs {
    #[arg(default_value = "~")]
    path: String,
}

pub struct CdCommand;

impl Command for CdCommand {
    fn name(&self) -> &'static str {
        "cd"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult {
        let args: CdArgs = match parse_args(self.name(), &ctx.args) {
            Ok(args) => args,
            Err(result) => return result,
        };
        // a leading ~ must stay bare so it still expands when replayed
        let shown = if args.path.starts_with('~') && !args.path.contains(char::is_whitespace) {
            args.path.clone()
        } else {
            quoted(&args.path)
        };
        let invocation = Invocation::plain(format!("cd {}", shown));

        match ctx.ops.change_directory(&args.path) {
            Ok(()) => CommandResult::default(),
            Err(e) => CommandResult::error(format!("cd: {}\n", e)),
        }
        .recording(invocation)
    }
}
