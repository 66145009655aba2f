use clap::Parser;

use crate::commands::{parse_args, quoted, Command, CommandContext, CommandResult};
use crate::engine::ArchiveFormat;
use crate::history::Invocation;

#[derive(Parser, Debug)]
struct PackArgs {
    /// Directory to archive
    folder: String,
    /// Archive name; the format's extension is added if missing
    name: String,
}

#[derive(Parser, Debug)]
struct UnpackArgs {
    archive: String,
    /// Existing directory to extract into
    #[arg(default_value = ".")]
    dest: String,
}

/// `tar` / `zip`: archive a directory.
pub struct PackCommand {
    name: &'static str,
    format: ArchiveFormat,
}

impl PackCommand {
    pub fn new(name: &'static str, format: ArchiveFormat) -> Self {
        Self { name, format }
    }
}

impl Command for PackCommand {
    fn name(&self) -> &'static str {
        self.name
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult {
        let args: PackArgs = match parse_args(self.name, &ctx.args) {
            Ok(args) => args,
            Err(result) => return result,
        };
        let invocation = Invocation::plain(format!("{} {} {}", self.name, quoted(&args.folder), quoted(&args.name)));

        match ctx.ops.pack(&args.folder, &args.name, self.format) {
            Ok(archive) => CommandResult::success(format!("{}\n", archive.display())),
            Err(e) => CommandResult::error(format!("{}: {}\n", self.name, e)),
        }
        .recording(invocation)
    }
}

/// `untar` / `unzip`: extract an archive.
pub struct UnpackCommand {
    name: &'static str,
    format: ArchiveFormat,
}

impl UnpackCommand {
    pub fn new(name: &'static str, format: ArchiveFormat) -> Self {
        Self { name, format }
    }
}

impl Command for UnpackCommand {
    fn name(&self) -> &'static str {
        self.name
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult {
        let args: UnpackArgs = match parse_args(self.name, &ctx.args) {
            Ok(args) => args,
            Err(result) => return result,
        };
        let invocation = Invocation::plain(format!("{} {} {}", self.name, quoted(&args.archive), quoted(&args.dest)));

        match ctx.ops.unpack(&args.archive, &args.dest, self.format) {
            Ok(count) => CommandResult::success(format!("extracted {} entries\n", count)),
            Err(e) => CommandResult::error(format!("{}: {}\n", self.name, e)),
        }
        .recording(invocation)
    }
}
