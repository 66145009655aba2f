// src/commands/cat/mod.rs
use clap::Parser;

use crate::commands::{parse_args, quoted, Command, CommandContext, CommandResult};
use crate::fs::{FileContent, ReadMode};
use crate::history::Invocation;

#[derive(Parser, Debug)]
#[command(name = "cat", about = "Print a file")]
struct CatArgs {
    /// Read raw bytes and print them escaped
    #[arg(short = 'b', long = "bytes")]
    bytes: bool,

    file: String,
}

/// Printable form of binary content: ASCII as is, everything else `\xNN`.
fn escape_bytes(bytes: &[u8]) -> String {
    bytes.iter().flat_map(|&b| std::ascii::escape_default(b)).map(char::from).collect()
}

pub struct CatCommand;

impl Command for CatCommand {
    fn name(&self) -> &'static str {
        "cat"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult {
        let args: CatArgs = match parse_args(self.name(), &ctx.args) {
            Ok(args) => args,
            Err(result) => return result,
        };
        let (mode, flag) = if args.bytes { (ReadMode::Binary, " -b") } else { (ReadMode::Text, "") };
        let invocation = Invocation::plain(format!("cat{} {}", flag, quoted(&args.file)));

        match ctx.ops.cat(&args.file, mode) {
            Ok(FileContent::Text(mut text)) => {
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push('\n');
                }
                CommandResult::success(text)
            }
            Ok(FileContent::Binary(bytes)) => CommandResult::success(format!("{}\n", escape_bytes(&bytes))),
            Err(e) => CommandResult::error(format!("cat: {}\n", e)),
        }
        .recording(invocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::Fixture;
    use std::fs;

    #[test]
    fn test_cat_text() {
        let mut fx = Fixture::new();
        fs::write(fx.path("a.txt"), "line one\nline two").unwrap();
        let result = fx.run(&CatCommand, &["a.txt"]);
        assert_eq!(result.stdout, "line one\nline two\n");
    }

    #[test]
    fn test_cat_bytes_escapes() {
        let mut fx = Fixture::new();
        fs::write(fx.path("b.bin"), b"A\x00\xff").unwrap();
        let result = fx.run(&CatCommand, &["--bytes", "b.bin"]);
        assert_eq!(result.stdout, "A\\x00\\xff\n");
        assert_eq!(result.invocation.unwrap().line, "cat -b b.bin");
    }

    #[test]
    fn test_cat_directory() {
        let mut fx = Fixture::new();
        fs::create_dir(fx.path("d")).unwrap();
        let result = fx.run(&CatCommand, &["d"]);
        assert_eq!(result.exit_code, 1);
        assert!(result.stderr.starts_with("cat: EISDIR"));
    }

    #[test]
    fn test_cat_requires_file() {
        let mut fx = Fixture::new();
        let result = fx.run(&CatCommand, &[]);
        assert_eq!(result.exit_code, 2);
        assert!(result.invocation.is_none());
    }
}
