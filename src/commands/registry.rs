// src/commands/registry.rs
use std::collections::HashMap;

use super::archive_cmd::{PackCommand, UnpackCommand};
use super::cat::CatCommand;
use super::cd_cmd::CdCommand;
use super::cp::CpCommand;
use super::grep::GrepCommand;
use super::history_cmd::HistoryCommand;
use super::ls::LsCommand;
use super::mv::MvCommand;
use super::rm::RmCommand;
use super::types::Command;
use super::undo_cmd::UndoCommand;
use crate::engine::ArchiveFormat;

pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self { commands: HashMap::new() }
    }

    pub fn register(&mut self, cmd: Box<dyn Command>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Register every file-management command.
pub fn register_all(registry: &mut CommandRegistry) {
    registry.register(Box::new(LsCommand));
    registry.register(Box::new(CdCommand));
    registry.register(Box::new(CatCommand));
    registry.register(Box::new(CpCommand));
    registry.register(Box::new(MvCommand));
    registry.register(Box::new(RmCommand));
    registry.register(Box::new(GrepCommand));
    registry.register(Box::new(PackCommand::new("tar", ArchiveFormat::GzipTar)));
    registry.register(Box::new(PackCommand::new("zip", ArchiveFormat::Zip)));
    registry.register(Box::new(UnpackCommand::new("untar", ArchiveFormat::GzipTar)));
    registry.register(Box::new(UnpackCommand::new("unzip", ArchiveFormat::Zip)));
    registry.register(Box::new(HistoryCommand));
    registry.register(Box::new(UndoCommand));
}

pub fn create_default_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    register_all(&mut registry);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_names() {
        let registry = create_default_registry();
        assert_eq!(
            registry.names(),
            vec!["cat", "cd", "cp", "grep", "history", "ls", "mv", "rm", "tar", "undo", "untar", "unzip", "zip"]
        );
        assert!(registry.get("unzip").is_some());
        assert!(!registry.contains("echo"));
    }
}
