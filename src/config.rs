//! Configuration file support
//!
//! Loads `fsh.toml` from the starting directory, or the file named with
//! `--config`. Every key is optional.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::Level;

pub const DEFAULT_CONFIG_FILE: &str = "fsh.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown log level '{0}' (expected off, error, warn, info, debug or trace)")]
    LogLevel(String),
}

/// Shell configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// History log, relative to the starting directory unless absolute
    pub history_file: PathBuf,

    pub prompt: String,

    /// off, error, warn, info, debug or trace
    pub log_level: String,

    /// Where tracing output goes; stderr when unset
    pub log_file: Option<PathBuf>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            history_file: PathBuf::from(".fsh_history"),
            prompt: "$~ ".to_string(),
            log_level: "info".to_string(),
            log_file: Some(PathBuf::from(".fsh.log")),
        }
    }
}

impl ShellConfig {
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::parse(&text, path)
    }

    /// An explicit path must exist; otherwise `fsh.toml` in `cwd` is used
    /// when present, and defaults when not.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = cwd.join(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::load(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parsed log level; `None` turns logging off.
    pub fn level(&self) -> Result<Option<Level>, ConfigError> {
        match self.log_level.to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(None),
            other => other
                .parse::<Level>()
                .map(Some)
                .map_err(|_| ConfigError::LogLevel(self.log_level.clone())),
        }
    }
}
