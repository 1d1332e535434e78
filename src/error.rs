use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::HookKind;

#[derive(Debug, Error)]
pub enum BackuprollError {
    #[error("{0}")]
    Message(String),
    #[error("{0}")]
    Hook(HookFailure),
    #[error("{0}")]
    Format(FormatError),
    #[error("{0}")]
    Config(ConfigError),
    #[error("lock {0}")]
    Lock(String),
    #[error("{context} {}: {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0}")]
    IoOther(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parse config: {0}")]
    Parse(String),
    #[error("{0}")]
    Invalid(String),
}

/// A name that does not decode under the configured date format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name:?} does not match date format {format:?}")]
pub struct FormatError {
    pub name: String,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    Exit(i32),
    Spawn(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} command `{command}` {outcome}")]
pub struct HookFailure {
    pub kind: HookKind,
    pub command: String,
    pub outcome: HookOutcome,
}

impl fmt::Display for HookOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookOutcome::Exit(code) => write!(f, "exited with code {}", code),
            HookOutcome::Spawn(err) => write!(f, "could not run: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, BackuprollError>;

impl BackuprollError {
    pub fn message(msg: impl Into<String>) -> Self {
        BackuprollError::Message(msg.into())
    }

    pub fn io(context: &'static str, path: &Path, source: io::Error) -> Self {
        BackuprollError::Io {
            context,
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<HookFailure> for BackuprollError {
    fn from(err: HookFailure) -> Self {
        BackuprollError::Hook(err)
    }
}

impl From<FormatError> for BackuprollError {
    fn from(err: FormatError) -> Self {
        BackuprollError::Format(err)
    }
}

impl From<ConfigError> for BackuprollError {
    fn from(err: ConfigError) -> Self {
        BackuprollError::Config(err)
    }
}
