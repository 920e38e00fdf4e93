//! Error Types
//!
//! A single error enum shared by every step. Whether an error halts the run
//! is decided by the severity of the step that produced it, not by the
//! variant.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ProvisionError>;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read config '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Unsupported platform: expected {expected}, found {found}")]
    UnsupportedPlatform { expected: String, found: String },

    #[error("'{tool}' is not available. {guidance}")]
    MissingTool { tool: String, guidance: String },

    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: String },

    #[error("{0}")]
    Verification(String),

    #[error("No answer received (input closed)")]
    PromptClosed,

    #[error("Could not determine the home directory (HOME is not set)")]
    NoHomeDirectory,
}
