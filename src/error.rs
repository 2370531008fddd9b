//! Error types for launching the test binary and tallying its output.

use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a tally run.
///
/// None of these are recovered from; they surface to the engineer running
/// the tool.
#[derive(Debug, Error)]
pub enum TallyError {
    /// The test executable is missing or could not be started.
    #[error("failed to launch {}: {source}", .program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading the child's output or waiting on it failed.
    #[error("failed to capture test output: {0}")]
    Capture(#[from] std::io::Error),

    /// Captured output was not valid UTF-8.
    #[error("test output is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    /// A rejected resource descriptor was not valid JSON.
    #[error("failed to parse resource descriptor {descriptor}: {source}")]
    Parse {
        descriptor: String,
        #[source]
        source: serde_json::Error,
    },

    /// A rejected resource descriptor has no "Format" field.
    #[error("resource descriptor has no \"Format\" field: {descriptor}")]
    MissingFormat { descriptor: String },
}

pub type Result<T> = std::result::Result<T, TallyError>;
