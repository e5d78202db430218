//! CLI error types.

use geodrill::DrillDownError;
use thiserror::Error;

/// Errors surfaced to the terminal user.
#[derive(Debug, Error)]
pub enum CliError {
    /// A drill-down operation failed (fetch or render).
    #[error("{0}")]
    Drill(#[from] DrillDownError),

    /// A fixture file was missing or malformed.
    #[error("fixture error: {0}")]
    Fixture(String),

    /// Invalid configuration supplied on the command line.
    #[error("configuration error: {0}")]
    Config(String),

    /// Reading from stdin or the filesystem failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing or parsing JSON failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
