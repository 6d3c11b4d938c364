//! Error taxonomy shared by every stage of the engine.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for TraceMind analysis.
#[derive(Error, Debug)]
pub enum TraceMindError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("parse failure: {0}")]
    ParseFailure(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("could not parse input as any recognized stack trace or log format")]
    UnrecognizedInput,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TraceMindError {
    /// Whether the orchestrator may recover from this error by downgrading
    /// or skipping, rather than failing the whole analysis.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ParseFailure(_) | Self::NotFound(_) | Self::Unsupported(_) | Self::Io { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TraceMindError>;
