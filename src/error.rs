//! Crate-wide error type.
//!
//! Nothing in the frame loop propagates these past a system boundary: systems
//! log the error with `bevy::log` and keep running.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavError {
    /// The building model could not be fetched or decoded.
    #[error("failed to load model '{path}': {reason}")]
    ModelLoad { path: String, reason: String },

    /// A selected destination label no longer resolves to a position.
    #[error("destination '{0}' is not available")]
    MissingTarget(String),

    /// A configuration file could not be parsed.
    #[error("invalid config in {file}: {reason}")]
    Config { file: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type NavResult<T> = Result<T, NavError>;
