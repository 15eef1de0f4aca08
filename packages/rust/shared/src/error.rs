//! Error types for newswire.
//!
//! Library crates use [`NewswireError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Per-descriptor fetch failures are *not* errors: the fetcher absorbs them
//! into `FetchOutcome::Failed` by policy. Only configuration, staging, and
//! load problems surface here.

use std::path::PathBuf;

/// Top-level error type for all newswire operations.
#[derive(Debug, thiserror::Error)]
pub enum NewswireError {
    /// Configuration loading or resolution error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Boundary validation error (bad dates, missing destination, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Search API client construction error. Per-descriptor request
    /// failures never reach this type.
    #[error("search error: {0}")]
    Search(String),

    /// Object-storage write/read error. Fatal for the invocation.
    #[error("staging error: {0}")]
    Staging(String),

    /// Document-database connection or bulk-insert error. Fatal for the
    /// whole batch.
    #[error("load error: {0}")]
    Load(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NewswireError>;

impl NewswireError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
