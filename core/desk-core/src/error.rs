//! Error types for desk-core operations.
//!
//! Only [`DeskError::InvalidTransition`] is meant to be branched on by
//! callers (the UI reverts its status selector). Store failures are treated
//! as a single "persistence unavailable" class: recovery falls back to a
//! fresh day state and flushes defer to the next tick, so these errors are
//! logged rather than surfaced.

use std::path::PathBuf;

/// All errors that can occur in desk-core operations.
#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    /// Attempt to enter `break` when the daily budget is exhausted.
    /// The caller must keep the prior status selected.
    #[error("break budget exhausted: {used:.2} of {limit:.2} minutes already used")]
    InvalidTransition { used: f64, limit: f64 },

    /// The snapshot store rejected a read or write for a non-I/O reason
    /// (remote backend down, document missing permissions, ...).
    #[error("snapshot store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("I/O error: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using DeskError.
pub type Result<T> = std::result::Result<T, DeskError>;
