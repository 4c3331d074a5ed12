//! Server error types.

use definer_core::StoreError;
use thiserror::Error;

/// Fatal runtime errors.
///
/// Per-packet failures never reach this type; they are answered with an
/// `ErrorResponse` on the connection they arrived on.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Listening socket could not be opened
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested listen address
        addr: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Persisted state could not be loaded or saved
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Local hostname is unavailable for the default identity
    #[error("cannot determine local hostname: {0}")]
    Hostname(String),

    /// Other I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
