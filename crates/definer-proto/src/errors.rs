//! Protocol error types.

use thiserror::Error;

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while framing or parsing packets.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Serialized payload does not fit the 2-byte length prefix
    #[error("frame payload too large: {size} bytes (max {max})")]
    FrameTooLarge {
        /// Serialized payload size
        size: usize,
        /// Largest encodable payload
        max: usize,
    },

    /// Fewer bytes were available than the frame declared
    #[error("truncated frame: expected {expected} bytes, got {available}")]
    TruncatedFrame {
        /// Bytes the frame (or its length prefix) requires
        expected: usize,
        /// Bytes actually available
        available: usize,
    },

    /// Payload bytes are not a valid packet (bad CBOR, missing or unknown
    /// body, etc.)
    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    /// CBOR serialization failed
    #[error("CBOR encoding failed: {0}")]
    CborEncode(String),

    /// Underlying stream failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
