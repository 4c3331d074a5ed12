//! Error types for packet handling.

use definer_proto::ProtocolError;
use thiserror::Error;

/// Errors raised while handling a packet.
///
/// Runtimes convert these into an `ErrorResponse` on the connection the
/// request arrived on.
#[derive(Debug, Error)]
pub enum HandleError {
    /// Packet failed validation
    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    /// Packet id was already processed
    #[error("already received packet #{id}")]
    DuplicatePacket {
        /// Id of the repeated packet
        id: String,
    },

    /// Only router configuration is accepted before setup
    #[error("must configure router before sending additional packets")]
    NodeNotConfigured,

    /// Body variant is not valid as a request
    #[error("unrecognized packet type: {kind}")]
    UnrecognizedPacketType {
        /// Body variant name
        kind: &'static str,
    },

    /// Device declares a transport this hub cannot speak
    #[error("unsupported device stack: {stack}")]
    UnsupportedStack {
        /// Declared stack
        stack: String,
    },

    /// Delivery to a device failed
    #[error("device {device} unreachable: {reason}")]
    DeviceUnreachable {
        /// Device id
        device: String,
        /// Transport failure
        reason: String,
    },

    /// Delivery to a peer hub failed
    #[error("peer {peer} unreachable: {reason}")]
    PeerUnreachable {
        /// Peer identity
        peer: String,
        /// Transport failure
        reason: String,
    },

    /// Configuration request was rejected
    #[error("invalid {what} configuration: {reason}")]
    ConfigurationInvalid {
        /// Which record was being configured (`router`, `room`)
        what: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// Link initialization failed after a router configuration
    #[error("link initialization failed: {0}")]
    LinkFailed(String),

    /// Frame codec error
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl HandleError {
    /// Whether this error reports a repeated packet.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicatePacket { .. })
    }
}
