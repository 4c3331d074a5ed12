//! Wire format for the definer hub protocol.
//!
//! A frame is a 2-byte big-endian length followed by exactly that many bytes
//! of CBOR-encoded [`Packet`]. Each packet is a [`Header`] (origin,
//! destination, correlation id, type and the route it has travelled) plus
//! exactly one [`Body`] variant.
//!
//! The length prefix caps a payload at 65535 bytes. Encoding a larger packet
//! is a hard error rather than a silent truncation, and decoding a frame whose
//! declared length exceeds the available bytes fails with
//! [`ProtocolError::TruncatedFrame`] instead of reading out of bounds.
//!
//! # Security
//!
//! Payloads are decoded through `serde`; an absent or unknown body variant is
//! rejected at decode time so that no code path ever sees an empty packet.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod frame;
pub mod packet;
pub mod payloads;

pub use errors::{ProtocolError, Result};
pub use frame::{MAX_PAYLOAD_SIZE, decode, encode, read_frame, write_frame};
pub use packet::{Body, Header, Packet, PacketType};
pub use payloads::{
    Command, DeviceTransfer, DeviceType, ErrorResponse, Execute, Intro, RoomConfigRequest,
    RouterConfigRequest,
};
