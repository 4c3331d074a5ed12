//! Packet envelope: header plus exactly one body variant.

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::payloads::{
    Command, DeviceTransfer, ErrorResponse, Intro, RoomConfigRequest, RouterConfigRequest,
};

/// How the receiver should treat a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum PacketType {
    /// Informational; no reply expected
    Passive = 0,
    /// Sender may wait for a reply on the same connection
    Request = 1,
    /// Reply to an earlier request with the same id
    Response = 2,
}

/// Routing and correlation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Identity of the sender
    pub origin: String,

    /// Intended recipient; `None` (or empty) means "whoever receives it"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// Correlates requests with responses and suppresses flood loops
    pub id: String,

    /// Packet type
    #[serde(rename = "type")]
    pub kind: PacketType,

    /// Node identities this packet has traversed, oldest first. Only ever
    /// appended to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route: Vec<String>,
}

impl Header {
    /// Header for a packet that is not yet addressed to anyone in particular.
    pub fn new(origin: impl Into<String>, id: impl Into<String>, kind: PacketType) -> Self {
        Self { origin: origin.into(), destination: None, id: id.into(), kind, route: Vec::new() }
    }

    /// Address the packet to a specific node.
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Header answering `request`, sent by `origin`.
    pub fn response_to(request: &Self, origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: Some(request.origin.clone()),
            id: request.id.clone(),
            kind: PacketType::Response,
            route: Vec::new(),
        }
    }

    /// Destination, treating an empty string like `None`.
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref().filter(|d| !d.is_empty())
    }
}

/// Packet body. Exactly one variant is present on every packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Body {
    /// Setup announcement
    Intro(Intro),
    /// Router configuration request
    RouterConfigReq(RouterConfigRequest),
    /// Room configuration request
    RoomConfigReq(RoomConfigRequest),
    /// Device moved to another hub
    DeviceTransfer(DeviceTransfer),
    /// Device command
    Command(Command),
    /// Failure report
    ErrorResponse(ErrorResponse),
}

impl Body {
    /// Variant name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Intro(_) => "intro",
            Self::RouterConfigReq(_) => "router_config_req",
            Self::RoomConfigReq(_) => "room_config_req",
            Self::DeviceTransfer(_) => "device_transfer",
            Self::Command(_) => "command",
            Self::ErrorResponse(_) => "error_response",
        }
    }
}

/// Unit of protocol exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// Routing metadata
    pub header: Header,
    /// Payload
    pub body: Body,
}

impl Packet {
    /// Assemble a packet.
    pub fn new(header: Header, body: Body) -> Self {
        Self { header, body }
    }

    /// `ErrorResponse` answering `request`, sent by `origin`.
    pub fn error_response(request: &Header, origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            header: Header::response_to(request, origin),
            body: Body::ErrorResponse(ErrorResponse::new(message)),
        }
    }

    /// Error message if this packet is an `ErrorResponse`.
    pub fn error_message(&self) -> Option<&str> {
        match &self.body {
            Body::ErrorResponse(err) => Some(&err.message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_header_swaps_origin_and_keeps_id() {
        let request = Header::new("phone", "42", PacketType::Request).with_destination("hub-a");
        let response = Header::response_to(&request, "hub-a");

        assert_eq!(response.origin, "hub-a");
        assert_eq!(response.destination.as_deref(), Some("phone"));
        assert_eq!(response.id, "42");
        assert_eq!(response.kind, PacketType::Response);
        assert!(response.route.is_empty());
    }

    #[test]
    fn empty_destination_means_local() {
        let header = Header::new("phone", "1", PacketType::Request).with_destination("");
        assert_eq!(header.destination(), None);
    }

    #[test]
    fn error_message_only_for_error_body() {
        let header = Header::new("hub-a", "7", PacketType::Request);
        let err = Packet::error_response(&header, "hub-b", "nope");
        assert_eq!(err.error_message(), Some("nope"));

        let intro = Packet::new(header, Body::Intro(Intro { setup: true }));
        assert_eq!(intro.error_message(), None);
    }
}
