//! Packet body payloads.
//!
//! One struct per [`crate::Body`] variant. String fields default to empty when
//! absent on the wire so that partially filled requests (e.g. a router
//! configuration that only changes the password) decode cleanly.

use serde::{Deserialize, Serialize};

/// Setup announcement.
///
/// Sent by freshly booted devices; a definer node never expects to receive
/// one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Intro {
    /// Whether the announcing node has completed setup
    #[serde(default)]
    pub setup: bool,
}

/// Router configuration request.
///
/// Empty fields are left unchanged on the receiving node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RouterConfigRequest {
    /// Network to join
    #[serde(default)]
    pub ssid: String,
    /// Network credential
    #[serde(default)]
    pub password: String,
    /// Node name used for routing
    #[serde(default)]
    pub name: String,
}

/// Room configuration request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoomConfigRequest {
    /// New room name; must not be empty
    #[serde(default)]
    pub name: String,
}

/// Announces that a device moved to another hub.
///
/// Every hub that still tracks the device drops it, then floods the packet on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceTransfer {
    /// Id of the transferred device
    #[serde(default)]
    pub device: String,
}

/// Capability descriptor used to match commands to devices.
///
/// An empty `modifier` on a command target is a wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DeviceType {
    /// Capability class, e.g. `light`
    pub core: String,
    /// Refinement, e.g. `ceiling`
    #[serde(default)]
    pub modifier: String,
}

impl DeviceType {
    /// Build a descriptor from core and modifier.
    pub fn new(core: impl Into<String>, modifier: impl Into<String>) -> Self {
        Self { core: core.into(), modifier: modifier.into() }
    }

    /// Descriptor that matches every modifier of `core`.
    pub fn any(core: impl Into<String>) -> Self {
        Self { core: core.into(), modifier: String::new() }
    }
}

/// Operation to execute on a device.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Execute {
    /// Operation name, e.g. `power`
    pub core: String,
    /// Operation arguments
    #[serde(default)]
    pub parameters: Vec<String>,
}

/// Device command
///
/// # Protocol Flow
///
/// 1. A hub resolves `device` against its local registry
/// 2. Every matching device receives the whole framed packet
/// 3. If nothing matches locally, the packet is flooded to all peers instead
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Command {
    /// Which devices should run the command
    pub device: DeviceType,
    /// What they should run
    pub execute: Execute,
}

/// Error reported back to the sender of a request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human readable failure description
    pub message: String,
}

impl ErrorResponse {
    /// Wrap a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
