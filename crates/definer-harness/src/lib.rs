//! Deterministic simulation harness for definer hubs.
//!
//! Turmoil-backed [`definer_core::Transport`] plus helpers that run a full
//! hub driver on a simulated host, so flood propagation and loop suppression
//! can be tested across a mesh without real sockets.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod sim_hub;
pub mod sim_transport;

pub use sim_hub::{SimHub, mesh};
pub use sim_transport::SimTransport;
