//! Sibling hubs.
//!
//! Peers are the flood broadcast fan-out set. They are loaded from persisted
//! state and extended by reload; the protocol never adds or removes them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::node::DEFAULT_PORT;

/// A remote hub reachable over the mesh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Network hostname, dialed for broadcast
    pub hostname: String,
    /// Routing identity, falls back to the hostname when empty
    #[serde(default)]
    pub name: String,
    /// Listening port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Peer {
    /// Peer listening on `hostname:port`.
    pub fn new(hostname: impl Into<String>, name: impl Into<String>, port: u16) -> Self {
        Self { hostname: hostname.into(), name: name.into(), port }
    }

    /// Identity used for routing and registry keys.
    pub fn identity(&self) -> &str {
        if self.name.is_empty() { &self.hostname } else { &self.name }
    }

    /// `hostname:port` for dialing.
    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

/// Known sibling hubs, keyed by identity.
#[derive(Debug, Clone, Default)]
pub struct PeerRegistry {
    peers: BTreeMap<String, Peer>,
}

impl PeerRegistry {
    /// Registry holding `peers`.
    pub fn from_peers(peers: impl IntoIterator<Item = Peer>) -> Self {
        Self { peers: peers.into_iter().map(|p| (p.identity().to_string(), p)).collect() }
    }

    /// Register a peer, returning the one it replaced.
    pub fn insert(&mut self, peer: Peer) -> Option<Peer> {
        self.peers.insert(peer.identity().to_string(), peer)
    }

    /// Whether a peer with `identity` is known.
    pub fn contains(&self, identity: &str) -> bool {
        self.peers.contains_key(identity)
    }

    /// Number of peers.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether no peers are known.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Owned copy of every peer, in identity order.
    pub fn to_vec(&self) -> Vec<Peer> {
        self.peers.values().cloned().collect()
    }
}
