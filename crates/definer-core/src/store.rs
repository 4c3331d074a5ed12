//! Persistence collaborator.
//!
//! The hub loads its router, room, devices and peers once at startup and saves
//! them again at shutdown. [`MemoryStore`] backs tests; the server crate
//! provides a file-backed store.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    device::Device,
    node::{Room, Router},
    peer::Peer,
};

/// Everything a hub persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Local router record
    pub router: Router,
    /// Local room
    #[serde(default)]
    pub room: Room,
    /// Attached devices
    #[serde(default)]
    pub devices: Vec<Device>,
    /// Sibling hubs
    #[serde(default)]
    pub peers: Vec<Peer>,
}

impl Snapshot {
    /// Fresh state for `router`: empty room, no devices, no peers.
    pub fn new(router: Router) -> Self {
        Self { router, room: Room::default(), devices: Vec::new(), peers: Vec::new() }
    }
}

/// Persistence failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failed
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted state exists but cannot be parsed
    #[error("persisted state is corrupt: {0}")]
    Corrupt(String),

    /// State could not be serialized
    #[error("failed to encode state: {0}")]
    Encode(String),
}

/// Load and save hub state.
pub trait Store: Send + Sync {
    /// Read persisted state. `Ok(None)` when nothing was ever saved.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if state exists but cannot be read.
    fn load(&self) -> Result<Option<Snapshot>, StoreError>;

    /// Persist `snapshot`, replacing any previous state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the state cannot be written.
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<Snapshot>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with `snapshot`.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self { snapshot: Mutex::new(Some(snapshot)) }
    }
}

impl Store for MemoryStore {
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        Ok(self.snapshot.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_loads_none() {
        assert!(MemoryStore::new().load().unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let store = MemoryStore::new();
        let mut snapshot = Snapshot::new(Router::new("hub-a.local"));
        snapshot.room.name = "kitchen".into();
        snapshot.peers.push(Peer::new("hub-b.local", "", 13789));

        store.save(&snapshot).unwrap();
        assert_eq!(store.load().unwrap(), Some(snapshot));
    }
}
