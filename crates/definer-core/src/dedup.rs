//! Duplicate cache.
//!
//! Flood broadcast relies on every hub remembering which packets it already
//! handled: a packet that loops back is dropped instead of being forwarded
//! again. Entries are inserted before the packet is processed.
//!
//! Two policies are configurable rather than guessed:
//!
//! - [`DedupKey`]: key on the bare packet id (default) or on origin plus id.
//!   The bare id can suppress packets from independent senders that happen to
//!   reuse an id.
//! - Capacity: unbounded by default. A bounded cache evicts the oldest entry
//!   first, which means a packet that loops back after eviction is handled
//!   again.

use std::{
    collections::{HashSet, VecDeque},
    fmt,
    num::NonZeroUsize,
    str::FromStr,
};

use definer_proto::Header;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which header fields identify a packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DedupKey {
    /// Packet id alone
    #[default]
    Id,
    /// Origin and packet id
    OriginAndId,
}

/// Unknown [`DedupKey`] name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown dedup key `{0}` (expected `id` or `origin-and-id`)")]
pub struct ParseDedupKeyError(String);

impl FromStr for DedupKey {
    type Err = ParseDedupKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "origin-and-id" => Ok(Self::OriginAndId),
            other => Err(ParseDedupKeyError(other.to_string())),
        }
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id => f.write_str("id"),
            Self::OriginAndId => f.write_str("origin-and-id"),
        }
    }
}

type CacheKey = (String, String);

/// Set of packets already handled.
#[derive(Debug, Clone)]
pub struct DuplicateCache {
    strategy: DedupKey,
    capacity: Option<NonZeroUsize>,
    seen: HashSet<CacheKey>,
    /// Insertion order, only tracked when bounded
    order: VecDeque<CacheKey>,
}

impl DuplicateCache {
    /// Unbounded cache.
    pub fn new(strategy: DedupKey) -> Self {
        Self { strategy, capacity: None, seen: HashSet::new(), order: VecDeque::new() }
    }

    /// Cache holding at most `capacity` entries.
    pub fn bounded(strategy: DedupKey, capacity: NonZeroUsize) -> Self {
        Self { capacity: Some(capacity), ..Self::new(strategy) }
    }

    /// Whether `header` identifies a packet that was already handled.
    pub fn seen(&self, header: &Header) -> bool {
        self.seen.contains(&self.key(header))
    }

    /// Remember `header`'s packet.
    pub fn mark_seen(&mut self, header: &Header) {
        let key = self.key(header);
        if !self.seen.insert(key.clone()) {
            return;
        }

        if let Some(capacity) = self.capacity {
            self.order.push_back(key);
            while self.order.len() > capacity.get() {
                if let Some(oldest) = self.order.pop_front() {
                    self.seen.remove(&oldest);
                }
            }
        }
    }

    /// Test and insert in one step. Returns `true` if the packet is new.
    pub fn check_and_mark(&mut self, header: &Header) -> bool {
        if self.seen(header) {
            return false;
        }
        self.mark_seen(header);
        true
    }

    /// Number of remembered packets.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn key(&self, header: &Header) -> CacheKey {
        match self.strategy {
            DedupKey::Id => (String::new(), header.id.clone()),
            DedupKey::OriginAndId => (header.origin.clone(), header.id.clone()),
        }
    }
}

impl Default for DuplicateCache {
    fn default() -> Self {
        Self::new(DedupKey::default())
    }
}
