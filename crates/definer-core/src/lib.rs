//! Definer protocol core logic
//!
//! Pure protocol state for a definer hub, decoupled from sockets, the wireless
//! link and the filesystem.
//!
//! # Architecture
//!
//! The [`Dispatcher`] owns every piece of mutable protocol state: the local
//! router and room, the node state machine, the device and peer registries and
//! the duplicate cache. Handling a packet is a synchronous state transition
//! that returns [`DispatchAction`]s describing the I/O the runtime must perform
//! (reply, flood to peers, deliver to devices, bring the link up).
//!
//! Runtimes keep the dispatcher behind a single lock, execute the actions
//! after releasing it, and report link results back through
//! [`Dispatcher::complete_link`]. This keeps every registry mutation
//! serialized while slow network fan-out runs concurrently.
//!
//! # Components
//!
//! - [`dispatcher`]: Protocol state machine (validate, dedup, route, handle)
//! - [`dedup`]: Duplicate cache for flood-loop suppression
//! - [`device`]: Locally attached devices and capability matching
//! - [`peer`]: Sibling hubs used for flood broadcast
//! - [`node`]: Local router/room records and the configured state
//! - [`link`]: Wireless link collaborator
//! - [`store`]: Persistence collaborator
//! - [`transport`]: Transport abstraction (streams)
//! - [`error`]: Handling error taxonomy

pub mod dedup;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod link;
pub mod node;
pub mod peer;
pub mod store;
pub mod transport;

pub use dedup::{DedupKey, DuplicateCache, ParseDedupKeyError};
pub use device::{Device, DeviceRegistry, DeviceType, Stack};
pub use dispatcher::{DispatchAction, Dispatcher, DispatcherConfig, LinkAttempt};
pub use error::HandleError;
pub use link::{LinkError, LinkInitializer, LinkInterface, LinkStatus, bring_up};
pub use node::{Credentials, DEFAULT_PORT, NodeState, Room, Router};
pub use peer::{Peer, PeerRegistry};
pub use store::{MemoryStore, Snapshot, Store, StoreError};
pub use transport::Transport;
