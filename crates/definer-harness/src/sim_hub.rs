//! Hubs running on simulated hosts.

use std::sync::Arc;

use definer_core::{DEFAULT_PORT, Dispatcher, Peer, Router, Snapshot};
use definer_server::{DriverConfig, EmulatedLink, ServerDriver, SharedDispatcher, serve};
use tokio::sync::Mutex;

use crate::sim_transport::SimTransport;

/// A hub whose state outlives host restarts and is visible to test clients.
#[derive(Clone)]
pub struct SimHub {
    /// Simulation host name, also the hub's hostname
    pub name: String,
    /// Shared protocol state
    pub dispatcher: SharedDispatcher,
    config: DriverConfig,
}

impl SimHub {
    /// Hub named `name` restored from `snapshot`, configured when the
    /// snapshot carries link credentials.
    pub fn new(name: &str, snapshot: Snapshot, config: DriverConfig) -> Self {
        let mut dispatcher = Dispatcher::from_snapshot(snapshot, &config.dispatcher);
        if let Some(attempt) = dispatcher.startup_link() {
            dispatcher.complete_link(attempt.generation, None, Ok(()));
        }
        Self { name: name.to_string(), dispatcher: Arc::new(Mutex::new(dispatcher)), config }
    }

    /// Listen on [`DEFAULT_PORT`] and serve until the simulation ends.
    pub async fn run(self) -> turmoil::Result {
        let transport = SimTransport::bind(&format!("0.0.0.0:{DEFAULT_PORT}")).await?;
        let driver = ServerDriver::with_shared(
            self.dispatcher,
            Arc::new(transport),
            Arc::new(EmulatedLink),
            self.config,
        );
        tracing::debug!(hub = %self.name, "sim hub listening");
        serve(driver, std::future::pending()).await;
        Ok(())
    }
}

/// Fully connected hubs: every hub lists every other as a peer.
///
/// `customize` may add devices or rename the room per hub.
pub fn mesh(
    names: &[&str],
    config: &DriverConfig,
    mut customize: impl FnMut(&str, &mut Snapshot),
) -> Vec<SimHub> {
    names
        .iter()
        .map(|name| {
            let mut router = Router::new(*name);
            router.ssid = "sim".into();
            let mut snapshot = Snapshot::new(router);
            snapshot.peers = names
                .iter()
                .filter(|other| *other != name)
                .map(|other| Peer::new(*other, "", DEFAULT_PORT))
                .collect();
            customize(name, &mut snapshot);
            SimHub::new(name, snapshot, config.clone())
        })
        .collect()
}

