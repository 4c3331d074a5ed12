//! Action driver.
//!
//! [`ServerDriver`] owns the shared [`Dispatcher`] and performs the I/O its
//! actions describe. The dispatcher lock is held only for the state
//! transition itself; fan-out and link bring-up run after it is released so a
//! slow peer never stalls other connections.

use std::sync::Arc;

use definer_core::{
    DispatchAction, Dispatcher, HandleError, LinkAttempt, LinkInitializer, Snapshot, Store,
    StoreError, Transport, bring_up,
};
use definer_proto::{Header, Packet};
use tokio::sync::Mutex;

use crate::{config::DriverConfig, fanout};

/// Dispatcher shared between the listener, the console and shutdown.
pub type SharedDispatcher = Arc<Mutex<Dispatcher>>;

/// Executes dispatcher actions over a transport.
pub struct ServerDriver<T: Transport> {
    dispatcher: SharedDispatcher,
    transport: Arc<T>,
    link: Arc<dyn LinkInitializer>,
    config: DriverConfig,
}

impl<T: Transport> Clone for ServerDriver<T> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            transport: Arc::clone(&self.transport),
            link: Arc::clone(&self.link),
            config: self.config.clone(),
        }
    }
}

impl<T: Transport> ServerDriver<T> {
    /// Driver owning a fresh dispatcher.
    pub fn new(
        dispatcher: Dispatcher,
        transport: Arc<T>,
        link: Arc<dyn LinkInitializer>,
        config: DriverConfig,
    ) -> Self {
        Self::with_shared(Arc::new(Mutex::new(dispatcher)), transport, link, config)
    }

    /// Driver over an already shared dispatcher.
    pub fn with_shared(
        dispatcher: SharedDispatcher,
        transport: Arc<T>,
        link: Arc<dyn LinkInitializer>,
        config: DriverConfig,
    ) -> Self {
        Self { dispatcher, transport, link, config }
    }

    /// Shared dispatcher.
    pub fn dispatcher(&self) -> &SharedDispatcher {
        &self.dispatcher
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runtime configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Handle a packet and run its actions.
    ///
    /// Returns the packet to write back to the requester, if any.
    pub async fn handle(&self, packet: Packet) -> Result<Option<Packet>, HandleError> {
        let actions = self.dispatcher.lock().await.handle(packet)?;
        self.execute(actions).await
    }

    /// Handle a packet that arrived with a live response sink.
    ///
    /// Failures, duplicates included, become an `ErrorResponse` to the
    /// requester.
    pub async fn respond_to(&self, packet: Packet) -> Option<Packet> {
        let header = packet.header.clone();
        match self.handle(packet).await {
            Ok(response) => response,
            Err(err) => {
                if err.is_duplicate() {
                    tracing::debug!(id = %header.id, origin = %header.origin, "duplicate packet");
                } else {
                    tracing::warn!(id = %header.id, origin = %header.origin, error = %err, "request failed");
                }
                Some(self.dispatcher.lock().await.error_response(&header, &err))
            },
        }
    }

    /// Perform `actions` in order.
    ///
    /// # Errors
    ///
    /// The first fan-out failure. Broadcast failures are reported only after
    /// every peer was attempted.
    pub async fn execute(&self, actions: Vec<DispatchAction>) -> Result<Option<Packet>, HandleError> {
        let timeouts = self.config.timeouts();
        let mut response = None;

        for action in actions {
            match action {
                DispatchAction::Respond(packet) => response = Some(packet),
                DispatchAction::Broadcast { packet, peers } => {
                    let delivered =
                        fanout::broadcast(self.transport.as_ref(), &packet, &peers, timeouts).await?;
                    tracing::debug!(id = %packet.header.id, delivered, "broadcast complete");
                },
                DispatchAction::DeliverToDevices { devices, packet } => {
                    fanout::dispatch_to_devices(self.transport.as_ref(), &devices, &packet, timeouts)
                        .await?;
                },
                DispatchAction::InitializeLink { attempt, request } => {
                    if let Some(failure) = self.initialize_link(&attempt, Some(&request)).await {
                        response = Some(failure);
                    }
                },
            }
        }

        Ok(response)
    }

    /// Bring the link up and record the outcome.
    ///
    /// Returns the `ErrorResponse` for `request` if bring-up failed.
    pub async fn initialize_link(
        &self,
        attempt: &LinkAttempt,
        request: Option<&Header>,
    ) -> Option<Packet> {
        let LinkAttempt { generation, credentials } = attempt;
        let result = bring_up(self.link.as_ref(), &credentials.ssid, &credentials.password).await;
        self.dispatcher.lock().await.complete_link(*generation, request, result)
    }

    /// Bring the link up with persisted credentials, if there are any.
    ///
    /// Failure is not fatal; the node stays unconfigured until a router
    /// configuration arrives.
    pub async fn start_link(&self) {
        let attempt = self.dispatcher.lock().await.startup_link();
        match attempt {
            Some(attempt) => {
                self.initialize_link(&attempt, None).await;
            },
            None => tracing::info!("router not configured, awaiting configuration"),
        }
    }

    /// Current state for persistence.
    pub async fn snapshot(&self) -> Snapshot {
        self.dispatcher.lock().await.snapshot()
    }

    /// Merge devices and peers added to `store` since startup.
    pub async fn reload(&self, store: &dyn Store) -> Result<(usize, usize), StoreError> {
        match store.load()? {
            Some(snapshot) => Ok(self.dispatcher.lock().await.reload(snapshot)),
            None => Ok((0, 0)),
        }
    }
}
