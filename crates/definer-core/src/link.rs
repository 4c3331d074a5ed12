//! Wireless link collaborator.
//!
//! The hub never scans or associates on its own. It asks a
//! [`LinkInitializer`] for an interface, connects it with the router's
//! credentials and checks that it reports up. Only the outcome matters to the
//! node state machine.

use async_trait::async_trait;
use thiserror::Error;

/// Reported state of a link interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Associated and usable
    Up,
    /// Not associated
    Down,
}

/// Link bring-up failure, carrying the collaborator's message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct LinkError(pub String);

impl LinkError {
    /// Error with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// An initialized wireless interface.
#[async_trait]
pub trait LinkInterface: Send + Sync {
    /// Associate with `ssid` using `password`.
    async fn connect(&mut self, ssid: &str, password: &str) -> Result<(), LinkError>;

    /// Current interface status.
    async fn status(&self) -> Result<LinkStatus, LinkError>;
}

/// Source of wireless interfaces.
#[async_trait]
pub trait LinkInitializer: Send + Sync {
    /// Find and prepare an interface.
    async fn initialize(&self) -> Result<Box<dyn LinkInterface>, LinkError>;
}

/// Initialize an interface, connect it, and confirm it is up.
///
/// # Errors
///
/// Returns the first failure from the collaborator, or a [`LinkError`] if the
/// interface still reports [`LinkStatus::Down`] after connecting.
pub async fn bring_up(
    initializer: &dyn LinkInitializer,
    ssid: &str,
    password: &str,
) -> Result<(), LinkError> {
    let mut interface = initializer.initialize().await?;
    interface.connect(ssid, password).await?;

    match interface.status().await? {
        LinkStatus::Up => {
            tracing::info!(ssid, "link up");
            Ok(())
        },
        LinkStatus::Down => Err(LinkError(format!("interface down after connecting to {ssid}"))),
    }
}
