//! Emulated wireless link.
//!
//! Development hosts have no managed wireless interface. [`EmulatedLink`]
//! accepts any non-empty SSID and reports the interface up, so the node state
//! machine runs exactly as it would on hardware.

use async_trait::async_trait;
use definer_core::{LinkError, LinkInitializer, LinkInterface, LinkStatus};

/// Link collaborator that pretends to associate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmulatedLink;

#[async_trait]
impl LinkInitializer for EmulatedLink {
    async fn initialize(&self) -> Result<Box<dyn LinkInterface>, LinkError> {
        Ok(Box::new(EmulatedInterface { status: LinkStatus::Down }))
    }
}

#[derive(Debug)]
struct EmulatedInterface {
    status: LinkStatus,
}

#[async_trait]
impl LinkInterface for EmulatedInterface {
    async fn connect(&mut self, ssid: &str, _password: &str) -> Result<(), LinkError> {
        if ssid.is_empty() {
            return Err(LinkError::new("no network name given"));
        }
        tracing::info!(ssid, "emulated link associated");
        self.status = LinkStatus::Up;
        Ok(())
    }

    async fn status(&self) -> Result<LinkStatus, LinkError> {
        Ok(self.status)
    }
}
