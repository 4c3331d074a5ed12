//! Runtime configuration.

use std::time::Duration;

use definer_core::DispatcherConfig;

use crate::fanout::Timeouts;

/// Timeouts and dispatcher tuning for a running hub.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Bound on dialing a peer or device
    pub dial_timeout: Duration,
    /// Bound on writing one frame
    pub write_timeout: Duration,
    /// Bound on reading the request frame of an accepted connection
    pub read_timeout: Duration,
    /// How long shutdown waits for in-flight connections
    pub shutdown_grace: Duration,
    /// Dedup policy
    pub dispatcher: DispatcherConfig,
}

impl DriverConfig {
    /// Dial and write bounds for outbound fan-out.
    pub fn timeouts(&self) -> Timeouts {
        Timeouts { dial: self.dial_timeout, write: self.write_timeout }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            dial_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(30),
            shutdown_grace: Duration::from_secs(5),
            dispatcher: DispatcherConfig::default(),
        }
    }
}
