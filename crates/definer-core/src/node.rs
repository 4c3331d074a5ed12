//! Local router and room records.

use serde::{Deserialize, Serialize};

/// Port a hub listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 13789;

/// Configuration state of the local node.
///
/// `Configured` is entered only after a router configuration request was
/// accepted and the link came up. A later failed re-initialization drops the
/// node back to `Unconfigured`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NodeState {
    /// Waiting for a router configuration
    #[default]
    Unconfigured,
    /// Link is up, every packet type is accepted
    Configured,
}

impl NodeState {
    /// Whether the node accepts every packet type.
    pub fn is_configured(self) -> bool {
        self == Self::Configured
    }
}

/// This hub's own identity and wireless credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Router {
    /// Network hostname
    pub hostname: String,
    /// Routing name, overrides the hostname as identity when set
    #[serde(default)]
    pub name: String,
    /// Listening port
    pub port: u16,
    /// Wireless network to join
    #[serde(default)]
    pub ssid: String,
    /// Wireless network password
    #[serde(default)]
    pub password: String,
}

impl Router {
    /// Unconfigured router for `hostname` on [`DEFAULT_PORT`].
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            name: String::new(),
            port: DEFAULT_PORT,
            ssid: String::new(),
            password: String::new(),
        }
    }

    /// Identity stamped on responses and broadcast routes.
    pub fn identity(&self) -> &str {
        if self.name.is_empty() { &self.hostname } else { &self.name }
    }

    /// Whether `destination` names this router by name or hostname.
    pub fn is_addressed(&self, destination: &str) -> bool {
        destination == self.hostname || (!self.name.is_empty() && destination == self.name)
    }

    /// Whether wireless credentials are present.
    pub fn has_credentials(&self) -> bool {
        !self.ssid.is_empty()
    }

    /// Current wireless credentials.
    pub fn credentials(&self) -> Credentials {
        Credentials { ssid: self.ssid.clone(), password: self.password.clone() }
    }
}

/// Wireless network credentials handed to the link collaborator.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Network name
    pub ssid: String,
    /// Network password
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("ssid", &self.ssid).finish_non_exhaustive()
    }
}

// Keeps the password out of logs.
impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("hostname", &self.hostname)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("ssid", &self.ssid)
            .finish_non_exhaustive()
    }
}

/// The room this hub serves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Display name
    #[serde(default)]
    pub name: String,
}

impl Room {
    /// A room is set up once it has a name.
    pub fn is_setup(&self) -> bool {
        !self.name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_addressed_by_name_or_hostname() {
        let mut router = Router::new("hub-a.local");
        assert_eq!(router.identity(), "hub-a.local");
        assert!(router.is_addressed("hub-a.local"));
        assert!(!router.is_addressed(""));

        router.name = "living-room".into();
        assert_eq!(router.identity(), "living-room");
        assert!(router.is_addressed("living-room"));
        assert!(router.is_addressed("hub-a.local"));
        assert!(!router.is_addressed("hub-b.local"));
    }

    #[test]
    fn debug_hides_password() {
        let mut router = Router::new("hub-a.local");
        router.password = "hunter2".into();
        assert!(!format!("{router:?}").contains("hunter2"));
    }

    #[test]
    fn room_setup_follows_name() {
        assert!(!Room::default().is_setup());
        assert!(Room { name: "kitchen".into() }.is_setup());
    }
}
