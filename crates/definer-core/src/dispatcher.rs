//! Packet dispatcher.
//!
//! # Architecture: Action-Based State Machine
//!
//! [`Dispatcher::handle`] is a synchronous transition over the hub's state.
//! It never touches the network. Instead it returns [`DispatchAction`]s that
//! the runtime executes after releasing the dispatcher lock:
//!
//! - `Respond`: write a packet back on the request's connection
//! - `Broadcast`: flood a packet to every known peer
//! - `DeliverToDevices`: send a framed packet to matching local devices
//! - `InitializeLink`: bring the wireless link up, then report the outcome
//!   through [`Dispatcher::complete_link`]
//!
//! Link bring-ups are numbered. Only the outcome of the most recent one may
//! change the node state, so a slow result for superseded credentials cannot
//! undo a newer configuration.
//!
//! # Handling order
//!
//! 1. Validate (missing id, empty device references)
//! 2. Check-and-mark the duplicate cache; repeats stop here with no effect
//! 3. Forward packets addressed to another hub, without handling locally
//! 4. Reject everything but router configuration while unconfigured
//! 5. Dispatch on the body variant
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐  RouterConfigReq + link up   ┌────────────┐
//! │ Unconfigured │─────────────────────────────>│ Configured │
//! └──────────────┘<─────────────────────────────└────────────┘
//!                   RouterConfigReq + link fails
//! ```

use std::{fmt::Display, num::NonZeroUsize};

use definer_proto::{Body, Command, DeviceTransfer, Header, Packet, PacketType};

use crate::{
    dedup::{DedupKey, DuplicateCache},
    device::{Device, DeviceRegistry},
    error::HandleError,
    link::LinkError,
    node::{Credentials, NodeState, Room, Router},
    peer::{Peer, PeerRegistry},
    store::Snapshot,
};

/// Response text for introductions, which hubs never expect.
const UNEXPECTED_INTRO: &str = "unexpected introduction packet";

/// I/O the runtime performs on behalf of the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchAction {
    /// Write this packet back to the requester
    Respond(Packet),

    /// Deliver `packet` to each peer, continuing past failures
    Broadcast {
        /// Packet with this hub already appended to its route
        packet: Packet,
        /// Fan-out set, captured at handling time
        peers: Vec<Peer>,
    },

    /// Deliver `packet` to each device in order, stopping at the first failure
    DeliverToDevices {
        /// Devices matching the command target
        devices: Vec<Device>,
        /// Command packet to frame and send
        packet: Packet,
    },

    /// Bring the link up, then call [`Dispatcher::complete_link`]
    InitializeLink {
        /// Credentials from the updated router record, tagged with the attempt
        attempt: LinkAttempt,
        /// Header of the configuration request, for the failure response
        request: Header,
    },
}

/// One link bring-up requested by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkAttempt {
    /// Increases with every attempt; passed back to `complete_link`
    pub generation: u64,
    /// Credentials to connect with
    pub credentials: Credentials,
}

/// Dispatcher tuning.
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    /// Header fields that identify a packet for deduplication
    pub dedup_key: DedupKey,
    /// Maximum remembered packets; unbounded when `None`
    pub dedup_capacity: Option<NonZeroUsize>,
}

impl DispatcherConfig {
    fn duplicate_cache(&self) -> DuplicateCache {
        match self.dedup_capacity {
            Some(capacity) => DuplicateCache::bounded(self.dedup_key, capacity),
            None => DuplicateCache::new(self.dedup_key),
        }
    }
}

/// Protocol state of one hub.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    router: Router,
    room: Room,
    state: NodeState,
    devices: DeviceRegistry,
    peers: PeerRegistry,
    seen: DuplicateCache,
    /// Generation of the latest link attempt
    link_generation: u64,
}

impl Dispatcher {
    /// Unconfigured dispatcher for `router` with no devices or peers.
    pub fn new(router: Router, config: &DispatcherConfig) -> Self {
        Self::from_snapshot(Snapshot::new(router), config)
    }

    /// Dispatcher restored from persisted state.
    ///
    /// The node starts unconfigured regardless of stored credentials; the
    /// link has to come up again first (see [`Dispatcher::startup_link`]).
    pub fn from_snapshot(snapshot: Snapshot, config: &DispatcherConfig) -> Self {
        Self {
            router: snapshot.router,
            room: snapshot.room,
            state: NodeState::Unconfigured,
            devices: DeviceRegistry::from_devices(snapshot.devices),
            peers: PeerRegistry::from_peers(snapshot.peers),
            seen: config.duplicate_cache(),
            link_generation: 0,
        }
    }

    /// Current state for persistence.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            router: self.router.clone(),
            room: self.room.clone(),
            devices: self.devices.to_vec(),
            peers: self.peers.to_vec(),
        }
    }

    /// Local router record.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Local room.
    pub fn room(&self) -> &Room {
        &self.room
    }

    /// Node configuration state.
    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Attached devices.
    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    /// Known peers.
    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    /// Duplicate cache.
    pub fn duplicates(&self) -> &DuplicateCache {
        &self.seen
    }

    /// Identity stamped on responses and broadcast routes.
    pub fn identity(&self) -> &str {
        self.router.identity()
    }

    /// Link attempt with the stored credentials, if there are any.
    pub fn startup_link(&mut self) -> Option<LinkAttempt> {
        self.router.has_credentials().then(|| self.begin_link())
    }

    /// `ErrorResponse` to `request`, sent from this hub.
    pub fn error_response(&self, request: &Header, err: &impl Display) -> Packet {
        Packet::error_response(request, self.identity(), err.to_string())
    }

    /// Handle one inbound packet.
    ///
    /// # Errors
    ///
    /// - `MalformedPacket` if validation fails
    /// - `DuplicatePacket` if the packet was already handled; no state changes
    /// - `NodeNotConfigured` for anything but router configuration before setup
    /// - `ConfigurationInvalid` for rejected router/room configuration
    /// - `UnrecognizedPacketType` for bodies that are not valid requests
    pub fn handle(&mut self, packet: Packet) -> Result<Vec<DispatchAction>, HandleError> {
        validate(&packet)?;

        if !self.seen.check_and_mark(&packet.header) {
            return Err(HandleError::DuplicatePacket { id: packet.header.id });
        }

        tracing::debug!(
            id = %packet.header.id,
            origin = %packet.header.origin,
            body = packet.body.name(),
            "handling packet"
        );

        if let Some(destination) = packet.header.destination() {
            if !self.router.is_addressed(destination) {
                tracing::debug!(id = %packet.header.id, destination, "forwarding");
                return Ok(vec![self.flood(packet)]);
            }
        }

        if !self.state.is_configured() && !matches!(packet.body, Body::RouterConfigReq(_)) {
            return Err(HandleError::NodeNotConfigured);
        }

        let Packet { header, body } = packet;
        match body {
            Body::Intro(_) => {
                Ok(vec![DispatchAction::Respond(self.error_response(&header, &UNEXPECTED_INTRO))])
            },
            Body::RouterConfigReq(request) => {
                if !request.ssid.is_empty() {
                    self.router.ssid = request.ssid;
                }
                if !request.password.is_empty() {
                    self.router.password = request.password;
                }
                if !request.name.is_empty() {
                    self.router.name = request.name;
                }

                if !self.router.has_credentials() {
                    return Err(HandleError::ConfigurationInvalid {
                        what: "router",
                        reason: "ssid is required".to_string(),
                    });
                }

                tracing::info!(ssid = %self.router.ssid, "router configuration accepted");
                Ok(vec![DispatchAction::InitializeLink { attempt: self.begin_link(), request: header }])
            },
            Body::RoomConfigReq(request) => {
                if request.name.is_empty() {
                    return Err(HandleError::ConfigurationInvalid {
                        what: "room",
                        reason: "name is required".to_string(),
                    });
                }
                tracing::info!(name = %request.name, "room renamed");
                self.room.name = request.name;
                Ok(Vec::new())
            },
            Body::DeviceTransfer(transfer) => {
                match self.devices.remove(&transfer.device) {
                    Some(_) => tracing::info!(device = %transfer.device, "device transferred away"),
                    None => tracing::debug!(device = %transfer.device, "transferred device not held"),
                }
                Ok(vec![self.flood(Packet::new(header, Body::DeviceTransfer(transfer)))])
            },
            Body::Command(command) => {
                let devices = self.devices.matching(&command.device);
                let packet = Packet::new(header, Body::Command(command));
                if devices.is_empty() {
                    tracing::debug!(id = %packet.header.id, "no local device matches, forwarding");
                    return Ok(vec![self.flood(packet)]);
                }
                Ok(vec![DispatchAction::DeliverToDevices { devices, packet }])
            },
            Body::ErrorResponse(response) if header.kind == PacketType::Response => {
                tracing::info!(
                    id = %header.id,
                    origin = %header.origin,
                    message = %response.message,
                    "peer reported error"
                );
                Ok(Vec::new())
            },
            body @ Body::ErrorResponse(_) => {
                Err(HandleError::UnrecognizedPacketType { kind: body.name() })
            },
        }
    }

    /// Record the outcome of link attempt `generation`.
    ///
    /// Success configures the node. Failure leaves it unconfigured and, when
    /// the bring-up was requested over the wire, yields the `ErrorResponse`
    /// for the requester. Outcomes of superseded attempts leave the node
    /// state alone; a superseded failure is still reported to its requester.
    pub fn complete_link(
        &mut self,
        generation: u64,
        request: Option<&Header>,
        result: Result<(), LinkError>,
    ) -> Option<Packet> {
        if generation != self.link_generation {
            tracing::debug!(generation, latest = self.link_generation, "ignoring stale link result");
            let err = HandleError::LinkFailed(result.err()?.0);
            return request.map(|header| self.error_response(header, &err));
        }

        match result {
            Ok(()) => {
                if !self.state.is_configured() {
                    tracing::info!(identity = %self.identity(), "node configured");
                }
                self.state = NodeState::Configured;
                None
            },
            Err(err) => {
                tracing::warn!(error = %err, "link initialization failed, node unconfigured");
                self.state = NodeState::Unconfigured;
                let err = HandleError::LinkFailed(err.0);
                request.map(|header| self.error_response(header, &err))
            },
        }
    }

    /// Merge re-read persisted state.
    ///
    /// Adds devices and peers that are not registered yet; existing entries and
    /// the router/room records are left alone. Returns how many devices and
    /// peers were added.
    pub fn reload(&mut self, snapshot: Snapshot) -> (usize, usize) {
        let mut added_devices = 0;
        for device in snapshot.devices {
            if !self.devices.contains(&device.id) {
                self.devices.insert(device);
                added_devices += 1;
            }
        }

        let mut added_peers = 0;
        for peer in snapshot.peers {
            if !self.peers.contains(peer.identity()) {
                self.peers.insert(peer);
                added_peers += 1;
            }
        }

        tracing::info!(devices = added_devices, peers = added_peers, "state reloaded");
        (added_devices, added_peers)
    }

    fn begin_link(&mut self) -> LinkAttempt {
        self.link_generation += 1;
        LinkAttempt { generation: self.link_generation, credentials: self.router.credentials() }
    }

    fn flood(&self, mut packet: Packet) -> DispatchAction {
        packet.header.route.push(self.identity().to_string());
        DispatchAction::Broadcast { packet, peers: self.peers.to_vec() }
    }
}

fn validate(packet: &Packet) -> Result<(), HandleError> {
    if packet.header.id.is_empty() {
        return Err(HandleError::MalformedPacket("missing packet id".to_string()));
    }

    match &packet.body {
        Body::DeviceTransfer(DeviceTransfer { device }) if device.is_empty() => {
            Err(HandleError::MalformedPacket("device transfer names no device".to_string()))
        },
        Body::Command(Command { device, .. }) if device.core.is_empty() => {
            Err(HandleError::MalformedPacket("command targets no device core".to_string()))
        },
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use definer_proto::{
        DeviceType, ErrorResponse, Execute, Intro, RoomConfigRequest, RouterConfigRequest,
    };

    use super::*;

    fn device(id: &str, core: &str, modifier: &str) -> Device {
        Device {
            id: id.into(),
            version: "1".into(),
            manufacturer: "acme".into(),
            stack: "wifi".into(),
            address: "10.0.0.9".into(),
            port: 9000,
            kind: DeviceType::new(core, modifier),
        }
    }

    fn snapshot() -> Snapshot {
        let mut snapshot = Snapshot::new(Router::new("hub-a.local"));
        snapshot.devices = vec![
            device("dev-1", "light", "ceiling"),
            device("dev-2", "light", "desk"),
            device("dev-3", "fan", ""),
        ];
        snapshot.peers = vec![
            Peer::new("hub-b.local", "", 13789),
            Peer::new("hub-c.local", "", 13789),
        ];
        snapshot
    }

    fn unconfigured() -> Dispatcher {
        Dispatcher::from_snapshot(snapshot(), &DispatcherConfig::default())
    }

    fn configured() -> Dispatcher {
        let mut dispatcher = unconfigured();
        let attempt = dispatcher.begin_link();
        dispatcher.complete_link(attempt.generation, None, Ok(()));
        dispatcher
    }

    fn link_attempt(actions: &[DispatchAction]) -> (LinkAttempt, Header) {
        let [DispatchAction::InitializeLink { attempt, request }] = actions else {
            panic!("expected link initialization, got {actions:?}");
        };
        (attempt.clone(), request.clone())
    }

    fn request(id: &str, body: Body) -> Packet {
        Packet::new(Header::new("phone", id, PacketType::Request), body)
    }

    fn router_config(ssid: &str, password: &str) -> Body {
        Body::RouterConfigReq(RouterConfigRequest {
            ssid: ssid.into(),
            password: password.into(),
            name: String::new(),
        })
    }

    fn transfer(device: &str) -> Body {
        Body::DeviceTransfer(DeviceTransfer { device: device.into() })
    }

    fn command(core: &str, modifier: &str) -> Body {
        Body::Command(Command {
            device: DeviceType::new(core, modifier),
            execute: Execute { core: "on".into(), parameters: vec!["50".into()] },
        })
    }

    #[test]
    fn starts_unconfigured() {
        let mut dispatcher = unconfigured();
        assert_eq!(dispatcher.state(), NodeState::Unconfigured);
        assert_eq!(dispatcher.identity(), "hub-a.local");
        assert!(dispatcher.startup_link().is_none());
    }

    #[test]
    fn missing_id_is_malformed() {
        let mut dispatcher = configured();
        let result = dispatcher.handle(request("", transfer("dev-1")));
        assert!(matches!(result, Err(HandleError::MalformedPacket(_))));
        assert!(dispatcher.duplicates().is_empty());
    }

    #[test]
    fn empty_references_are_malformed() {
        let mut dispatcher = configured();
        assert!(matches!(
            dispatcher.handle(request("1", transfer(""))),
            Err(HandleError::MalformedPacket(_))
        ));
        assert!(matches!(
            dispatcher.handle(request("2", command("", "x"))),
            Err(HandleError::MalformedPacket(_))
        ));
    }

    #[test]
    fn duplicate_has_no_effect() {
        let mut dispatcher = configured();
        let actions = dispatcher.handle(request("7", transfer("dev-1"))).unwrap();
        assert_eq!(actions.len(), 1);

        // Same id, different body: still a duplicate, nothing happens
        let result = dispatcher.handle(request("7", transfer("dev-2")));
        assert!(matches!(result, Err(HandleError::DuplicatePacket { ref id }) if id == "7"));
        assert!(dispatcher.devices().contains("dev-2"));
        assert_eq!(dispatcher.devices().len(), 2);
    }

    #[test]
    fn duplicate_while_unconfigured_is_still_duplicate() {
        let mut dispatcher = unconfigured();
        assert!(matches!(
            dispatcher.handle(request("1", transfer("dev-1"))),
            Err(HandleError::NodeNotConfigured)
        ));
        assert!(matches!(
            dispatcher.handle(request("1", transfer("dev-1"))),
            Err(HandleError::DuplicatePacket { .. })
        ));
    }

    #[test]
    fn foreign_destination_is_forwarded_not_handled() {
        let mut dispatcher = configured();
        let mut packet = request("9", transfer("dev-1"));
        packet.header = packet.header.with_destination("hub-z.local");

        let actions = dispatcher.handle(packet).unwrap();
        let [DispatchAction::Broadcast { packet, peers }] = actions.as_slice() else {
            panic!("expected broadcast, got {actions:?}");
        };
        assert_eq!(packet.header.route, ["hub-a.local"]);
        assert_eq!(peers.len(), 2);
        assert!(dispatcher.devices().contains("dev-1"));
    }

    #[test]
    fn foreign_destination_is_forwarded_even_unconfigured() {
        let mut dispatcher = unconfigured();
        let mut packet = request("9", command("light", ""));
        packet.header = packet.header.with_destination("hub-z.local");

        let actions = dispatcher.handle(packet).unwrap();
        assert!(matches!(actions.as_slice(), [DispatchAction::Broadcast { .. }]));
    }

    #[test]
    fn local_destination_by_name_is_handled() {
        let mut dispatcher = configured();
        dispatcher.router.name = "living-room".into();
        let mut packet = request("3", Body::RoomConfigReq(RoomConfigRequest { name: "den".into() }));
        packet.header = packet.header.with_destination("living-room");

        assert!(dispatcher.handle(packet).unwrap().is_empty());
        assert_eq!(dispatcher.room().name, "den");
    }

    #[test]
    fn unconfigured_rejects_everything_but_router_config() {
        let mut dispatcher = unconfigured();
        for (id, body) in [
            ("1", Body::Intro(Intro { setup: true })),
            ("2", Body::RoomConfigReq(RoomConfigRequest { name: "den".into() })),
            ("3", transfer("dev-1")),
            ("4", command("light", "")),
        ] {
            assert!(matches!(
                dispatcher.handle(request(id, body)),
                Err(HandleError::NodeNotConfigured)
            ));
        }
        assert_eq!(dispatcher.devices().len(), 3);
    }

    #[test]
    fn router_config_requests_link_then_configures() {
        let mut dispatcher = unconfigured();
        let actions = dispatcher.handle(request("1", router_config("home", "pw"))).unwrap();

        let (attempt, request) = link_attempt(&actions);
        assert_eq!(attempt.credentials.ssid, "home");
        assert_eq!(attempt.credentials.password, "pw");
        assert_eq!(dispatcher.state(), NodeState::Unconfigured);

        let response = dispatcher.complete_link(attempt.generation, Some(&request), Ok(()));
        assert!(response.is_none());
        assert_eq!(dispatcher.state(), NodeState::Configured);
    }

    #[test]
    fn failed_link_reports_and_stays_unconfigured() {
        let mut dispatcher = unconfigured();
        let actions = dispatcher.handle(request("1", router_config("home", "pw"))).unwrap();
        let (attempt, header) = link_attempt(&actions);

        let response = dispatcher
            .complete_link(
                attempt.generation,
                Some(&header),
                Err(LinkError::new("no access point named home")),
            )
            .unwrap();

        assert_eq!(dispatcher.state(), NodeState::Unconfigured);
        assert_eq!(response.header.id, "1");
        assert_eq!(response.header.kind, PacketType::Response);
        assert_eq!(response.header.destination.as_deref(), Some("phone"));
        assert!(response.error_message().unwrap().contains("no access point named home"));
    }

    #[test]
    fn failed_reinitialization_unconfigures() {
        let mut dispatcher = configured();
        let actions = dispatcher.handle(request("1", router_config("office", ""))).unwrap();
        let (attempt, _) = link_attempt(&actions);
        dispatcher.complete_link(attempt.generation, None, Err(LinkError::new("timeout")));
        assert_eq!(dispatcher.state(), NodeState::Unconfigured);
    }

    #[test]
    fn late_failure_of_superseded_link_keeps_node_configured() {
        let mut dispatcher = unconfigured();
        let first = dispatcher.handle(request("1", router_config("home", "old"))).unwrap();
        let second = dispatcher.handle(request("2", router_config("home", "new"))).unwrap();
        let (older, older_request) = link_attempt(&first);
        let (newer, _) = link_attempt(&second);
        assert!(newer.generation > older.generation);

        assert!(dispatcher.complete_link(newer.generation, None, Ok(())).is_none());
        assert_eq!(dispatcher.state(), NodeState::Configured);

        let response = dispatcher
            .complete_link(older.generation, Some(&older_request), Err(LinkError::new("bad password")))
            .unwrap();
        assert!(response.error_message().unwrap().contains("bad password"));
        assert_eq!(dispatcher.state(), NodeState::Configured);
    }

    #[test]
    fn late_success_of_superseded_link_does_not_configure() {
        let mut dispatcher = unconfigured();
        let first = dispatcher.handle(request("1", router_config("home", "pw"))).unwrap();
        let second = dispatcher.handle(request("2", router_config("office", "pw"))).unwrap();
        let (older, _) = link_attempt(&first);
        let (newer, _) = link_attempt(&second);

        dispatcher.complete_link(newer.generation, None, Err(LinkError::new("out of range")));
        assert!(dispatcher.complete_link(older.generation, None, Ok(())).is_none());
        assert_eq!(dispatcher.state(), NodeState::Unconfigured);
    }

    #[test]
    fn router_config_keeps_unspecified_fields() {
        let mut dispatcher = unconfigured();
        dispatcher.handle(request("1", router_config("home", "pw"))).unwrap();
        dispatcher.handle(request("2", router_config("", "new-pw"))).unwrap();

        assert_eq!(dispatcher.router().ssid, "home");
        assert_eq!(dispatcher.router().password, "new-pw");
    }

    #[test]
    fn router_config_without_ssid_is_invalid() {
        let mut dispatcher = unconfigured();
        let result = dispatcher.handle(request("1", router_config("", "pw")));
        assert!(matches!(result, Err(HandleError::ConfigurationInvalid { what: "router", .. })));
    }

    #[test]
    fn router_config_name_changes_identity() {
        let mut dispatcher = unconfigured();
        let body = Body::RouterConfigReq(RouterConfigRequest {
            ssid: "home".into(),
            password: String::new(),
            name: "living-room".into(),
        });
        dispatcher.handle(request("1", body)).unwrap();
        assert_eq!(dispatcher.identity(), "living-room");
    }

    #[test]
    fn intro_gets_error_response() {
        let mut dispatcher = configured();
        let actions = dispatcher.handle(request("5", Body::Intro(Intro { setup: true }))).unwrap();

        let [DispatchAction::Respond(response)] = actions.as_slice() else {
            panic!("expected response, got {actions:?}");
        };
        assert_eq!(response.error_message(), Some(UNEXPECTED_INTRO));
        assert_eq!(response.header.origin, "hub-a.local");
        assert_eq!(response.header.id, "5");
    }

    #[test]
    fn empty_room_name_is_invalid() {
        let mut dispatcher = configured();
        let err = dispatcher
            .handle(request("1", Body::RoomConfigReq(RoomConfigRequest::default())))
            .unwrap_err();
        assert!(err.to_string().contains("invalid room configuration"));
    }

    #[test]
    fn device_transfer_removes_and_floods() {
        let mut dispatcher = configured();
        let actions = dispatcher.handle(request("1", transfer("dev-1"))).unwrap();

        assert!(!dispatcher.devices().contains("dev-1"));
        let [DispatchAction::Broadcast { packet, .. }] = actions.as_slice() else {
            panic!("expected broadcast, got {actions:?}");
        };
        assert_eq!(packet.body, transfer("dev-1"));
    }

    #[test]
    fn device_transfer_of_absent_device_still_floods() {
        let mut dispatcher = configured();
        let actions = dispatcher.handle(request("1", transfer("dev-42"))).unwrap();
        assert!(matches!(actions.as_slice(), [DispatchAction::Broadcast { .. }]));
        assert_eq!(dispatcher.devices().len(), 3);
    }

    #[test]
    fn command_delivers_to_matching_devices() {
        let mut dispatcher = configured();
        let actions = dispatcher.handle(request("1", command("light", ""))).unwrap();

        let [DispatchAction::DeliverToDevices { devices, packet }] = actions.as_slice() else {
            panic!("expected delivery, got {actions:?}");
        };
        let ids: Vec<_> = devices.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["dev-1", "dev-2"]);
        assert!(packet.header.route.is_empty());
    }

    #[test]
    fn unmatched_command_is_forwarded() {
        let mut dispatcher = configured();
        let actions = dispatcher.handle(request("1", command("lock", ""))).unwrap();

        let [DispatchAction::Broadcast { packet, peers }] = actions.as_slice() else {
            panic!("expected broadcast, got {actions:?}");
        };
        assert_eq!(peers.len(), 2);
        assert_eq!(packet.header.route, ["hub-a.local"]);
    }

    #[test]
    fn error_response_request_is_unrecognized() {
        let mut dispatcher = configured();
        let body = Body::ErrorResponse(ErrorResponse::new("boom"));
        assert!(matches!(
            dispatcher.handle(request("1", body)),
            Err(HandleError::UnrecognizedPacketType { kind: "error_response" })
        ));
    }

    #[test]
    fn error_response_reply_is_accepted() {
        let mut dispatcher = configured();
        let packet = Packet::new(
            Header::new("hub-b.local", "1", PacketType::Response),
            Body::ErrorResponse(ErrorResponse::new("boom")),
        );
        assert!(dispatcher.handle(packet).unwrap().is_empty());
    }

    #[test]
    fn bounded_dedup_from_config() {
        let config = DispatcherConfig {
            dedup_key: DedupKey::OriginAndId,
            dedup_capacity: NonZeroUsize::new(1),
        };
        let mut dispatcher = Dispatcher::from_snapshot(snapshot(), &config);
        let attempt = dispatcher.begin_link();
        dispatcher.complete_link(attempt.generation, None, Ok(()));

        dispatcher.handle(request("1", transfer("dev-42"))).unwrap();
        dispatcher.handle(request("2", transfer("dev-42"))).unwrap();
        // "1" was evicted, so it is handled again
        assert!(dispatcher.handle(request("1", transfer("dev-42"))).is_ok());
        assert_eq!(dispatcher.duplicates().len(), 1);
    }

    #[test]
    fn startup_link_uses_stored_credentials() {
        let mut snapshot = snapshot();
        snapshot.router.ssid = "home".into();
        snapshot.router.password = "pw".into();
        let mut dispatcher = Dispatcher::from_snapshot(snapshot, &DispatcherConfig::default());

        let attempt = dispatcher.startup_link().unwrap();
        assert_eq!(attempt.credentials.ssid, "home");
        assert_eq!(dispatcher.state(), NodeState::Unconfigured);
    }

    #[test]
    fn reload_adds_only_new_entries() {
        let mut dispatcher = configured();

        let mut reread = snapshot();
        reread.devices[0].address = "10.0.0.99".into();
        reread.devices.push(device("dev-4", "lock", ""));
        reread.peers.push(Peer::new("hub-d.local", "", 13789));

        assert_eq!(dispatcher.reload(reread), (1, 1));
        assert_eq!(dispatcher.devices().lookup("dev-1").unwrap().address, "10.0.0.9");
        assert!(dispatcher.devices().contains("dev-4"));
        assert!(dispatcher.peers().contains("hub-d.local"));
    }

    #[test]
    fn snapshot_reflects_mutations() {
        let mut dispatcher = configured();
        dispatcher.handle(request("1", transfer("dev-3"))).unwrap();
        dispatcher
            .handle(request("2", Body::RoomConfigReq(RoomConfigRequest { name: "den".into() })))
            .unwrap();

        let snapshot = dispatcher.snapshot();
        assert_eq!(snapshot.room.name, "den");
        assert_eq!(snapshot.devices.len(), 2);
        assert_eq!(snapshot.peers.len(), 2);
    }
}
