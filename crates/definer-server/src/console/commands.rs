//! Console command parsing.
//!
//! Packet-building commands produce the same [`Packet`]s a remote client
//! would send; the rest inspect local state.
//!
//! ```text
//! router [get | set] ssid=<s> password=<p> name=<n>
//! room [get | set] name=<n>
//! transfer device=<id>
//! command devcore=<core> devmod=<modifier> core=<action> parameter=<p>...
//! intro setup=<true|false>
//! devices | peers | reload | help
//! ```
//!
//! Packet commands accept header overrides `p.id=`, `p.destination=` and
//! `p.type=passive|request|response`. Without `p.id` a random id is used.

use definer_proto::{
    Body, Command, DeviceTransfer, DeviceType, Execute, Header, Intro, Packet, PacketType,
    RoomConfigRequest, RouterConfigRequest,
};
use rand::RngCore;
use thiserror::Error;

use super::tokenizer::{Argument, TokenizeError, tokenize};

/// Usage text for `help`.
pub const HELP: &str = "\
commands:
  router [get] ssid=<s> password=<p> name=<n>
  room [get] name=<n>
  transfer device=<id>
  command devcore=<core> devmod=<modifier> core=<action> parameter=<p>...
  intro setup=<true|false>
  devices | peers | reload | help
header overrides: p.id=<id> p.destination=<node> p.type=passive|request|response";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Feed a packet to the dispatcher
    Send(Packet),
    /// Show the router record
    ShowRouter,
    /// Show the room
    ShowRoom,
    /// List attached devices
    ListDevices,
    /// List known peers
    ListPeers,
    /// Merge newly persisted devices and peers
    Reload,
    /// Print usage
    Help,
}

/// Console line could not be turned into a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Tokenizer rejected the line
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    /// Line starts with a flag or assignment instead of a command
    #[error("must name a command before passing arguments")]
    MissingCommand,

    /// First word is not a command
    #[error("unknown command `{0}` (try `help`)")]
    UnknownCommand(String),

    /// Argument not understood by the command
    #[error("{command}: unexpected argument `{argument}`")]
    UnexpectedArgument {
        /// Command being parsed
        command: &'static str,
        /// Offending token
        argument: String,
    },

    /// Required argument absent or empty
    #[error("{command}: missing {argument}=")]
    MissingArgument {
        /// Command being parsed
        command: &'static str,
        /// Required key
        argument: &'static str,
    },

    /// Value could not be parsed
    #[error("invalid value `{value}` for {key}")]
    InvalidValue {
        /// Key the value belongs to
        key: String,
        /// Rejected value
        value: String,
    },
}

/// Parse one console line. Blank lines yield `None`.
///
/// `origin` is stamped on packet headers.
pub fn parse(line: &str, origin: &str) -> Result<Option<ConsoleCommand>, CommandError> {
    let arguments = tokenize(line)?;
    let Some((first, rest)) = arguments.split_first() else {
        return Ok(None);
    };
    if !first.is_positional() {
        return Err(CommandError::MissingCommand);
    }

    let command = match first.key.as_str() {
        "router" => router(rest, origin)?,
        "room" => room(rest, origin)?,
        "transfer" => transfer(rest, origin)?,
        "command" => command(rest, origin)?,
        "intro" => intro(rest, origin)?,
        "devices" => bare("devices", rest, ConsoleCommand::ListDevices)?,
        "peers" => bare("peers", rest, ConsoleCommand::ListPeers)?,
        "reload" => bare("reload", rest, ConsoleCommand::Reload)?,
        "help" => ConsoleCommand::Help,
        other => return Err(CommandError::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

/// Header fields collected from `p.` overrides.
struct HeaderBuilder {
    header: Header,
}

impl HeaderBuilder {
    fn new(origin: &str, kind: PacketType) -> Self {
        Self { header: Header::new(origin, String::new(), kind) }
    }

    /// Consume `argument` if it is a header override.
    fn accept(&mut self, argument: &Argument) -> Result<bool, CommandError> {
        let Some(field) = argument.key.strip_prefix("p.") else {
            return Ok(false);
        };
        let value = argument.value.clone().unwrap_or_default();
        match field {
            "id" => self.header.id = value,
            "destination" => self.header.destination = Some(value),
            "type" => {
                self.header.kind = match value.as_str() {
                    "passive" => PacketType::Passive,
                    "request" => PacketType::Request,
                    "response" => PacketType::Response,
                    _ => return Err(CommandError::InvalidValue { key: argument.key.clone(), value }),
                };
            },
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn finish(mut self, body: Body) -> ConsoleCommand {
        if self.header.id.is_empty() {
            self.header.id = random_id();
        }
        ConsoleCommand::Send(Packet::new(self.header, body))
    }
}

fn random_id() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn unexpected(command: &'static str, argument: &Argument) -> CommandError {
    let argument = match &argument.value {
        Some(value) => format!("{}={value}", argument.key),
        None => argument.key.clone(),
    };
    CommandError::UnexpectedArgument { command, argument }
}

fn bare(
    command: &'static str,
    rest: &[Argument],
    parsed: ConsoleCommand,
) -> Result<ConsoleCommand, CommandError> {
    match rest.first() {
        Some(argument) => Err(unexpected(command, argument)),
        None => Ok(parsed),
    }
}

fn router(rest: &[Argument], origin: &str) -> Result<ConsoleCommand, CommandError> {
    if matches!(rest, [get] if get.is_positional() && get.key == "get") {
        return Ok(ConsoleCommand::ShowRouter);
    }

    let mut header = HeaderBuilder::new(origin, PacketType::Request);
    let mut request = RouterConfigRequest::default();
    for argument in rest {
        if header.accept(argument)? {
            continue;
        }
        match (argument.key.as_str(), &argument.value) {
            ("set", None) if !argument.flag => {},
            ("ssid", Some(value)) => request.ssid.clone_from(value),
            ("password", Some(value)) => request.password.clone_from(value),
            ("name", Some(value)) => request.name.clone_from(value),
            _ => return Err(unexpected("router", argument)),
        }
    }
    Ok(header.finish(Body::RouterConfigReq(request)))
}

fn room(rest: &[Argument], origin: &str) -> Result<ConsoleCommand, CommandError> {
    if matches!(rest, [get] if get.is_positional() && get.key == "get") {
        return Ok(ConsoleCommand::ShowRoom);
    }

    let mut header = HeaderBuilder::new(origin, PacketType::Request);
    let mut request = RoomConfigRequest::default();
    for argument in rest {
        if header.accept(argument)? {
            continue;
        }
        match (argument.key.as_str(), &argument.value) {
            ("set", None) if !argument.flag => {},
            ("name", Some(value)) => request.name.clone_from(value),
            _ => return Err(unexpected("room", argument)),
        }
    }
    Ok(header.finish(Body::RoomConfigReq(request)))
}

fn transfer(rest: &[Argument], origin: &str) -> Result<ConsoleCommand, CommandError> {
    let mut header = HeaderBuilder::new(origin, PacketType::Passive);
    let mut device = String::new();
    for argument in rest {
        if header.accept(argument)? {
            continue;
        }
        match (argument.key.as_str(), &argument.value) {
            ("device", Some(value)) => device.clone_from(value),
            _ => return Err(unexpected("transfer", argument)),
        }
    }
    if device.is_empty() {
        return Err(CommandError::MissingArgument { command: "transfer", argument: "device" });
    }
    Ok(header.finish(Body::DeviceTransfer(DeviceTransfer { device })))
}

fn command(rest: &[Argument], origin: &str) -> Result<ConsoleCommand, CommandError> {
    let mut header = HeaderBuilder::new(origin, PacketType::Request);
    let mut device = DeviceType::default();
    let mut execute = Execute::default();
    for argument in rest {
        if header.accept(argument)? {
            continue;
        }
        match (argument.key.as_str(), &argument.value) {
            ("devcore", Some(value)) => device.core.clone_from(value),
            ("devmod", Some(value)) => device.modifier.clone_from(value),
            ("core", Some(value)) => execute.core.clone_from(value),
            ("parameter", Some(value)) => execute.parameters.push(value.clone()),
            _ => return Err(unexpected("command", argument)),
        }
    }
    if device.core.is_empty() {
        return Err(CommandError::MissingArgument { command: "command", argument: "devcore" });
    }
    Ok(header.finish(Body::Command(Command { device, execute })))
}

fn intro(rest: &[Argument], origin: &str) -> Result<ConsoleCommand, CommandError> {
    let mut header = HeaderBuilder::new(origin, PacketType::Passive);
    let mut setup = false;
    for argument in rest {
        if header.accept(argument)? {
            continue;
        }
        match (argument.key.as_str(), &argument.value) {
            ("setup", Some(value)) => {
                setup = value.parse().map_err(|_| CommandError::InvalidValue {
                    key: argument.key.clone(),
                    value: value.clone(),
                })?;
            },
            _ => return Err(unexpected("intro", argument)),
        }
    }
    Ok(header.finish(Body::Intro(Intro { setup })))
}
