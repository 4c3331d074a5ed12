//! Interactive console.
//!
//! Reads commands line by line and feeds the packets they build into the same
//! driver the network listener uses. Output goes through `tracing` like the
//! rest of the hub.

pub mod commands;
pub mod tokenizer;

use std::sync::Arc;

use definer_core::{Store, Transport};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub use commands::{CommandError, ConsoleCommand, HELP, parse};
pub use tokenizer::{Argument, TokenizeError, tokenize};

use crate::driver::ServerDriver;

/// Run console commands from `input` until it closes.
pub async fn run<T, R>(driver: ServerDriver<T>, store: Arc<dyn Store>, input: R)
where
    T: Transport,
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::error!(error = %err, "console input failed");
                break;
            },
        };

        let origin = driver.dispatcher().lock().await.identity().to_string();
        match parse(&line, &origin) {
            Ok(Some(command)) => execute(&driver, store.as_ref(), command).await,
            Ok(None) => {},
            Err(err) => tracing::warn!(error = %err, "console"),
        }
    }
    tracing::info!("console closed");
}

/// Carry out one console command.
pub async fn execute<T: Transport>(driver: &ServerDriver<T>, store: &dyn Store, command: ConsoleCommand) {
    match command {
        ConsoleCommand::Send(packet) => {
            let id = packet.header.id.clone();
            match driver.respond_to(packet).await {
                Some(response) => match response.error_message() {
                    Some(reason) => tracing::warn!(%id, reason, "request rejected"),
                    None => tracing::info!(%id, body = response.body.name(), "response"),
                },
                None => tracing::info!(%id, "request handled"),
            }
        },
        ConsoleCommand::ShowRouter => {
            let dispatcher = driver.dispatcher().lock().await;
            let router = dispatcher.router();
            tracing::info!(
                hostname = %router.hostname,
                name = %router.name,
                port = router.port,
                ssid = %router.ssid,
                state = ?dispatcher.state(),
                "router"
            );
        },
        ConsoleCommand::ShowRoom => {
            let dispatcher = driver.dispatcher().lock().await;
            let room = dispatcher.room();
            tracing::info!(name = %room.name, setup = room.is_setup(), "room");
        },
        ConsoleCommand::ListDevices => {
            let devices = driver.dispatcher().lock().await.devices().to_vec();
            tracing::info!(count = devices.len(), "devices");
            for device in devices {
                tracing::info!(
                    id = %device.id,
                    core = %device.kind.core,
                    modifier = %device.kind.modifier,
                    stack = %device.stack,
                    endpoint = %device.endpoint(),
                    "device"
                );
            }
        },
        ConsoleCommand::ListPeers => {
            let peers = driver.dispatcher().lock().await.peers().to_vec();
            tracing::info!(count = peers.len(), "peers");
            for peer in peers {
                tracing::info!(identity = peer.identity(), address = %peer.address(), "peer");
            }
        },
        ConsoleCommand::Reload => match driver.reload(store).await {
            Ok((devices, peers)) => tracing::info!(devices, peers, "reload complete"),
            Err(err) => tracing::error!(error = %err, "reload failed"),
        },
        ConsoleCommand::Help => tracing::info!("\n{HELP}"),
    }
}
