//! Transport listener.
//!
//! One task per accepted connection: read one frame, hand it to the driver,
//! write back at most one frame, close. There is no admission limit.
//! Shutdown stops accepting, waits out the grace period and aborts whatever is
//! still running.

use std::{future::Future, time::Duration};

use definer_core::Transport;
use definer_proto::{read_frame, write_frame};
use tokio::{io::AsyncWriteExt, task::JoinSet, time::timeout};

use crate::driver::ServerDriver;

const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(10);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Accept connections until `shutdown` resolves.
pub async fn serve<T, S>(driver: ServerDriver<T>, shutdown: S)
where
    T: Transport,
    S: Future<Output = ()>,
{
    let mut connections = JoinSet::new();
    let mut backoff = ACCEPT_BACKOFF_MIN;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            accepted = driver.transport().accept() => match accepted {
                Ok((stream, remote)) => {
                    backoff = ACCEPT_BACKOFF_MIN;
                    let driver = driver.clone();
                    connections.spawn(async move {
                        handle_connection(&driver, stream, &remote).await;
                    });
                },
                Err(err) => {
                    tracing::warn!(error = %err, "accept failed");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(ACCEPT_BACKOFF_MAX);
                },
            },
            Some(joined) = connections.join_next(), if !connections.is_empty() => {
                if let Err(err) = joined {
                    tracing::error!(error = %err, "connection task failed");
                }
            },
        }
    }

    let in_flight = connections.len();
    if in_flight > 0 {
        tracing::info!(in_flight, "draining connections");
        let drained = timeout(driver.config().shutdown_grace, async {
            while connections.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            tracing::warn!(remaining = connections.len(), "grace period elapsed, aborting");
            connections.abort_all();
        }
    }
}

/// Serve one connection: one frame in, at most one frame out.
pub async fn handle_connection<T: Transport>(
    driver: &ServerDriver<T>,
    mut stream: T::Stream,
    remote: &str,
) {
    let packet = match timeout(driver.config().read_timeout, read_frame(&mut stream)).await {
        Ok(Ok(packet)) => packet,
        Ok(Err(err)) => {
            tracing::warn!(remote, error = %err, "dropping unreadable frame");
            return;
        },
        Err(_) => {
            tracing::warn!(remote, "timed out waiting for frame");
            return;
        },
    };

    tracing::debug!(remote, id = %packet.header.id, body = packet.body.name(), "received packet");

    if let Some(response) = driver.respond_to(packet).await {
        match timeout(driver.config().write_timeout, write_frame(&mut stream, &response)).await {
            Ok(Ok(())) => {},
            Ok(Err(err)) => tracing::debug!(remote, error = %err, "response not delivered"),
            Err(_) => tracing::debug!(remote, "response write timed out"),
        }
    }

    if let Err(err) = stream.shutdown().await {
        tracing::debug!(remote, error = %err, "connection shutdown failed");
    }
}
