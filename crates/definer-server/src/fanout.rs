//! Outbound delivery to peers and devices.
//!
//! Both fan-outs frame the packet once and open one connection per target,
//! writing a single frame. They differ in failure policy:
//!
//! - [`broadcast`] tries every peer and reports the last failure afterwards.
//! - [`dispatch_to_devices`] stops at the first failing device. Devices earlier
//!   in the list have already received the command and are not rolled back.

use std::{io, time::Duration};

use definer_core::{Device, HandleError, Peer, Stack, Transport};
use definer_proto::{Packet, frame};
use tokio::{io::AsyncWriteExt, time::timeout};

/// Per-target bounds on outbound I/O.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Connection establishment
    pub dial: Duration,
    /// Writing the frame
    pub write: Duration,
}

/// Dial `addr` and write one pre-encoded frame.
///
/// # Errors
///
/// Returns the I/O error, or `TimedOut` if either bound elapses.
pub async fn deliver<T: Transport>(
    transport: &T,
    addr: &str,
    frame: &[u8],
    timeouts: Timeouts,
) -> io::Result<()> {
    let mut stream = timeout(timeouts.dial, transport.connect(addr))
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "dial timed out"))??;

    timeout(timeouts.write, async {
        stream.write_all(frame).await?;
        stream.flush().await?;
        stream.shutdown().await
    })
    .await
    .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "write timed out"))?
}

/// Flood `packet` to every peer.
///
/// Returns the number of peers reached.
///
/// # Errors
///
/// `PeerUnreachable` for the last peer that failed, after every peer was
/// attempted. Encoding failures abort before any delivery.
pub async fn broadcast<T: Transport>(
    transport: &T,
    packet: &Packet,
    peers: &[Peer],
    timeouts: Timeouts,
) -> Result<usize, HandleError> {
    let frame = frame::encode(packet)?;
    let mut delivered = 0;
    let mut last_error = None;

    for peer in peers {
        let addr = peer.address();
        match deliver(transport, &addr, &frame, timeouts).await {
            Ok(()) => {
                delivered += 1;
                tracing::debug!(peer = peer.identity(), id = %packet.header.id, "broadcast delivered");
            },
            Err(err) => {
                tracing::warn!(peer = peer.identity(), %addr, error = %err, "peer unreachable");
                last_error = Some(HandleError::PeerUnreachable {
                    peer: peer.identity().to_string(),
                    reason: err.to_string(),
                });
            },
        }
    }

    match last_error {
        Some(err) => Err(err),
        None => Ok(delivered),
    }
}

/// Send a command packet to each device over its declared stack.
///
/// # Errors
///
/// `UnsupportedStack` or `DeviceUnreachable` for the first device that could
/// not be served; later devices are not attempted.
pub async fn dispatch_to_devices<T: Transport>(
    transport: &T,
    devices: &[Device],
    packet: &Packet,
    timeouts: Timeouts,
) -> Result<(), HandleError> {
    let frame = frame::encode(packet)?;

    for device in devices {
        match device.stack()? {
            Stack::Wifi => {
                deliver(transport, &device.endpoint(), &frame, timeouts).await.map_err(|err| {
                    HandleError::DeviceUnreachable {
                        device: device.id.clone(),
                        reason: err.to_string(),
                    }
                })?;
            },
        }
        tracing::debug!(device = %device.id, id = %packet.header.id, "command delivered");
    }

    Ok(())
}
