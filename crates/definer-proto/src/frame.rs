//! Length-prefixed frame codec.
//!
//! ```text
//! ┌──────────────┬──────────────────────────────┐
//! │ len: u16 (BE)│ CBOR(Packet), exactly len B  │
//! └──────────────┴──────────────────────────────┘
//! ```
//!
//! Stream transports may hand over a frame in several pieces, so the async
//! reader loops until the declared length has arrived or the peer hangs up.
//! A single `read` is never assumed to return a whole frame.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    errors::{ProtocolError, Result},
    packet::Packet,
};

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// Largest payload the length prefix can describe.
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

/// Serialize `packet` and prepend its big-endian length.
pub fn encode(packet: &Packet) -> Result<Bytes> {
    let mut payload = Vec::new();
    ciborium::ser::into_writer(packet, &mut payload)
        .map_err(|e| ProtocolError::CborEncode(e.to_string()))?;

    let len = u16::try_from(payload.len()).map_err(|_| ProtocolError::FrameTooLarge {
        size: payload.len(),
        max: MAX_PAYLOAD_SIZE,
    })?;

    let mut frame = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    frame.put_u16(len);
    frame.put_slice(&payload);
    Ok(frame.freeze())
}

/// Decode one frame from the front of `bytes`.
///
/// Bytes after the declared payload are ignored; a connection carries a single
/// frame.
pub fn decode(bytes: &[u8]) -> Result<Packet> {
    let [hi, lo, rest @ ..] = bytes else {
        return Err(ProtocolError::TruncatedFrame {
            expected: LENGTH_PREFIX_SIZE,
            available: bytes.len(),
        });
    };

    let declared = usize::from(u16::from_be_bytes([*hi, *lo]));
    let Some(payload) = rest.get(..declared) else {
        return Err(ProtocolError::TruncatedFrame { expected: declared, available: rest.len() });
    };

    decode_payload(payload)
}

/// Deserialize a payload that has already been stripped of its prefix.
pub fn decode_payload(payload: &[u8]) -> Result<Packet> {
    ciborium::de::from_reader(payload).map_err(|e| ProtocolError::MalformedPacket(e.to_string()))
}

/// Read exactly one frame from `reader`.
pub async fn read_frame<R>(reader: &mut R) -> Result<Packet>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    let got = read_full(reader, &mut prefix).await?;
    if got < LENGTH_PREFIX_SIZE {
        return Err(ProtocolError::TruncatedFrame { expected: LENGTH_PREFIX_SIZE, available: got });
    }

    let declared = usize::from(u16::from_be_bytes(prefix));
    let mut payload = vec![0u8; declared];
    let got = read_full(reader, &mut payload).await?;
    if got < declared {
        return Err(ProtocolError::TruncatedFrame { expected: declared, available: got });
    }

    decode_payload(&payload)
}

/// Encode `packet` and write the whole frame to `writer`.
pub async fn write_frame<W>(writer: &mut W, packet: &Packet) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode(packet)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Fill `buf` from `reader`, returning how many bytes arrived before EOF.
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
