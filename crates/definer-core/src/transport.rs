//! Transport abstraction for one-frame-per-connection streams.
//!
//! Production uses TCP (tokio), tests use turmoil's simulated TCP. A
//! connection carries exactly one request frame and at most one response
//! frame, so the trait only needs plain byte streams.

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// Stream transport a hub listens on and dials out through.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Bidirectional byte stream for one connection.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Accept an incoming connection.
    ///
    /// Returns the stream and a printable remote address.
    async fn accept(&self) -> io::Result<(Self::Stream, String)>;

    /// Dial `addr` (`host:port`).
    async fn connect(&self, addr: &str) -> io::Result<Self::Stream>;
}
