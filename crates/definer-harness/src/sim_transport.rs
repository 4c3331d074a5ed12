//! Turmoil transport.

use std::io;

use async_trait::async_trait;
use definer_core::Transport;
use turmoil::net::{TcpListener, TcpStream};

/// [`Transport`] over turmoil's simulated TCP.
///
/// Hosts are addressed by their simulation name, e.g. `hub-a:13789`.
pub struct SimTransport {
    listener: Option<TcpListener>,
}

impl SimTransport {
    /// Listen on `addr` inside the current simulated host.
    pub async fn bind(addr: &str) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener: Some(listener) })
    }

    /// Transport that only dials out.
    pub fn dial_only() -> Self {
        Self { listener: None }
    }
}

#[async_trait]
impl Transport for SimTransport {
    type Stream = TcpStream;

    async fn accept(&self) -> io::Result<(TcpStream, String)> {
        let Some(listener) = &self.listener else {
            return Err(io::Error::new(io::ErrorKind::Unsupported, "transport is dial-only"));
        };
        let (stream, remote) = listener.accept().await?;
        Ok((stream, remote.to_string()))
    }

    async fn connect(&self, addr: &str) -> io::Result<TcpStream> {
        TcpStream::connect(addr).await
    }
}
