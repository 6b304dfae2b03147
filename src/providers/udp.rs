//! UDP broadcast source

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tracing::{debug, info, trace};

use crate::config::{DEFAULT_BIND_ADDRESS, Settings};
use crate::provider::DatagramSource;
use crate::{Result, TelemetryError};

/// Largest datagram the socket will accept.
pub const MAX_DATAGRAM_SIZE: usize = 65_535;

/// Receives telemetry datagrams broadcast by the game.
pub struct UdpSource {
    socket: UdpSocket,
    buffer: Vec<u8>,
    received: u64,
}

impl UdpSource {
    /// Bind to `address`, e.g. `0.0.0.0:5606`.
    pub async fn bind(address: &str) -> Result<Self> {
        let socket = UdpSocket::bind(address)
            .await
            .map_err(|e| TelemetryError::capture_io(format!("cannot bind {address}"), e))?;
        info!("Listening for telemetry on {}", address);
        Ok(Self { socket, buffer: vec![0; MAX_DATAGRAM_SIZE], received: 0 })
    }

    /// Bind to the game's default broadcast port.
    pub async fn bind_default() -> Result<Self> {
        Self::bind(DEFAULT_BIND_ADDRESS).await
    }

    /// Bind to the address named in the settings.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        Self::bind(settings.bind_address()).await
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket
            .local_addr()
            .map_err(|e| TelemetryError::capture_io("socket has no local address", e))
    }

    pub fn datagrams_received(&self) -> u64 {
        self.received
    }
}

#[async_trait::async_trait]
impl DatagramSource for UdpSource {
    async fn next_datagram(&mut self) -> Result<Option<Vec<u8>>> {
        let (len, peer) = self
            .socket
            .recv_from(&mut self.buffer)
            .await
            .map_err(|e| TelemetryError::capture_io("receive failed", e))?;
        self.received += 1;
        if self.received == 1 {
            debug!("First datagram from {}", peer);
        }
        trace!("Datagram {}: {} bytes from {}", self.received, len, peer);
        Ok(Some(self.buffer[..len].to_vec()))
    }

    fn source_name(&self) -> String {
        match self.socket.local_addr() {
            Ok(addr) => format!("udp://{addr}"),
            Err(_) => "udp".to_string(),
        }
    }
}
