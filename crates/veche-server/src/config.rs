//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use veche_core::EventDrawMode;

/// Server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the server
    pub bind_address: SocketAddr,
    /// Grace period before a mid-game disconnect becomes a forfeit
    pub disconnect_grace: Duration,
    /// Fixed server tick interval
    pub tick_interval: Duration,
    /// How the events phase draws cards (`cyclic` is the debug mode)
    pub event_draw_mode: EventDrawMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:7777".parse().unwrap(),
            disconnect_grace: Duration::from_secs(120),
            tick_interval: Duration::from_millis(16),
            event_draw_mode: EventDrawMode::Random,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ServerConfig::default();
        assert_eq!(config.disconnect_grace, Duration::from_secs(120));
        assert_eq!(config.event_draw_mode, EventDrawMode::Random);
    }
}
