//! Renet channel configuration.
//!
//! Channel 0: ReliableOrdered - room traffic, actions, state sync
//! Channel 1: Unreliable - ping/heartbeat

use std::time::Duration;

use renet::ChannelConfig;

/// Channel IDs for different message types
pub mod channel_id {
    /// Room lifecycle, actions and state broadcasts - must arrive in order
    pub const ACTIONS: u8 = 0;
    /// Ping/keepalive - can be lost
    pub const HEARTBEAT: u8 = 1;
}

/// Maximum bytes per channel
const MAX_CHANNEL_MEMORY: usize = 5 * 1024 * 1024; // 5 MB

/// Create channel configurations for the session server
pub fn create_channel_configs() -> Vec<ChannelConfig> {
    vec![
        // Channel 0: Actions (ReliableOrdered)
        // Every state broadcast follows exactly one validated action, so the
        // channel must preserve order.
        ChannelConfig {
            channel_id: channel_id::ACTIONS,
            max_memory_usage_bytes: MAX_CHANNEL_MEMORY,
            send_type: renet::SendType::ReliableOrdered {
                resend_time: Duration::from_millis(300),
            },
        },
        // Channel 1: Heartbeat (Unreliable)
        ChannelConfig {
            channel_id: channel_id::HEARTBEAT,
            max_memory_usage_bytes: 64 * 1024, // 64 KB
            send_type: renet::SendType::Unreliable,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_configs_are_valid() {
        let configs = create_channel_configs();
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].channel_id, channel_id::ACTIONS);
        assert_eq!(configs[1].channel_id, channel_id::HEARTBEAT);
    }
}
