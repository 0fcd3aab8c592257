//! Republic vs. Order session server binary.
//!
//! Synchronous fixed-tick loop: pump the transport, route messages through
//! the room registry, send the answers, run per-room housekeeping.

use std::time::{Duration, Instant};

use renet::{ConnectionConfig, RenetServer, ServerEvent};
use tracing::{info, warn};

use veche_server::{
    channel_id, create_channel_configs,
    protocol::{deserialize_client_message, serialize_server_message, ClientMessage, ServerMessage},
    rooms::RoomRegistry,
    session::Outbound,
    ServerConfig, ServerRunner, TransportConfig,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config();
    info!(bind = %config.bind_address, "starting session server");

    let connection_config = ConnectionConfig {
        available_bytes_per_tick: 60_000,
        server_channels_config: create_channel_configs(),
        client_channels_config: create_channel_configs(),
    };
    let mut renet = RenetServer::new(connection_config);

    let transport_config = TransportConfig {
        public_address: config.bind_address,
        ..Default::default()
    };
    let mut runner = match ServerRunner::new(transport_config) {
        Ok(runner) => runner,
        Err(err) => {
            eprintln!("failed to start transport: {err}");
            std::process::exit(1);
        }
    };
    if let Some(addr) = runner.local_addr() {
        info!(%addr, "listening");
    }

    let mut registry = RoomRegistry::new(config.disconnect_grace, config.event_draw_mode);
    let mut last_tick = Instant::now();

    loop {
        let start = Instant::now();
        let delta = last_tick.elapsed();
        last_tick = start;

        renet.update(delta);
        runner.update(&mut renet, delta);

        while let Some(event) = renet.get_event() {
            match event {
                ServerEvent::ClientConnected { client_id } => {
                    info!(client_id, "client connected");
                }
                ServerEvent::ClientDisconnected { client_id, reason } => {
                    info!(client_id, %reason, "client disconnected");
                    let out = registry.handle_disconnect(client_id);
                    send_all(&mut renet, out);
                }
            }
        }

        for client_id in renet.clients_id() {
            while let Some(bytes) = renet.receive_message(client_id, channel_id::ACTIONS) {
                handle_message(&mut renet, &mut registry, client_id, &bytes);
            }
            while let Some(bytes) = renet.receive_message(client_id, channel_id::HEARTBEAT) {
                handle_message(&mut renet, &mut registry, client_id, &bytes);
            }
        }

        let out = registry.tick();
        send_all(&mut renet, out);

        runner.update(&mut renet, Duration::ZERO);

        if let Some(sleep_time) = config.tick_interval.checked_sub(start.elapsed()) {
            std::thread::sleep(sleep_time);
        }
    }
}

fn handle_message(
    renet: &mut RenetServer,
    registry: &mut RoomRegistry,
    client_id: u64,
    bytes: &[u8],
) {
    let msg = match deserialize_client_message(bytes) {
        Ok(msg) => msg,
        // Malformed input never mutates anything; answer with a generic
        // protocol error.
        Err(err) => {
            warn!(client_id, %err, "malformed client message");
            let reply = ServerMessage::Error {
                error: "malformed message".into(),
            };
            send_all(renet, vec![(client_id, reply)]);
            return;
        }
    };
    let is_ping = matches!(msg, ClientMessage::Ping { .. });
    let out = registry.handle_message(client_id, msg);
    if is_ping {
        send_on(renet, out, channel_id::HEARTBEAT);
    } else {
        send_all(renet, out);
    }
}

fn send_all(renet: &mut RenetServer, out: Vec<Outbound>) {
    send_on(renet, out, channel_id::ACTIONS);
}

fn send_on(renet: &mut RenetServer, out: Vec<Outbound>, channel: u8) {
    for (client_id, msg) in out {
        match serialize_server_message(&msg) {
            Ok(bytes) => renet.send_message(client_id, channel, bytes),
            Err(err) => warn!(client_id, %err, "failed to serialize server message"),
        }
    }
}

fn load_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    if let Ok(bind) = std::env::var("VECHE_BIND") {
        match bind.parse() {
            Ok(addr) => config.bind_address = addr,
            Err(err) => warn!(%bind, %err, "ignoring invalid VECHE_BIND"),
        }
    }
    if let Ok(grace) = std::env::var("VECHE_GRACE_SECS") {
        match grace.parse::<u64>() {
            Ok(secs) => config.disconnect_grace = Duration::from_secs(secs),
            Err(err) => warn!(%grace, %err, "ignoring invalid VECHE_GRACE_SECS"),
        }
    }
    if std::env::var("VECHE_CYCLIC_EVENTS").is_ok() {
        config.event_draw_mode = veche_core::EventDrawMode::Cyclic;
    }
    config
}
