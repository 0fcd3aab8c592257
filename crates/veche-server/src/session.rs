//! One room: lobby, ready-check, then an authoritative game.
//!
//! A session processes exactly one inbound message at a time and returns the
//! full list of outbound messages it caused, keyed by client id. Every
//! broadcast snapshot follows exactly one validated action; rejected actions
//! answer the actor alone and change nothing.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use veche_core::advisor::Declining;
use veche_core::{load_catalog, CatalogSource, EventDrawMode, GameEngine};
use veche_protocol::{PlayerId, PLAYER_COUNT};

use crate::protocol::{ClientMessage, RoomView, ServerMessage};
use crate::slots::SlotTable;

/// One outbound message for one client.
pub type Outbound = (u64, ServerMessage);

pub struct Session {
    room_id: String,
    slots: SlotTable,
    engine: Option<GameEngine>,
    draw_mode: EventDrawMode,
    grace: Duration,
    seed: u64,
}

impl Session {
    pub fn new(room_id: String, grace: Duration, draw_mode: EventDrawMode, seed: u64) -> Self {
        Self {
            room_id,
            slots: SlotTable::default(),
            engine: None,
            draw_mode,
            grace,
            seed,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn game_started(&self) -> bool {
        self.engine.is_some()
    }

    pub fn player_count(&self) -> u8 {
        self.slots.occupied_count()
    }

    pub fn view(&self) -> RoomView {
        RoomView {
            room_id: self.room_id.clone(),
            slots: self.slots.views(),
            game_started: self.game_started(),
        }
    }

    /// The authoritative engine, once the game has started.
    pub fn engine(&self) -> Option<&GameEngine> {
        self.engine.as_ref()
    }

    /// Whether this client currently holds a live seat in the room.
    pub fn slots_hold(&self, client_id: u64) -> bool {
        self.slots.seat_of_client(client_id).is_some()
    }

    /// Handles one inbound message from one client.
    pub fn process(&mut self, client_id: u64, msg: ClientMessage) -> Vec<Outbound> {
        let mut out = Vec::new();
        match msg {
            ClientMessage::Join {
                player_name,
                faction,
                reconnect_token,
                ..
            } => match reconnect_token {
                Some(token) => self.handle_reconnect(client_id, &token, &mut out),
                None => self.handle_join(client_id, player_name, faction, &mut out),
            },
            ClientMessage::Ready => self.handle_ready(client_id, &mut out),
            ClientMessage::Action { action } => self.handle_action(client_id, &action, &mut out),
            ClientMessage::Leave => self.handle_leave(client_id, &mut out),
            ClientMessage::Ping { timestamp } => out.push((
                client_id,
                ServerMessage::Pong {
                    client_timestamp: timestamp,
                    server_timestamp: now_millis(),
                },
            )),
            // Room lifecycle messages are handled by the registry.
            ClientMessage::CreateRoom | ClientMessage::RoomInfo { .. } => out.push((
                client_id,
                ServerMessage::Error {
                    error: "unexpected message".into(),
                },
            )),
        }
        out
    }

    /// Handles a dropped connection. Pre-game the slot is freed; mid-game the
    /// grace period starts.
    pub fn handle_disconnect(&mut self, client_id: u64) -> Vec<Outbound> {
        let mut out = Vec::new();
        let started = self.game_started();
        if let Some(player_id) = self.slots.disconnect(client_id, started) {
            info!(room = %self.room_id, player = player_id.0, "player disconnected");
            self.broadcast(
                ServerMessage::RoomUpdate { room: self.view() },
                &mut out,
            );
        }
        out
    }

    /// Periodic housekeeping: expired grace periods become forfeits, and
    /// forfeited seats are auto-played so the table never stalls.
    pub fn tick(&mut self) -> Vec<Outbound> {
        let mut out = Vec::new();
        let forfeited = self.slots.process_disconnections(self.grace);
        for player_id in &forfeited {
            warn!(room = %self.room_id, player = player_id.0, "grace period expired, seat forfeited");
            self.broadcast(
                ServerMessage::PlayerLeft {
                    player_id: *player_id,
                    room: self.view(),
                },
                &mut out,
            );
        }
        if self.auto_resolve() > 0 {
            self.broadcast_state(&mut out);
        }
        out
    }

    fn handle_join(
        &mut self,
        client_id: u64,
        name: String,
        faction: veche_protocol::Faction,
        out: &mut Vec<Outbound>,
    ) {
        let started = self.game_started();
        match self.slots.claim(faction, name, client_id, started) {
            Ok((player_id, token)) => {
                info!(room = %self.room_id, player = player_id.0, ?faction, "player joined");
                out.push((
                    client_id,
                    ServerMessage::Joined {
                        player_id,
                        reconnect_token: token,
                        room: self.view(),
                    },
                ));
                self.broadcast_except(
                    client_id,
                    ServerMessage::RoomUpdate { room: self.view() },
                    out,
                );
            }
            Err(err) => out.push((
                client_id,
                ServerMessage::Error {
                    error: err.to_string(),
                },
            )),
        }
    }

    fn handle_reconnect(&mut self, client_id: u64, token: &str, out: &mut Vec<Outbound>) {
        match self.slots.reconnect(client_id, token) {
            Ok(player_id) => {
                info!(room = %self.room_id, player = player_id.0, "player reconnected");
                out.push((
                    client_id,
                    ServerMessage::Joined {
                        player_id,
                        reconnect_token: token.to_string(),
                        room: self.view(),
                    },
                ));
                // A returning player needs the full snapshot.
                if let Some(engine) = &self.engine {
                    out.push((
                        client_id,
                        ServerMessage::GameStateSync {
                            game_state: engine.state().clone(),
                            checksum: engine.state_hash().unwrap_or(0),
                        },
                    ));
                }
                self.broadcast_except(
                    client_id,
                    ServerMessage::RoomUpdate { room: self.view() },
                    out,
                );
            }
            Err(err) => out.push((
                client_id,
                ServerMessage::Error {
                    error: err.to_string(),
                },
            )),
        }
    }

    fn handle_ready(&mut self, client_id: u64, out: &mut Vec<Outbound>) {
        if self.game_started() {
            out.push((
                client_id,
                ServerMessage::Error {
                    error: "game already started".into(),
                },
            ));
            return;
        }
        if self.slots.toggle_ready(client_id).is_none() {
            out.push((
                client_id,
                ServerMessage::Error {
                    error: "not seated in this room".into(),
                },
            ));
            return;
        }
        self.broadcast(ServerMessage::RoomUpdate { room: self.view() }, out);
        if self.slots.occupied_count() == PLAYER_COUNT as u8 && self.slots.all_ready() {
            self.start_game(out);
        }
    }

    /// All three ready: create the engine, run the opening advance, and
    /// announce the game to everyone.
    fn start_game(&mut self, out: &mut Vec<Outbound>) {
        let catalog = load_catalog(CatalogSource::Embedded).expect("embedded rules data");
        let mut engine = GameEngine::new(catalog, self.seed, self.draw_mode);
        engine.start();
        info!(room = %self.room_id, seed = self.seed, "game started");
        let message = ServerMessage::GameStart {
            room: self.view(),
            game_state: engine.state().clone(),
            checksum: engine.state_hash().unwrap_or(0),
        };
        self.engine = Some(engine);
        self.broadcast(message, out);
    }

    fn handle_action(
        &mut self,
        client_id: u64,
        action: &veche_protocol::Action,
        out: &mut Vec<Outbound>,
    ) {
        let Some(seat) = self.slots.seat_of_client(client_id) else {
            out.push((
                client_id,
                ServerMessage::Error {
                    error: "not seated in this room".into(),
                },
            ));
            return;
        };
        let Some(engine) = self.engine.as_mut() else {
            out.push((
                client_id,
                ServerMessage::Error {
                    error: "game has not started".into(),
                },
            ));
            return;
        };
        match engine.apply_action(PlayerId(seat as u8), action) {
            Ok(()) => {
                out.push((
                    client_id,
                    ServerMessage::ActionResult {
                        action: action.kind().to_string(),
                        success: true,
                        error: None,
                    },
                ));
                self.broadcast_state(out);
            }
            Err(err) => {
                out.push((
                    client_id,
                    ServerMessage::ActionResult {
                        action: action.kind().to_string(),
                        success: false,
                        error: Some(err.to_string()),
                    },
                ));
            }
        }
    }

    fn handle_leave(&mut self, client_id: u64, out: &mut Vec<Outbound>) {
        let started = self.game_started();
        let Some(player_id) = self.slots.leave(client_id, started) else {
            return;
        };
        info!(room = %self.room_id, player = player_id.0, started, "player left");
        self.broadcast(
            ServerMessage::PlayerLeft {
                player_id,
                room: self.view(),
            },
            out,
        );
        // A mid-game leave is an immediate forfeit; keep the table moving.
        if started && self.auto_resolve() > 0 {
            self.broadcast_state(out);
        }
    }

    /// Plays out every forfeited seat with the declining advisor until no
    /// forfeited seat blocks the game.
    fn auto_resolve(&mut self) -> usize {
        let Some(engine) = self.engine.as_mut() else {
            return 0;
        };
        let mut applied = 0;
        for _ in 0..16 {
            let mut progressed = 0;
            for seat in 0..PLAYER_COUNT {
                if self.slots.is_forfeited(seat) {
                    progressed += engine.auto_resolve_for(PlayerId(seat as u8), &Declining);
                }
            }
            if progressed == 0 {
                break;
            }
            applied += progressed;
        }
        applied
    }

    fn broadcast_state(&self, out: &mut Vec<Outbound>) {
        if let Some(engine) = &self.engine {
            self.broadcast(
                ServerMessage::GameStateSync {
                    game_state: engine.state().clone(),
                    checksum: engine.state_hash().unwrap_or(0),
                },
                out,
            );
        }
    }

    fn broadcast(&self, msg: ServerMessage, out: &mut Vec<Outbound>) {
        for client in self.slots.connected_clients() {
            out.push((client, msg.clone()));
        }
    }

    fn broadcast_except(&self, skip: u64, msg: ServerMessage, out: &mut Vec<Outbound>) {
        for client in self.slots.connected_clients() {
            if client != skip {
                out.push((client, msg.clone()));
            }
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
