//! Room registry: shareable codes and message routing.

use std::collections::HashMap;
use std::time::Duration;

use rand::Rng;
use tracing::info;

use veche_core::EventDrawMode;

use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::{Outbound, Session};

/// Room codes are short, human-shareable, uppercase alphanumeric.
pub const ROOM_CODE_LEN: usize = 6;

pub struct RoomRegistry {
    rooms: HashMap<String, Session>,
    /// Which room each live client belongs to.
    client_rooms: HashMap<u64, String>,
    grace: Duration,
    draw_mode: EventDrawMode,
}

impl RoomRegistry {
    pub fn new(grace: Duration, draw_mode: EventDrawMode) -> Self {
        Self {
            rooms: HashMap::new(),
            client_rooms: HashMap::new(),
            grace,
            draw_mode,
        }
    }

    pub fn room(&self, room_id: &str) -> Option<&Session> {
        self.rooms.get(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Routes one inbound message. Room lifecycle requests are answered
    /// here; everything else goes to the client's session.
    pub fn handle_message(&mut self, client_id: u64, msg: ClientMessage) -> Vec<Outbound> {
        match msg {
            ClientMessage::CreateRoom => {
                let room_id = self.generate_code();
                let seed = rand::thread_rng().gen::<u64>();
                self.rooms.insert(
                    room_id.clone(),
                    Session::new(room_id.clone(), self.grace, self.draw_mode, seed),
                );
                info!(room = %room_id, "room created");
                vec![(client_id, ServerMessage::RoomCreated { room_id })]
            }
            ClientMessage::RoomInfo { room_id } => match self.rooms.get(&room_id) {
                Some(session) => vec![(
                    client_id,
                    ServerMessage::RoomInfo {
                        room: session.view(),
                        game_started: session.game_started(),
                        player_count: session.player_count(),
                    },
                )],
                None => vec![(
                    client_id,
                    ServerMessage::Error {
                        error: "room not found".into(),
                    },
                )],
            },
            ClientMessage::Join { ref room_id, .. } => {
                let room_id = room_id.clone();
                let Some(session) = self.rooms.get_mut(&room_id) else {
                    return vec![(
                        client_id,
                        ServerMessage::Error {
                            error: "room not found".into(),
                        },
                    )];
                };
                let out = session.process(client_id, msg);
                if session.slots_hold(client_id) {
                    self.client_rooms.insert(client_id, room_id);
                }
                out
            }
            other => {
                let Some(room_id) = self.client_rooms.get(&client_id) else {
                    return vec![(
                        client_id,
                        ServerMessage::Error {
                            error: "not in a room".into(),
                        },
                    )];
                };
                let Some(session) = self.rooms.get_mut(room_id) else {
                    return vec![(
                        client_id,
                        ServerMessage::Error {
                            error: "room not found".into(),
                        },
                    )];
                };
                let out = session.process(client_id, other);
                if !session.slots_hold(client_id) {
                    self.client_rooms.remove(&client_id);
                }
                out
            }
        }
    }

    pub fn handle_disconnect(&mut self, client_id: u64) -> Vec<Outbound> {
        let Some(room_id) = self.client_rooms.remove(&client_id) else {
            return Vec::new();
        };
        match self.rooms.get_mut(&room_id) {
            Some(session) => session.handle_disconnect(client_id),
            None => Vec::new(),
        }
    }

    /// Housekeeping across every room: grace expiry and forfeit auto-play.
    pub fn tick(&mut self) -> Vec<Outbound> {
        let mut out = Vec::new();
        for session in self.rooms.values_mut() {
            out.extend(session.tick());
        }
        out
    }

    fn generate_code(&self) -> String {
        const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
        let mut rng = rand::thread_rng();
        loop {
            let code: String = (0..ROOM_CODE_LEN)
                .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
                .collect();
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> RoomRegistry {
        RoomRegistry::new(Duration::from_secs(120), EventDrawMode::Cyclic)
    }

    fn created_room_id(out: &[Outbound]) -> String {
        match &out[0].1 {
            ServerMessage::RoomCreated { room_id } => room_id.clone(),
            other => panic!("expected RoomCreated, got {other:?}"),
        }
    }

    #[test]
    fn create_then_query() {
        let mut registry = registry();
        let out = registry.handle_message(1, ClientMessage::CreateRoom);
        let room_id = created_room_id(&out);
        assert_eq!(room_id.len(), ROOM_CODE_LEN);

        let out = registry.handle_message(1, ClientMessage::RoomInfo { room_id });
        match &out[0].1 {
            ServerMessage::RoomInfo {
                game_started,
                player_count,
                ..
            } => {
                assert!(!game_started);
                assert_eq!(*player_count, 0);
            }
            other => panic!("expected RoomInfo, got {other:?}"),
        }
    }

    #[test]
    fn unknown_room_is_an_error() {
        let mut registry = registry();
        let out = registry.handle_message(
            1,
            ClientMessage::RoomInfo {
                room_id: "NOSUCH".into(),
            },
        );
        assert!(matches!(out[0].1, ServerMessage::Error { .. }));
    }

    #[test]
    fn messages_outside_a_room_are_rejected() {
        let mut registry = registry();
        let out = registry.handle_message(7, ClientMessage::Ready);
        assert!(matches!(out[0].1, ServerMessage::Error { .. }));
    }
}
