//! Network protocol messages for the session layer.
//!
//! Extends veche-protocol with room and lobby messages.

use serde::{Deserialize, Serialize};

use veche_protocol::{Action, Faction, GameState, PlayerId};

/// Client-to-server messages
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Create a new room; the reply carries its shareable code
    CreateRoom,
    /// Query a room without joining it
    RoomInfo { room_id: String },
    /// Claim a faction slot, or re-attach with a reconnect token
    Join {
        room_id: String,
        player_name: String,
        faction: Faction,
        reconnect_token: Option<String>,
    },
    /// Toggle ready state; all three ready starts the game
    Ready,
    /// Submit one game action
    Action { action: Action },
    /// Release the slot (forfeits after game start)
    Leave,
    /// Ping for latency measurement
    Ping { timestamp: u64 },
}

/// Server-to-client messages
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Room created; code is shareable
    RoomCreated { room_id: String },
    /// Room query response
    RoomInfo {
        room: RoomView,
        game_started: bool,
        player_count: u8,
    },
    /// Slot claimed (or re-attached)
    Joined {
        player_id: PlayerId,
        reconnect_token: String,
        room: RoomView,
    },
    /// Lobby membership or readiness changed
    RoomUpdate { room: RoomView },
    /// All three seats ready; play begins
    GameStart {
        room: RoomView,
        game_state: GameState,
        checksum: u64,
    },
    /// Authoritative snapshot after a validated action
    GameStateSync { game_state: GameState, checksum: u64 },
    /// Outcome of one submitted action, sent to the actor only
    ActionResult {
        action: String,
        success: bool,
        error: Option<String>,
    },
    /// A seat left or forfeited
    PlayerLeft { player_id: PlayerId, room: RoomView },
    /// Protocol or room error
    Error { error: String },
    /// Pong response
    Pong {
        client_timestamp: u64,
        server_timestamp: u64,
    },
}

/// One room as clients see it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoomView {
    pub room_id: String,
    pub slots: Vec<SlotView>,
    pub game_started: bool,
}

/// One faction slot as clients see it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SlotView {
    pub faction: Faction,
    pub name: Option<String>,
    pub ready: bool,
    pub connected: bool,
    pub forfeited: bool,
}

/// Serialize a client message for network transmission
pub fn serialize_client_message(msg: &ClientMessage) -> Result<Vec<u8>, rmp_serde::encode::Error> {
    rmp_serde::encode::to_vec(msg)
}

/// Deserialize a client message from network data
pub fn deserialize_client_message(data: &[u8]) -> Result<ClientMessage, rmp_serde::decode::Error> {
    rmp_serde::decode::from_slice(data)
}

/// Serialize a server message for network transmission
pub fn serialize_server_message(msg: &ServerMessage) -> Result<Vec<u8>, rmp_serde::encode::Error> {
    rmp_serde::encode::to_vec(msg)
}

/// Deserialize a server message from network data
pub fn deserialize_server_message(data: &[u8]) -> Result<ServerMessage, rmp_serde::decode::Error> {
    rmp_serde::decode::from_slice(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_client_message() {
        let msg = ClientMessage::Join {
            room_id: "A1B2C3".into(),
            player_name: "Marfa".into(),
            faction: Faction::Merchants,
            reconnect_token: None,
        };
        let data = serialize_client_message(&msg).unwrap();
        let decoded = deserialize_client_message(&data).unwrap();

        match decoded {
            ClientMessage::Join {
                room_id, faction, ..
            } => {
                assert_eq!(room_id, "A1B2C3");
                assert_eq!(faction, Faction::Merchants);
            }
            other => panic!("wrong message type: {other:?}"),
        }
    }

    #[test]
    fn roundtrip_server_message() {
        let msg = ServerMessage::ActionResult {
            action: "NEXT_PHASE".into(),
            success: false,
            error: Some("not your turn".into()),
        };
        let data = serialize_server_message(&msg).unwrap();
        let decoded = deserialize_server_message(&data).unwrap();

        match decoded {
            ServerMessage::ActionResult {
                action, success, ..
            } => {
                assert_eq!(action, "NEXT_PHASE");
                assert!(!success);
            }
            other => panic!("wrong message type: {other:?}"),
        }
    }
}
