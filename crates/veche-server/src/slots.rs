//! The three faction slots of one room.
//!
//! Slot identity is the seat, not the connection: a reconnect token maps a
//! new client id back to its seat, so a dropped socket does not forfeit a
//! player who returns within the grace period.

use std::time::{Duration, Instant};

use rand::Rng;

use veche_protocol::{Faction, PlayerId, PLAYER_COUNT};

use crate::protocol::SlotView;

/// Connection state of an occupied slot.
#[derive(Clone, Debug)]
pub enum SlotLink {
    Connected { client_id: u64 },
    Disconnected { since: Instant },
    /// Grace period expired; the seat is auto-played from here on.
    Forfeited,
}

#[derive(Clone, Debug)]
struct Slot {
    name: String,
    reconnect_token: String,
    ready: bool,
    link: SlotLink,
}

/// Errors when claiming or re-attaching a slot
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("room not found")]
    RoomNotFound,
    #[error("faction already taken")]
    FactionTaken,
    #[error("game already started")]
    GameInProgress,
    #[error("invalid reconnect token")]
    InvalidToken,
    #[error("player already connected")]
    AlreadyConnected,
}

/// The slot table of one room.
#[derive(Clone, Debug)]
pub struct SlotTable {
    slots: [Option<Slot>; PLAYER_COUNT],
}

impl Default for SlotTable {
    fn default() -> Self {
        Self {
            slots: [None, None, None],
        }
    }
}

impl SlotTable {
    /// Claims an empty faction slot. Rejected once the game has started.
    pub fn claim(
        &mut self,
        faction: Faction,
        name: String,
        client_id: u64,
        game_started: bool,
    ) -> Result<(PlayerId, String), JoinError> {
        if game_started {
            return Err(JoinError::GameInProgress);
        }
        let seat = faction.seat();
        if self.slots[seat].is_some() {
            return Err(JoinError::FactionTaken);
        }
        let token = generate_token();
        self.slots[seat] = Some(Slot {
            name,
            reconnect_token: token.clone(),
            ready: false,
            link: SlotLink::Connected { client_id },
        });
        Ok((PlayerId(seat as u8), token))
    }

    /// Re-attaches a returning player by token. A seat that is still live
    /// rejects a second connection.
    pub fn reconnect(&mut self, client_id: u64, token: &str) -> Result<PlayerId, JoinError> {
        let seat = self
            .slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.reconnect_token == token))
            .ok_or(JoinError::InvalidToken)?;
        let slot = self.slots[seat].as_mut().ok_or(JoinError::InvalidToken)?;
        match slot.link {
            SlotLink::Connected { .. } => Err(JoinError::AlreadyConnected),
            SlotLink::Disconnected { .. } | SlotLink::Forfeited => {
                slot.link = SlotLink::Connected { client_id };
                Ok(PlayerId(seat as u8))
            }
        }
    }

    /// Handles a dropped connection. Before game start the seat is freed for
    /// a new joiner; after start it enters the grace period.
    pub fn disconnect(&mut self, client_id: u64, game_started: bool) -> Option<PlayerId> {
        let seat = self.seat_of_client(client_id)?;
        if game_started {
            if let Some(slot) = self.slots[seat].as_mut() {
                slot.link = SlotLink::Disconnected {
                    since: Instant::now(),
                };
            }
        } else {
            self.slots[seat] = None;
        }
        Some(PlayerId(seat as u8))
    }

    /// Frees a seat outright (pre-game leave) or forfeits it (mid-game).
    pub fn leave(&mut self, client_id: u64, game_started: bool) -> Option<PlayerId> {
        let seat = self.seat_of_client(client_id)?;
        if game_started {
            if let Some(slot) = self.slots[seat].as_mut() {
                slot.link = SlotLink::Forfeited;
            }
        } else {
            self.slots[seat] = None;
        }
        Some(PlayerId(seat as u8))
    }

    /// Forfeits every seat whose grace period has expired. Returns the newly
    /// forfeited seats.
    pub fn process_disconnections(&mut self, grace: Duration) -> Vec<PlayerId> {
        let now = Instant::now();
        let mut forfeited = Vec::new();
        for (seat, slot) in self.slots.iter_mut().enumerate() {
            let Some(slot) = slot else { continue };
            if let SlotLink::Disconnected { since } = slot.link {
                if now.duration_since(since) >= grace {
                    slot.link = SlotLink::Forfeited;
                    forfeited.push(PlayerId(seat as u8));
                }
            }
        }
        forfeited
    }

    pub fn toggle_ready(&mut self, client_id: u64) -> Option<PlayerId> {
        let seat = self.seat_of_client(client_id)?;
        if let Some(slot) = self.slots[seat].as_mut() {
            slot.ready = !slot.ready;
        }
        Some(PlayerId(seat as u8))
    }

    pub fn all_ready(&self) -> bool {
        self.slots
            .iter()
            .all(|s| s.as_ref().is_some_and(|s| s.ready))
    }

    pub fn seat_of_client(&self, client_id: u64) -> Option<usize> {
        self.slots.iter().position(|s| {
            s.as_ref()
                .is_some_and(|s| matches!(s.link, SlotLink::Connected { client_id: c } if c == client_id))
        })
    }

    pub fn client_of_seat(&self, seat: usize) -> Option<u64> {
        match self.slots.get(seat)?.as_ref()?.link {
            SlotLink::Connected { client_id } => Some(client_id),
            _ => None,
        }
    }

    pub fn is_forfeited(&self, seat: usize) -> bool {
        self.slots
            .get(seat)
            .and_then(Option::as_ref)
            .is_some_and(|s| matches!(s.link, SlotLink::Forfeited))
    }

    pub fn occupied_count(&self) -> u8 {
        self.slots.iter().filter(|s| s.is_some()).count() as u8
    }

    /// Client ids of every live connection, for broadcasts.
    pub fn connected_clients(&self) -> Vec<u64> {
        self.slots
            .iter()
            .flatten()
            .filter_map(|s| match s.link {
                SlotLink::Connected { client_id } => Some(client_id),
                _ => None,
            })
            .collect()
    }

    pub fn views(&self) -> Vec<SlotView> {
        Faction::ALL
            .iter()
            .enumerate()
            .map(|(seat, &faction)| {
                let slot = self.slots[seat].as_ref();
                SlotView {
                    faction,
                    name: slot.map(|s| s.name.clone()),
                    ready: slot.is_some_and(|s| s.ready),
                    connected: slot
                        .is_some_and(|s| matches!(s.link, SlotLink::Connected { .. })),
                    forfeited: slot.is_some_and(|s| matches!(s.link, SlotLink::Forfeited)),
                }
            })
            .collect()
    }
}

fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    (0..32)
        .map(|_| {
            let idx = rng.gen_range(0..36);
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'a' + idx - 10) as char
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_reject_duplicate_faction() {
        let mut table = SlotTable::default();
        table
            .claim(Faction::Nobles, "Alexei".into(), 100, false)
            .unwrap();
        let err = table
            .claim(Faction::Nobles, "Boris".into(), 101, false)
            .unwrap_err();
        assert_eq!(err, JoinError::FactionTaken);
    }

    #[test]
    fn pre_game_disconnect_frees_the_slot() {
        let mut table = SlotTable::default();
        table
            .claim(Faction::Merchants, "Marfa".into(), 100, false)
            .unwrap();
        table.disconnect(100, false);
        assert!(table
            .claim(Faction::Merchants, "Pavel".into(), 101, false)
            .is_ok());
    }

    #[test]
    fn reconnect_by_token_after_mid_game_drop() {
        let mut table = SlotTable::default();
        let (seat, token) = table
            .claim(Faction::Commoners, "Vasily".into(), 100, false)
            .unwrap();
        table.disconnect(100, true);
        assert!(table.connected_clients().is_empty());

        let back = table.reconnect(200, &token).unwrap();
        assert_eq!(back, seat);
        assert_eq!(table.client_of_seat(seat.index()), Some(200));
    }

    #[test]
    fn second_live_connection_is_rejected() {
        let mut table = SlotTable::default();
        let (_, token) = table
            .claim(Faction::Nobles, "Alexei".into(), 100, false)
            .unwrap();
        assert_eq!(table.reconnect(200, &token), Err(JoinError::AlreadyConnected));
    }

    #[test]
    fn grace_period_expiry_forfeits() {
        let mut table = SlotTable::default();
        let (seat, _) = table
            .claim(Faction::Nobles, "Alexei".into(), 100, false)
            .unwrap();
        table.disconnect(100, true);

        assert!(table.process_disconnections(Duration::from_secs(60)).is_empty());
        let forfeited = table.process_disconnections(Duration::ZERO);
        assert_eq!(forfeited, vec![seat]);
        assert!(table.is_forfeited(seat.index()));
    }
}
