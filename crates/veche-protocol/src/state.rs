use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{BuildingKind, Controller, EventId, Faction, RegionId};

/// Exactly three seats, always.
pub const PLAYER_COUNT: usize = 3;

/// The game ends (by score) once the turn counter passes this.
pub const TURN_HORIZON: u32 = 20;

/// Phase cycle within one game turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Resources,
    Construction,
    Events,
    Veche,
}

/// One seat's holdings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub faction: Faction,
    /// Non-negative; even cost splits can leave fractions.
    pub money: f64,
    pub weapons: u8,
    pub armor: u8,
    /// Standing buildings of this faction; doubles as the victory score.
    pub improvements: u32,
}

impl PlayerState {
    pub fn new(faction: Faction, money: f64) -> Self {
        Self {
            faction,
            money,
            weapons: 0,
            armor: 0,
            improvements: 0,
        }
    }
}

/// One territory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub controller: Controller,
    pub fortress: bool,
    pub buildings: BTreeMap<BuildingKind, u8>,
}

impl Region {
    pub fn republic() -> Self {
        Self {
            controller: Controller::Republic,
            fortress: false,
            buildings: BTreeMap::new(),
        }
    }

    pub fn order() -> Self {
        Self {
            controller: Controller::Order,
            fortress: false,
            buildings: BTreeMap::new(),
        }
    }

    pub fn is_republic(&self) -> bool {
        self.controller == Controller::Republic
    }

    pub fn is_order(&self) -> bool {
        self.controller == Controller::Order
    }

    pub fn building_count(&self) -> u32 {
        self.buildings.values().map(|&n| u32::from(n)).sum()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    StrengthBonus,
    StrengthPenalty,
    IncomePenalty,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectTarget {
    All,
    Faction(Faction),
}

impl EffectTarget {
    pub fn applies_to(self, faction: Faction) -> bool {
        match self {
            EffectTarget::All => true,
            EffectTarget::Faction(f) => f == faction,
        }
    }
}

/// A timed modifier. Invariant: `turns_remaining > 0` for every effect in
/// `GameState::active_effects`; decay removes effects that reach zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    pub target: EffectTarget,
    pub value: f64,
    pub turns_remaining: u32,
}

/// Construction-phase substate: whose sub-turn it is and who already acted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstructionState {
    pub current_player: u8,
    pub selected_region: RegionId,
    /// One building per player per turn.
    pub built: [bool; PLAYER_COUNT],
    /// One equipment purchase per player per turn.
    pub bought: [bool; PLAYER_COUNT],
}

impl ConstructionState {
    pub fn fresh() -> Self {
        Self {
            current_player: 0,
            selected_region: RegionId::CAPITAL,
            built: [false; PLAYER_COUNT],
            bought: [false; PLAYER_COUNT],
        }
    }
}

/// Events-phase substate for the currently drawn card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventState {
    pub id: EventId,
    /// Per-seat vote, as an option index into the card's option list.
    /// Participation and order-attack cards use 0 = join/defend, 1 = decline.
    pub votes: [Option<u8>; PLAYER_COUNT],
    pub resolved: bool,
    /// Cosmetic card-face flag; cleared on draw, set on resolve.
    pub card_revealed: bool,
    /// Chosen target for order-attack cards, fixed at draw time.
    pub attack_target: Option<RegionId>,
    /// Human-readable outcome of the last resolution.
    pub last_result: Option<String>,
}

impl EventState {
    pub fn drawn(id: EventId, attack_target: Option<RegionId>) -> Self {
        Self {
            id,
            votes: [None; PLAYER_COUNT],
            resolved: false,
            card_revealed: false,
            attack_target,
            last_result: None,
        }
    }

    pub fn all_votes_cast(&self) -> bool {
        self.votes.iter().all(Option::is_some)
    }
}

/// Veche-phase funding round for an attack or a fortress.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub target: RegionId,
    pub votes: [Option<bool>; PLAYER_COUNT],
}

impl Plan {
    pub fn new(target: RegionId) -> Self {
        Self {
            target,
            votes: [None; PLAYER_COUNT],
        }
    }

    pub fn all_votes_cast(&self) -> bool {
        self.votes.iter().all(Option::is_some)
    }

    pub fn backers(&self) -> Vec<usize> {
        self.votes
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == Some(true))
            .map(|(i, _)| i)
            .collect()
    }
}

/// The single root value. Replaced wholesale on every transition; never
/// mutated in place by the session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub turn: u32,
    pub phase: Phase,
    pub players: [PlayerState; PLAYER_COUNT],
    pub regions: BTreeMap<RegionId, Region>,
    pub active_effects: Vec<Effect>,
    pub construction: ConstructionState,
    pub event: Option<EventState>,
    pub attack_plan: Option<Plan>,
    pub fortress_plan: Option<Plan>,
    /// True only when the capital has been lost. Turn-horizon completion is a
    /// separate, non-fatal terminal condition (`is_complete`).
    pub game_over: bool,
}

impl GameState {
    pub fn republic_region_count(&self) -> u32 {
        self.regions
            .values()
            .filter(|r| r.controller == Controller::Republic)
            .count() as u32
    }

    /// Turn horizon reached: scores stand, no further phase advancement.
    pub fn is_complete(&self) -> bool {
        self.turn > TURN_HORIZON
    }

    /// Either terminal condition.
    pub fn is_finished(&self) -> bool {
        self.game_over || self.is_complete()
    }

    pub fn player(&self, index: usize) -> &PlayerState {
        &self.players[index]
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_target_scoping() {
        assert!(EffectTarget::All.applies_to(Faction::Merchants));
        assert!(EffectTarget::Faction(Faction::Nobles).applies_to(Faction::Nobles));
        assert!(!EffectTarget::Faction(Faction::Nobles).applies_to(Faction::Commoners));
    }

    #[test]
    fn region_constructors_set_the_controller() {
        assert!(Region::republic().is_republic());
        assert!(!Region::republic().is_order());
        assert!(Region::order().is_order());
        assert!(!Region::order().is_republic());
    }

    #[test]
    fn plan_backers() {
        let mut plan = Plan::new(RegionId::Pskov);
        plan.votes = [Some(true), Some(false), Some(true)];
        assert!(plan.all_votes_cast());
        assert_eq!(plan.backers(), vec![0, 2]);
    }

    #[test]
    fn fresh_construction_points_at_capital() {
        let c = ConstructionState::fresh();
        assert_eq!(c.current_player, 0);
        assert_eq!(c.selected_region, RegionId::Novgorod);
        assert_eq!(c.built, [false; 3]);
    }
}
