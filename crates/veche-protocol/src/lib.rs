//! Wire-shared types for the Republic vs. Order game.
//!
//! Everything a client and the authoritative session must agree on lives here:
//! identifiers, the `GameState` value, the `Action` enum, and the MessagePack
//! wire helpers. Game logic lives in `veche-core`; this crate is data only.

pub mod action;
pub mod ids;
pub mod state;
pub mod wire;

pub use action::Action;
pub use ids::{
    BuildingKind, Controller, EquipmentKind, EventId, Faction, PlayerId, RegionId,
};
pub use state::{
    ConstructionState, Effect, EffectKind, EffectTarget, EventState, GameState, Phase, Plan,
    PlayerState, Region, PLAYER_COUNT, TURN_HORIZON,
};
pub use wire::WireError;
