//! Authoritative game engine for Republic vs. Order.
//!
//! The engine is deterministic: every outcome that affects fairness (battle
//! rolls, event targets, building fires) is drawn from one seeded
//! [`SessionRng`] owned by the engine, and every transition replaces the
//! whole [`GameState`](veche_protocol::GameState) value. Networking and
//! session bookkeeping live in `veche-server`; this crate never blocks and
//! never talks to a socket.

pub mod advisor;
pub mod catalog;
pub mod combat;
pub mod effects;
pub mod engine;
pub mod events;
pub mod machine;
pub mod regions;
pub mod rng;
pub mod validator;

pub use advisor::{Advisor, Decision, DecisionPoint};
pub use catalog::{
    load_catalog, Catalog, CatalogSource, EffectScope, EffectSpec, EventDef, EventKind, RulesError,
    VoteOption,
};
pub use engine::GameEngine;
pub use events::{EventDraw, EventDrawMode};
pub use regions::RegionGraph;
pub use rng::SessionRng;
pub use validator::ValidationError;
