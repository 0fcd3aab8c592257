//! The AI seam. An [`Advisor`] is consumed as a black box: given a state
//! snapshot and a seat, it returns one decision and has no side effects.
//! The session uses [`Declining`] to play out forfeited seats.

use veche_protocol::{Action, EventId, GameState, PlayerId, RegionId};

/// An input point the game is blocked on for one seat. Carries enough
/// context that an advisor never needs the rules catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecisionPoint {
    /// The seat holds the construction sub-turn.
    ConstructionTurn,
    /// The seat owes a vote on the current event; `default` is the option a
    /// non-participant would pick.
    EventVote { event: EventId, default: u8 },
    /// All event votes are in; anyone may resolve.
    EventResolution { event: EventId },
    AttackVote { target: RegionId },
    AttackExecution,
    FortressVote { target: RegionId },
    FortressExecution,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    Act(Action),
    Pass,
}

pub trait Advisor {
    fn decide(&self, state: &GameState, player: PlayerId, point: DecisionPoint) -> Decision;
}

/// Plays every decision as the declining or default choice: pass the
/// construction sub-turn, take the event default, vote no on plans, and push
/// any fully-voted round to resolution.
#[derive(Clone, Copy, Debug, Default)]
pub struct Declining;

impl Advisor for Declining {
    fn decide(&self, _state: &GameState, _player: PlayerId, point: DecisionPoint) -> Decision {
        let action = match point {
            DecisionPoint::ConstructionTurn => Action::NextPhase,
            DecisionPoint::EventVote { default, .. } => Action::VoteEvent { vote: default },
            DecisionPoint::EventResolution { .. } => Action::ResolveEvent,
            DecisionPoint::AttackVote { .. } => Action::VoteAttack { vote: false },
            DecisionPoint::AttackExecution => Action::ExecuteAttack,
            DecisionPoint::FortressVote { .. } => Action::VoteFortress { vote: false },
            DecisionPoint::FortressExecution => Action::ExecuteFortress,
        };
        Decision::Act(action)
    }
}
