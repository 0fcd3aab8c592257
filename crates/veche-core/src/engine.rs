//! The authoritative engine: one seeded RNG, one catalog, one state value.
//!
//! `apply_action` is the only mutation entry point: validate first, then run
//! the transition on a clone and replace the root wholesale, so a rejected
//! action can never leave a half-applied snapshot behind.

use veche_protocol::{wire, Action, EventId, GameState, Phase, PlayerId, WireError};

use crate::advisor::{Advisor, Decision, DecisionPoint};
use crate::catalog::{Catalog, EventKind};
use crate::events::{self, EventDraw, EventDrawMode};
use crate::machine;
use crate::rng::SessionRng;
use crate::validator::{self, ValidationError};

pub struct GameEngine {
    state: GameState,
    catalog: Catalog,
    rng: SessionRng,
    draw: EventDraw,
}

impl GameEngine {
    pub fn new(catalog: Catalog, seed: u64, mode: EventDrawMode) -> Self {
        Self {
            state: machine::new_game(&catalog),
            catalog,
            rng: SessionRng::seed_from_u64(seed),
            draw: EventDraw::new(mode),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Runs the one advance that makes a new game playable: income lands and
    /// the phase moves from `resources` to `construction`.
    pub fn start(&mut self) {
        if self.state.phase == Phase::Resources {
            machine::advance_phase(&mut self.state, &self.catalog, &mut self.rng, &mut self.draw);
        }
    }

    /// Replaces everything with a fresh game under a new seed and starts it.
    pub fn reset(&mut self, seed: u64) {
        self.rng = SessionRng::seed_from_u64(seed);
        self.draw = EventDraw::new(self.draw.mode);
        self.state = machine::new_game(&self.catalog);
        self.start();
    }

    /// Hash of the current snapshot, for sync checks alongside broadcasts.
    pub fn state_hash(&self) -> Result<u64, WireError> {
        wire::state_hash(&self.state)
    }

    /// Validates and applies one action from one seat. On rejection the
    /// state is untouched and the reason is returned.
    pub fn apply_action(&mut self, actor: PlayerId, action: &Action) -> Result<(), ValidationError> {
        validator::validate(&self.state, &self.catalog, actor, action)?;

        if matches!(action, Action::ResetGame) {
            let seed = self.rng.next_u64();
            self.reset(seed);
            return Ok(());
        }

        let mut next = self.state.clone();
        let seat = actor.index();
        match action {
            Action::NextPhase => {
                machine::advance_phase(&mut next, &self.catalog, &mut self.rng, &mut self.draw)
            }
            Action::BuildBuilding { building, region } => {
                machine::build_building(&mut next, seat, *building, *region)
            }
            Action::BuyEquipment { item } => machine::buy_equipment(&mut next, seat, *item),
            Action::VoteEvent { vote } => {
                if let Some(event) = next.event.as_mut() {
                    event.votes[seat] = Some(*vote);
                }
            }
            Action::ResolveEvent => events::resolve_event(&mut next, &self.catalog, &mut self.rng),
            Action::InitiateAttack { target } => machine::initiate_attack(&mut next, *target),
            Action::VoteAttack { vote } => machine::vote_attack(&mut next, seat, *vote),
            Action::ExecuteAttack => machine::execute_attack(&mut next, &mut self.rng),
            Action::CancelAttack => machine::cancel_attack(&mut next),
            Action::InitiateFortress { target } => machine::initiate_fortress(&mut next, *target),
            Action::VoteFortress { vote } => machine::vote_fortress(&mut next, seat, *vote),
            Action::ExecuteFortress => machine::execute_fortress(&mut next),
            Action::CancelFortress => machine::cancel_fortress(&mut next),
            Action::ResetGame => unreachable!("handled above"),
        }
        self.state = next;
        Ok(())
    }

    /// The input point currently blocking on `seat`, if any.
    pub fn pending_decision(&self, seat: usize) -> Option<DecisionPoint> {
        if self.state.is_finished() {
            return None;
        }
        match self.state.phase {
            Phase::Resources => None,
            Phase::Construction => {
                if usize::from(self.state.construction.current_player) == seat {
                    Some(DecisionPoint::ConstructionTurn)
                } else {
                    None
                }
            }
            Phase::Events => {
                let event = self.state.event.as_ref()?;
                if event.resolved {
                    return None;
                }
                if matches!(
                    self.catalog.event(event.id).kind,
                    EventKind::Immediate { .. }
                ) {
                    return Some(DecisionPoint::EventResolution { event: event.id });
                }
                if event.votes[seat].is_none() {
                    return Some(DecisionPoint::EventVote {
                        event: event.id,
                        default: self.declining_vote(event.id),
                    });
                }
                if event.all_votes_cast() {
                    return Some(DecisionPoint::EventResolution { event: event.id });
                }
                None
            }
            Phase::Veche => {
                if let Some(plan) = &self.state.attack_plan {
                    if plan.votes[seat].is_none() {
                        return Some(DecisionPoint::AttackVote {
                            target: plan.target,
                        });
                    }
                    if plan.all_votes_cast() {
                        return Some(DecisionPoint::AttackExecution);
                    }
                }
                if let Some(plan) = &self.state.fortress_plan {
                    if plan.votes[seat].is_none() {
                        return Some(DecisionPoint::FortressVote {
                            target: plan.target,
                        });
                    }
                    if plan.all_votes_cast() {
                        return Some(DecisionPoint::FortressExecution);
                    }
                }
                None
            }
        }
    }

    /// Plays out everything currently blocking on `seat` using the given
    /// advisor. Returns the number of actions applied. Used by the session
    /// to keep a game moving once a seat is forfeited.
    pub fn auto_resolve_for(&mut self, actor: PlayerId, advisor: &dyn Advisor) -> usize {
        let mut applied = 0;
        // Bounded: a seat can owe at most a handful of inputs per phase.
        for _ in 0..8 {
            let Some(point) = self.pending_decision(actor.index()) else {
                break;
            };
            match advisor.decide(&self.state, actor, point) {
                Decision::Act(action) => {
                    if self.apply_action(actor, &action).is_err() {
                        break;
                    }
                    applied += 1;
                }
                Decision::Pass => break,
            }
        }
        applied
    }

    /// Vote a non-participant would cast on this card: the declared default
    /// for voting cards, decline for everything else.
    fn declining_vote(&self, event: EventId) -> u8 {
        match self.catalog.event(event).kind {
            EventKind::Voting { default, .. } => default,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::Declining;
    use crate::catalog::{load_catalog, CatalogSource};
    use veche_protocol::RegionId;

    fn engine(seed: u64) -> GameEngine {
        let catalog = load_catalog(CatalogSource::Embedded).unwrap();
        let mut engine = GameEngine::new(catalog, seed, EventDrawMode::Cyclic);
        engine.start();
        engine
    }

    #[test]
    fn start_lands_on_construction_with_income() {
        let engine = engine(1);
        assert_eq!(engine.state().phase, Phase::Construction);
        // Starting 2.0 plus first income 2.0.
        assert_eq!(engine.state().player(0).money, 4.0);
    }

    #[test]
    fn rejection_leaves_the_state_untouched() {
        let mut engine = engine(2);
        let before = engine.state().clone();
        let err = engine
            .apply_action(PlayerId(1), &Action::NextPhase)
            .unwrap_err();
        assert_eq!(err, ValidationError::NotYourTurn);
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn same_seed_same_history_same_hash() {
        let mut a = engine(77);
        let mut b = engine(77);
        let script = [
            (PlayerId(0), Action::NextPhase),
            (PlayerId(1), Action::NextPhase),
            (PlayerId(2), Action::NextPhase),
        ];
        for (actor, action) in &script {
            a.apply_action(*actor, action).unwrap();
            b.apply_action(*actor, action).unwrap();
        }
        assert_eq!(a.state(), b.state());
        assert_eq!(a.state_hash().unwrap(), b.state_hash().unwrap());
    }

    #[test]
    fn resolving_a_resolved_event_is_rejected_without_repeating_it() {
        let mut engine = engine(21);
        for seat in 0..3 {
            engine
                .apply_action(PlayerId(seat), &Action::NextPhase)
                .unwrap();
        }
        assert_eq!(engine.state().phase, Phase::Events);
        engine
            .apply_action(PlayerId(0), &Action::ResolveEvent)
            .unwrap();
        let after_first = engine.state().clone();

        let err = engine
            .apply_action(PlayerId(1), &Action::ResolveEvent)
            .unwrap_err();
        assert_eq!(err, ValidationError::EventAlreadyResolved);
        // The caravan payout in particular must not land twice.
        assert_eq!(engine.state(), &after_first);
    }

    #[test]
    fn reset_produces_a_fresh_started_game() {
        let mut engine = engine(5);
        engine.apply_action(PlayerId(0), &Action::NextPhase).unwrap();
        engine.apply_action(PlayerId(0), &Action::ResetGame).unwrap();
        assert_eq!(engine.state().turn, 1);
        assert_eq!(engine.state().phase, Phase::Construction);
        assert_eq!(engine.state().construction.current_player, 0);
    }

    #[test]
    fn declining_advisor_unblocks_a_stuck_construction_turn() {
        let mut engine = engine(9);
        assert_eq!(
            engine.pending_decision(0),
            Some(DecisionPoint::ConstructionTurn)
        );
        let applied = engine.auto_resolve_for(PlayerId(0), &Declining);
        assert_eq!(applied, 1);
        assert_eq!(engine.state().construction.current_player, 1);
        assert_eq!(engine.pending_decision(0), None);
    }

    #[test]
    fn declining_advisor_votes_no_on_plans() {
        let mut engine = engine(13);
        // Walk to the veche phase.
        for seat in 0..3 {
            engine
                .apply_action(PlayerId(seat), &Action::NextPhase)
                .unwrap();
        }
        assert_eq!(engine.state().phase, Phase::Events);
        // The first cyclic card is immediate; anyone may resolve it.
        assert!(matches!(
            engine.pending_decision(1),
            Some(DecisionPoint::EventResolution { .. })
        ));
        engine
            .apply_action(PlayerId(0), &Action::ResolveEvent)
            .unwrap();
        engine.apply_action(PlayerId(0), &Action::NextPhase).unwrap();
        assert_eq!(engine.state().phase, Phase::Veche);

        engine
            .apply_action(
                PlayerId(0),
                &Action::InitiateFortress {
                    target: RegionId::Ladoga,
                },
            )
            .unwrap();
        engine.auto_resolve_for(PlayerId(1), &Declining);
        assert_eq!(
            engine.state().fortress_plan.as_ref().unwrap().votes[1],
            Some(false)
        );
    }
}
