//! Action validation. Every rejection carries a named reason; nothing here
//! mutates state. Validation runs before any transition so a rejected action
//! leaves the snapshot untouched.

use thiserror::Error;

use veche_protocol::{Action, EquipmentKind, GameState, Phase, PlayerId};

use crate::catalog::{Catalog, EventKind};
use crate::machine::{BUILDING_COST, EQUIPMENT_CAP, EQUIPMENT_COST};

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ValidationError {
    #[error("game is finished")]
    GameFinished,
    #[error("action not allowed in the current phase")]
    WrongPhase,
    #[error("not your turn")]
    NotYourTurn,
    #[error("already built this turn")]
    AlreadyBuilt,
    #[error("already bought equipment this turn")]
    AlreadyBought,
    #[error("insufficient funds, {needed} needed")]
    InsufficientFunds { needed: f64 },
    #[error("building belongs to another faction")]
    ForeignBuilding,
    #[error("this building can only be raised in the capital")]
    CapitalOnly,
    #[error("building limit reached in this region")]
    BuildingCapReached,
    #[error("region is not under republic control")]
    NotRepublicRegion,
    #[error("equipment limit reached")]
    EquipmentCapReached,
    #[error("no event is active")]
    NoActiveEvent,
    #[error("event is already resolved")]
    EventAlreadyResolved,
    #[error("event is not resolved yet")]
    EventUnresolved,
    #[error("no such vote option")]
    InvalidOption,
    #[error("vote already cast")]
    AlreadyVoted,
    #[error("votes are still pending")]
    VotesPending,
    #[error("a plan is already in progress")]
    PlanAlreadyActive,
    #[error("no plan is in progress")]
    NoActivePlan,
    #[error("invalid target region")]
    InvalidTarget,
}

/// Accepts or rejects one action from one seat against the current snapshot.
pub fn validate(
    state: &GameState,
    catalog: &Catalog,
    actor: PlayerId,
    action: &Action,
) -> Result<(), ValidationError> {
    // A finished game accepts nothing but a reset.
    if matches!(action, Action::ResetGame) {
        return Ok(());
    }
    if state.is_finished() {
        return Err(ValidationError::GameFinished);
    }

    let seat = actor.index();
    match action {
        Action::NextPhase => match state.phase {
            Phase::Construction => {
                if usize::from(state.construction.current_player) != seat {
                    return Err(ValidationError::NotYourTurn);
                }
                Ok(())
            }
            Phase::Events => {
                let event = state.event.as_ref().ok_or(ValidationError::NoActiveEvent)?;
                if !event.resolved {
                    return Err(ValidationError::EventUnresolved);
                }
                Ok(())
            }
            Phase::Veche => {
                if state.attack_plan.is_some() || state.fortress_plan.is_some() {
                    return Err(ValidationError::PlanAlreadyActive);
                }
                Ok(())
            }
            Phase::Resources => Err(ValidationError::WrongPhase),
        },

        Action::BuildBuilding { building, region } => {
            require_phase(state, Phase::Construction)?;
            require_construction_turn(state, seat)?;
            if state.construction.built[seat] {
                return Err(ValidationError::AlreadyBuilt);
            }
            if building.faction() != state.player(seat).faction {
                return Err(ValidationError::ForeignBuilding);
            }
            let site = region.unwrap_or(state.construction.selected_region);
            let target = state.region(site).ok_or(ValidationError::InvalidTarget)?;
            if !target.is_republic() {
                return Err(ValidationError::NotRepublicRegion);
            }
            if building.capital_only() && !site.is_capital() {
                return Err(ValidationError::CapitalOnly);
            }
            let standing = target.buildings.get(building).copied().unwrap_or(0);
            if standing >= building.per_region_cap() {
                return Err(ValidationError::BuildingCapReached);
            }
            require_funds(state, seat, BUILDING_COST)
        }

        Action::BuyEquipment { item } => {
            require_phase(state, Phase::Construction)?;
            require_construction_turn(state, seat)?;
            if state.construction.bought[seat] {
                return Err(ValidationError::AlreadyBought);
            }
            let owned = match item {
                EquipmentKind::Weapons => state.player(seat).weapons,
                EquipmentKind::Armor => state.player(seat).armor,
            };
            if owned >= EQUIPMENT_CAP {
                return Err(ValidationError::EquipmentCapReached);
            }
            require_funds(state, seat, EQUIPMENT_COST)
        }

        Action::VoteEvent { vote } => {
            require_phase(state, Phase::Events)?;
            let event = state.event.as_ref().ok_or(ValidationError::NoActiveEvent)?;
            if event.resolved {
                return Err(ValidationError::EventAlreadyResolved);
            }
            if event.votes[seat].is_some() {
                return Err(ValidationError::AlreadyVoted);
            }
            if *vote >= catalog.event(event.id).option_count() {
                return Err(ValidationError::InvalidOption);
            }
            Ok(())
        }

        Action::ResolveEvent => {
            require_phase(state, Phase::Events)?;
            let event = state.event.as_ref().ok_or(ValidationError::NoActiveEvent)?;
            if event.resolved {
                return Err(ValidationError::EventAlreadyResolved);
            }
            let needs_votes = !matches!(
                catalog.event(event.id).kind,
                EventKind::Immediate { .. }
            );
            if needs_votes && !event.all_votes_cast() {
                return Err(ValidationError::VotesPending);
            }
            Ok(())
        }

        Action::InitiateAttack { target } => {
            require_phase(state, Phase::Veche)?;
            if state.attack_plan.is_some() {
                return Err(ValidationError::PlanAlreadyActive);
            }
            if !catalog.graph.valid_republic_targets(state).contains(target) {
                return Err(ValidationError::InvalidTarget);
            }
            Ok(())
        }
        Action::VoteAttack { .. } => {
            require_phase(state, Phase::Veche)?;
            let plan = state.attack_plan.as_ref().ok_or(ValidationError::NoActivePlan)?;
            if plan.votes[seat].is_some() {
                return Err(ValidationError::AlreadyVoted);
            }
            Ok(())
        }
        Action::ExecuteAttack => {
            require_phase(state, Phase::Veche)?;
            let plan = state.attack_plan.as_ref().ok_or(ValidationError::NoActivePlan)?;
            if !plan.all_votes_cast() {
                return Err(ValidationError::VotesPending);
            }
            Ok(())
        }
        Action::CancelAttack => {
            require_phase(state, Phase::Veche)?;
            state
                .attack_plan
                .as_ref()
                .map(|_| ())
                .ok_or(ValidationError::NoActivePlan)
        }

        Action::InitiateFortress { target } => {
            require_phase(state, Phase::Veche)?;
            if state.fortress_plan.is_some() {
                return Err(ValidationError::PlanAlreadyActive);
            }
            let region = state.region(*target).ok_or(ValidationError::InvalidTarget)?;
            if !region.is_republic() {
                return Err(ValidationError::NotRepublicRegion);
            }
            if region.fortress {
                return Err(ValidationError::InvalidTarget);
            }
            Ok(())
        }
        Action::VoteFortress { .. } => {
            require_phase(state, Phase::Veche)?;
            let plan = state
                .fortress_plan
                .as_ref()
                .ok_or(ValidationError::NoActivePlan)?;
            if plan.votes[seat].is_some() {
                return Err(ValidationError::AlreadyVoted);
            }
            Ok(())
        }
        Action::ExecuteFortress => {
            require_phase(state, Phase::Veche)?;
            let plan = state
                .fortress_plan
                .as_ref()
                .ok_or(ValidationError::NoActivePlan)?;
            if !plan.all_votes_cast() {
                return Err(ValidationError::VotesPending);
            }
            Ok(())
        }
        Action::CancelFortress => {
            require_phase(state, Phase::Veche)?;
            state
                .fortress_plan
                .as_ref()
                .map(|_| ())
                .ok_or(ValidationError::NoActivePlan)
        }

        Action::ResetGame => Ok(()),
    }
}

fn require_phase(state: &GameState, phase: Phase) -> Result<(), ValidationError> {
    if state.phase == phase {
        Ok(())
    } else {
        Err(ValidationError::WrongPhase)
    }
}

fn require_construction_turn(state: &GameState, seat: usize) -> Result<(), ValidationError> {
    if usize::from(state.construction.current_player) == seat {
        Ok(())
    } else {
        Err(ValidationError::NotYourTurn)
    }
}

fn require_funds(state: &GameState, seat: usize, needed: f64) -> Result<(), ValidationError> {
    if state.player(seat).money >= needed {
        Ok(())
    } else {
        Err(ValidationError::InsufficientFunds { needed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veche_protocol::{
        BuildingKind, ConstructionState, EventId, EventState, Faction, PlayerState, RegionId,
    };

    fn setup() -> (GameState, Catalog) {
        let catalog =
            crate::catalog::load_catalog(crate::catalog::CatalogSource::Embedded).unwrap();
        let state = GameState {
            turn: 1,
            phase: Phase::Construction,
            players: Faction::ALL.map(|f| PlayerState::new(f, 2.0)),
            regions: catalog.starting_regions(),
            active_effects: Vec::new(),
            construction: ConstructionState::fresh(),
            event: None,
            attack_plan: None,
            fortress_plan: None,
            game_over: false,
        };
        (state, catalog)
    }

    #[test]
    fn build_requires_turn_ownership() {
        let (state, catalog) = setup();
        let action = Action::BuildBuilding {
            building: BuildingKind::TradingPost,
            region: None,
        };
        assert_eq!(
            validate(&state, &catalog, PlayerId(1), &action),
            Err(ValidationError::NotYourTurn)
        );
    }

    #[test]
    fn foreign_building_is_rejected() {
        let (state, catalog) = setup();
        let action = Action::BuildBuilding {
            building: BuildingKind::TradingPost,
            region: None,
        };
        assert_eq!(
            validate(&state, &catalog, PlayerId(0), &action),
            Err(ValidationError::ForeignBuilding)
        );
    }

    #[test]
    fn trading_post_is_capital_only() {
        let (mut state, catalog) = setup();
        state.construction.current_player = 1;
        let action = Action::BuildBuilding {
            building: BuildingKind::TradingPost,
            region: Some(RegionId::Pskov),
        };
        assert_eq!(
            validate(&state, &catalog, PlayerId(1), &action),
            Err(ValidationError::CapitalOnly)
        );
    }

    #[test]
    fn insufficient_funds_names_the_price() {
        let (mut state, catalog) = setup();
        state.players[0].money = 1.5;
        let action = Action::BuildBuilding {
            building: BuildingKind::Church,
            region: None,
        };
        assert_eq!(
            validate(&state, &catalog, PlayerId(0), &action),
            Err(ValidationError::InsufficientFunds { needed: 2.0 })
        );
    }

    #[test]
    fn a_seat_votes_on_a_card_at_most_once() {
        let (mut state, catalog) = setup();
        state.phase = Phase::Events;
        let mut event = EventState::drawn(EventId::ChurchTithe, None);
        event.votes[0] = Some(0);
        state.event = Some(event);
        assert_eq!(
            validate(&state, &catalog, PlayerId(0), &Action::VoteEvent { vote: 1 }),
            Err(ValidationError::AlreadyVoted)
        );
        assert_eq!(
            validate(&state, &catalog, PlayerId(1), &Action::VoteEvent { vote: 0 }),
            Ok(())
        );
    }

    #[test]
    fn finished_game_accepts_only_reset() {
        let (mut state, catalog) = setup();
        state.game_over = true;
        assert_eq!(
            validate(&state, &catalog, PlayerId(0), &Action::NextPhase),
            Err(ValidationError::GameFinished)
        );
        assert_eq!(
            validate(&state, &catalog, PlayerId(0), &Action::ResetGame),
            Ok(())
        );
    }

    #[test]
    fn attack_target_must_be_a_frontier_order_region() {
        let (mut state, catalog) = setup();
        state.phase = Phase::Veche;
        assert_eq!(
            validate(
                &state,
                &catalog,
                PlayerId(0),
                &Action::InitiateAttack {
                    target: RegionId::OrderKeep
                }
            ),
            Err(ValidationError::InvalidTarget)
        );
        assert_eq!(
            validate(
                &state,
                &catalog,
                PlayerId(0),
                &Action::InitiateAttack {
                    target: RegionId::Pskov
                }
            ),
            Err(ValidationError::InvalidTarget)
        );
    }
}
