//! Phase state machine: the `resources → construction → events → veche`
//! cycle, income, construction actions, and veche funding plans.
//!
//! Everything here assumes the action has already passed the validator.
//! Transitions take the whole state by value-semantics: the engine clones the
//! snapshot, lets these functions mutate the clone, and replaces the root.

use veche_protocol::{
    BuildingKind, ConstructionState, Controller, EquipmentKind, GameState, Phase, Plan,
    PlayerState, RegionId, TURN_HORIZON,
};

use crate::catalog::Catalog;
use crate::combat;
use crate::effects;
use crate::events::{self, EventDraw};
use crate::rng::SessionRng;

pub const STARTING_MONEY: f64 = 2.0;
pub const BUILDING_COST: f64 = 2.0;
pub const EQUIPMENT_COST: f64 = 1.0;
pub const EQUIPMENT_CAP: u8 = 2;
/// Total even-split cost of a funded attack or fortress plan.
pub const PLAN_POOL: f64 = 6.0;

pub const BASE_INCOME: f64 = 0.5;
pub const INCOME_PER_REGION: f64 = 0.25;
pub const INCOME_PER_IMPROVEMENT: f64 = 0.25;

/// Fresh state at turn 1, phase `resources`. The session advances once
/// immediately so players first see `construction` with income applied.
pub fn new_game(catalog: &Catalog) -> GameState {
    GameState {
        turn: 1,
        phase: Phase::Resources,
        players: veche_protocol::Faction::ALL.map(|f| PlayerState::new(f, STARTING_MONEY)),
        regions: catalog.starting_regions(),
        active_effects: Vec::new(),
        construction: ConstructionState::fresh(),
        event: None,
        attack_plan: None,
        fortress_plan: None,
        game_over: false,
    }
}

/// Income for every seat:
/// `(0.5 + 0.25×regions + 0.25×improvements) × income multiplier`.
pub fn apply_income(state: &mut GameState) {
    let regions = f64::from(state.republic_region_count());
    for seat in 0..state.players.len() {
        let player = &state.players[seat];
        let base = BASE_INCOME
            + INCOME_PER_REGION * regions
            + INCOME_PER_IMPROVEMENT * f64::from(player.improvements);
        let income = base * effects::income_multiplier(state, player.faction);
        state.players[seat].money += income;
    }
}

/// One `NEXT_PHASE` transition.
pub fn advance_phase(state: &mut GameState, catalog: &Catalog, rng: &mut SessionRng, draw: &mut EventDraw) {
    match state.phase {
        // Never user-facing: income lands and play moves straight on.
        Phase::Resources => enter_construction(state),
        Phase::Construction => {
            let current = state.construction.current_player;
            if usize::from(current) + 1 < state.players.len() {
                state.construction.current_player = current + 1;
                state.construction.selected_region = RegionId::CAPITAL;
            } else {
                enter_events(state, catalog, rng, draw);
            }
        }
        Phase::Events => {
            state.event = None;
            state.phase = Phase::Veche;
        }
        Phase::Veche => {
            // The wrap: decay, next turn, then income and construction,
            // unless the horizon has been reached.
            effects::decay(state);
            state.turn += 1;
            state.phase = Phase::Resources;
            if state.turn <= TURN_HORIZON {
                enter_construction(state);
            }
        }
    }
}

fn enter_construction(state: &mut GameState) {
    apply_income(state);
    state.construction = ConstructionState::fresh();
    state.phase = Phase::Construction;
}

fn enter_events(state: &mut GameState, catalog: &Catalog, rng: &mut SessionRng, draw: &mut EventDraw) {
    state.event = Some(events::draw_event(state, catalog, rng, draw));
    state.phase = Phase::Events;
}

pub fn build_building(
    state: &mut GameState,
    seat: usize,
    building: BuildingKind,
    region: Option<RegionId>,
) {
    let site = region.unwrap_or(state.construction.selected_region);
    state.players[seat].money -= BUILDING_COST;
    state.players[seat].improvements += 1;
    if let Some(target) = state.regions.get_mut(&site) {
        *target.buildings.entry(building).or_insert(0) += 1;
    }
    state.construction.built[seat] = true;
    state.construction.selected_region = site;
}

pub fn buy_equipment(state: &mut GameState, seat: usize, item: EquipmentKind) {
    state.players[seat].money -= EQUIPMENT_COST;
    match item {
        EquipmentKind::Weapons => state.players[seat].weapons += 1,
        EquipmentKind::Armor => state.players[seat].armor += 1,
    }
    state.construction.bought[seat] = true;
}

pub fn initiate_attack(state: &mut GameState, target: RegionId) {
    state.attack_plan = Some(Plan::new(target));
}

pub fn vote_attack(state: &mut GameState, seat: usize, vote: bool) {
    if let Some(plan) = state.attack_plan.as_mut() {
        plan.votes[seat] = Some(vote);
    }
}

pub fn cancel_attack(state: &mut GameState) {
    state.attack_plan = None;
}

/// Executes a fully-voted attack plan. Funding needs at least one backer and
/// an affordable even split of the pool; a failed funding cancels the plan
/// with nothing deducted. A funded attack rolls against the Order garrison.
pub fn execute_attack(state: &mut GameState, rng: &mut SessionRng) {
    let Some(plan) = state.attack_plan.take() else {
        return;
    };
    let backers = plan.backers();
    if !charge_pool(state, &backers, PLAN_POOL) {
        return;
    }
    let attack = combat::total_strength(state, &backers);
    let defense = combat::order_defense_strength(state, plan.target);
    if combat::roll_for_victory(attack - defense, rng.percent()) {
        if let Some(region) = state.regions.get_mut(&plan.target) {
            region.controller = Controller::Republic;
        }
    }
}

pub fn initiate_fortress(state: &mut GameState, target: RegionId) {
    state.fortress_plan = Some(Plan::new(target));
}

pub fn vote_fortress(state: &mut GameState, seat: usize, vote: bool) {
    if let Some(plan) = state.fortress_plan.as_mut() {
        plan.votes[seat] = Some(vote);
    }
}

pub fn cancel_fortress(state: &mut GameState) {
    state.fortress_plan = None;
}

/// Executes a fully-voted fortress plan under the same funding rule as an
/// attack. A funded plan raises the fortress immediately.
pub fn execute_fortress(state: &mut GameState) {
    let Some(plan) = state.fortress_plan.take() else {
        return;
    };
    let backers = plan.backers();
    if !charge_pool(state, &backers, PLAN_POOL) {
        return;
    }
    if let Some(region) = state.regions.get_mut(&plan.target) {
        region.fortress = true;
    }
}

/// Deducts an even split of `pool` from every backer, or deducts nothing and
/// reports failure when there are no backers or any backer cannot pay.
pub(crate) fn charge_pool(state: &mut GameState, backers: &[usize], pool: f64) -> bool {
    if backers.is_empty() {
        return false;
    }
    let share = pool / backers.len() as f64;
    if backers.iter().any(|&s| state.players[s].money < share) {
        return false;
    }
    for &seat in backers {
        state.players[seat].money -= share;
    }
    true
}
