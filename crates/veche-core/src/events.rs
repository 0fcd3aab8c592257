//! Event draw and resolution.
//!
//! Card data is declarative (see `catalog`); the outcomes are a match on the
//! card id here, so every resolution path is plain, testable code. All rolls
//! and random picks come from the session RNG threaded in by the engine.

use serde::{Deserialize, Serialize};

use veche_protocol::{
    Effect, EffectTarget, EventId, EventState, GameState, RegionId, PLAYER_COUNT,
};

use crate::catalog::{Catalog, EffectScope, EffectSpec, EventKind};
use crate::combat;
use crate::effects;
use crate::machine;
use crate::rng::SessionRng;

/// How the events phase picks the next card. `Cyclic` walks the deck in
/// order, for debugging and deterministic tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventDrawMode {
    #[default]
    Random,
    Cyclic,
}

/// Draw bookkeeping owned by the engine.
#[derive(Clone, Copy, Debug)]
pub struct EventDraw {
    pub mode: EventDrawMode,
    cursor: usize,
}

impl EventDraw {
    pub fn new(mode: EventDrawMode) -> Self {
        Self { mode, cursor: 0 }
    }

    pub fn random() -> Self {
        Self::new(EventDrawMode::Random)
    }

    pub fn cyclic() -> Self {
        Self::new(EventDrawMode::Cyclic)
    }
}

/// Picks the next card and fixes its target if it is an Order attack.
/// Attack cards are skipped while no valid target exists.
pub fn draw_event(
    state: &GameState,
    catalog: &Catalog,
    rng: &mut SessionRng,
    draw: &mut EventDraw,
) -> EventState {
    let deck = catalog.deck();
    for _ in 0..deck.len() * 4 {
        let id = match draw.mode {
            EventDrawMode::Random => deck[rng.gen_index(deck.len())],
            EventDrawMode::Cyclic => {
                let id = deck[draw.cursor % deck.len()];
                draw.cursor += 1;
                id
            }
        };
        match catalog.event(id).kind {
            EventKind::OrderAttack { .. } => {
                let targets = catalog.graph.valid_order_targets(state);
                if targets.is_empty() {
                    continue;
                }
                return EventState::drawn(id, Some(*rng.pick(&targets)));
            }
            _ => return EventState::drawn(id, None),
        }
    }
    let fallback = deck
        .iter()
        .copied()
        .find(|&id| !matches!(catalog.event(id).kind, EventKind::OrderAttack { .. }))
        .unwrap_or(deck[0]);
    EventState::drawn(fallback, None)
}

/// Resolves the current event. Ordinarily marks it resolved; the one
/// exception is a nested injection (a failed robbery spawns an Order
/// reprisal), which replaces the current event with a fresh, unresolved one.
pub fn resolve_event(state: &mut GameState, catalog: &Catalog, rng: &mut SessionRng) {
    let Some(event) = state.event.clone() else {
        return;
    };
    let def = catalog.event(event.id);

    let outcome = match &def.kind {
        EventKind::Immediate {
            money_per_player,
            effect,
        } => {
            let mut note = match event.id {
                EventId::CityFire => resolve_fire(state, rng),
                _ => String::new(),
            };
            if let Some(amount) = money_per_player {
                for player in &mut state.players {
                    player.money += amount;
                }
                note = format!("every player gains {amount}");
            }
            if let Some(spec) = effect {
                add_card_effect(state, spec, &[]);
                if note.is_empty() {
                    note = format!("{} takes hold", def.name);
                }
            }
            note
        }

        EventKind::Voting {
            options,
            default,
            fallback,
            effect,
            success_chance,
            loot,
            reprisal,
        } => {
            let mut winner = winning_option(&event.votes, options.len(), *default);
            // An even split of the winning option's pool; an unpayable pool
            // falls back without deducting anything.
            if let Some(pool) = options[winner as usize].pool {
                let payers = voters_for(&event.votes, winner);
                if !machine::charge_pool(state, &payers, pool) {
                    winner = *fallback;
                }
            }
            let choice = options[winner as usize].id.as_str();
            match (event.id, choice) {
                (EventId::ChurchTithe, "pay") => "the tithe is paid".to_string(),
                (EventId::ChurchTithe, _) => {
                    if let Some(spec) = effect {
                        add_card_effect(state, spec, &[]);
                    }
                    "the church curses the refusal".to_string()
                }
                (EventId::RobMerchants, "rob") => {
                    let chance = success_chance.unwrap_or(0.0);
                    if rng.percent() < chance {
                        let prize = loot.unwrap_or(0.0);
                        for seat in voters_for(&event.votes, winner) {
                            state.players[seat].money += prize;
                        }
                        "the robbery succeeds".to_string()
                    } else {
                        // Nested injection: the failed roll spawns a fresh
                        // Order attack that gets its own round of votes.
                        if let Some(next) = reprisal {
                            inject_event(state, catalog, rng, *next);
                            return;
                        }
                        "the robbery fails".to_string()
                    }
                }
                _ => format!("the vote settles on {choice}"),
            }
        }

        EventKind::Participation { pool, effect } => {
            let joiners = voters_for(&event.votes, 0);
            if machine::charge_pool(state, &joiners, *pool) {
                add_card_effect(state, effect, &joiners);
                format!("{} players take part", joiners.len())
            } else {
                "no one takes part".to_string()
            }
        }

        EventKind::OrderAttack {
            strength,
            defense_pool,
        } => match event.attack_target {
            Some(target) => resolve_order_attack(state, rng, target, *strength, *defense_pool, &event),
            None => "the raiders find no target".to_string(),
        },
    };

    if let Some(current) = state.event.as_mut() {
        current.resolved = true;
        current.card_revealed = true;
        current.last_result = Some(outcome);
    }
}

fn resolve_order_attack(
    state: &mut GameState,
    rng: &mut SessionRng,
    target: RegionId,
    strength: f64,
    defense_pool: f64,
    event: &EventState,
) -> String {
    let defenders = voters_for(&event.votes, 0);
    // No defenders, or any defender short of the even split: the region
    // surrenders without a roll and nothing is deducted.
    if defenders.is_empty() || !machine::charge_pool(state, &defenders, defense_pool) {
        combat::surrender_region(state, target);
        return format!("{} surrenders without a fight", region_label(target));
    }
    let roll = rng.percent();
    if combat::execute_battle(state, strength, target, &defenders, roll) {
        format!("the defense of {} holds", region_label(target))
    } else {
        format!("{} falls to the Order", region_label(target))
    }
}

fn resolve_fire(state: &mut GameState, rng: &mut SessionRng) -> String {
    let burnable: Vec<RegionId> = state
        .regions
        .iter()
        .filter(|(_, r)| r.is_republic() && !r.buildings.is_empty())
        .map(|(&id, _)| id)
        .collect();
    if burnable.is_empty() {
        return "the fire finds nothing to burn".to_string();
    }
    let region = *rng.pick(&burnable);
    let destroyed = combat::destroy_random_buildings(state, region, 1, rng);
    match destroyed.first() {
        Some(kind) => format!("fire destroys a {:?} in {}", kind, region_label(region)),
        None => "the fire finds nothing to burn".to_string(),
    }
}

/// Replaces the current event with a freshly drawn one, keeping it
/// unresolved so it is presented for its own round of votes.
fn inject_event(state: &mut GameState, catalog: &Catalog, rng: &mut SessionRng, id: EventId) {
    let target = match catalog.event(id).kind {
        EventKind::OrderAttack { .. } => {
            let targets = catalog.graph.valid_order_targets(state);
            if targets.is_empty() {
                None
            } else {
                Some(*rng.pick(&targets))
            }
        }
        _ => None,
    };
    let mut next = EventState::drawn(id, target);
    next.card_revealed = true;
    next.last_result = Some("the robbery fails and draws the Order's wrath".to_string());
    state.event = Some(next);
}

/// Strict plurality of at least two votes wins, otherwise the default.
fn winning_option(votes: &[Option<u8>; PLAYER_COUNT], options: usize, default: u8) -> u8 {
    let mut tally = vec![0u8; options];
    for vote in votes.iter().flatten() {
        if let Some(count) = tally.get_mut(usize::from(*vote)) {
            *count += 1;
        }
    }
    tally
        .iter()
        .position(|&count| count >= 2)
        .map(|i| i as u8)
        .unwrap_or(default)
}

fn voters_for(votes: &[Option<u8>; PLAYER_COUNT], option: u8) -> Vec<usize> {
    votes
        .iter()
        .enumerate()
        .filter(|(_, v)| **v == Some(option))
        .map(|(i, _)| i)
        .collect()
}

fn add_card_effect(state: &mut GameState, spec: &EffectSpec, joiners: &[usize]) {
    match spec.target {
        EffectScope::All => effects::add(
            state,
            Effect {
                kind: spec.kind,
                target: EffectTarget::All,
                value: spec.value,
                turns_remaining: spec.turns,
            },
        ),
        EffectScope::Joiners => {
            for &seat in joiners {
                effects::add(
                    state,
                    Effect {
                        kind: spec.kind,
                        target: EffectTarget::Faction(state.players[seat].faction),
                        value: spec.value,
                        turns_remaining: spec.turns,
                    },
                );
            }
        }
    }
}

fn region_label(region: RegionId) -> &'static str {
    match region {
        RegionId::Novgorod => "Novgorod",
        RegionId::Pskov => "Pskov",
        RegionId::Ladoga => "Ladoga",
        RegionId::Izborsk => "Izborsk",
        RegionId::Koporye => "Koporye",
        RegionId::Oreshek => "Oreshek",
        RegionId::OrderKeep => "the Order keep",
    }
}
