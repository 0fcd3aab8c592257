//! Strength arithmetic and battle resolution.
//!
//! All rolls are supplied by the caller (the engine threads its session RNG
//! through), so the same battle inputs always produce the same outcome for
//! every observer.

use veche_protocol::{GameState, RegionId};

use crate::effects;
use crate::rng::SessionRng;

/// Strength contributed by each owned weapon or armor unit.
pub const EQUIPMENT_STRENGTH: f64 = 5.0;
/// Flat defensive bonus of a standing fortress.
pub const FORTRESS_DEFENSE_BONUS: f64 = 10.0;
/// Order base strength defending against a player-initiated assault.
pub const ORDER_GARRISON_STRENGTH: f64 = 30.0;

/// One seat's combat strength: faction base + equipment + active effects,
/// floored at zero.
pub fn player_strength(state: &GameState, seat: usize) -> f64 {
    let player = state.player(seat);
    let base = player.faction.base_strength();
    let equipment = f64::from(player.weapons + player.armor) * EQUIPMENT_STRENGTH;
    let modifier = effects::strength_modifier(state, player.faction);
    (base + equipment + modifier).max(0.0)
}

/// Summed strength of a coalition of seats.
pub fn total_strength(state: &GameState, seats: &[usize]) -> f64 {
    seats.iter().map(|&s| player_strength(state, s)).sum()
}

/// Win probability for a strength differential. A fixed step table, monotone
/// non-decreasing, bounded to [5, 95], with 50 at zero.
pub fn victory_chance(diff: f64) -> f64 {
    if diff <= -15.0 {
        5.0
    } else if diff <= -10.0 {
        15.0
    } else if diff <= -5.0 {
        25.0
    } else if diff < 0.0 {
        35.0
    } else if diff == 0.0 {
        50.0
    } else if diff < 5.0 {
        55.0
    } else if diff < 10.0 {
        65.0
    } else if diff < 15.0 {
        75.0
    } else if diff < 20.0 {
        85.0
    } else {
        95.0
    }
}

/// True when a uniform [0, 100) draw wins at the given differential.
pub fn roll_for_victory(diff: f64, random_value: f64) -> bool {
    random_value < victory_chance(diff)
}

/// Resolves an Order assault on a republic region. The roll is made for the
/// defending coalition; a lost roll surrenders the region. Returns whether
/// the defense held.
pub fn execute_battle(
    state: &mut GameState,
    attacker_strength: f64,
    target: RegionId,
    defenders: &[usize],
    random_value: f64,
) -> bool {
    let defense = republic_defense_strength(state, target, defenders);
    let held = roll_for_victory(defense - attacker_strength, random_value);
    if !held {
        surrender_region(state, target);
    }
    held
}

/// Defender-side strength of a republic region under Order attack.
pub fn republic_defense_strength(state: &GameState, target: RegionId, defenders: &[usize]) -> f64 {
    let mut strength = total_strength(state, defenders);
    if state.region(target).is_some_and(|r| r.fortress) {
        strength += FORTRESS_DEFENSE_BONUS;
    }
    strength
}

/// Order-side strength of a region defending a player-initiated assault.
pub fn order_defense_strength(state: &GameState, target: RegionId) -> f64 {
    let mut strength = ORDER_GARRISON_STRENGTH;
    if state.region(target).is_some_and(|r| r.fortress) {
        strength += FORTRESS_DEFENSE_BONUS;
    }
    strength
}

/// A republic region falls to the Order. Losing the capital is terminal and
/// leaves the rest of the state untouched; any other region flips controller
/// and loses every building, with the owning players' improvement scores
/// reduced accordingly. The fortress, if any, stays standing.
pub fn surrender_region(state: &mut GameState, target: RegionId) {
    if target.is_capital() {
        state.game_over = true;
        return;
    }
    let Some(region) = state.regions.get_mut(&target) else {
        return;
    };
    region.controller = veche_protocol::Controller::Order;
    let razed: Vec<(veche_protocol::BuildingKind, u8)> =
        region.buildings.iter().map(|(&k, &n)| (k, n)).collect();
    region.buildings.clear();
    for (kind, count) in razed {
        let seat = kind.faction().seat();
        let player = &mut state.players[seat];
        player.improvements = player.improvements.saturating_sub(u32::from(count));
    }
}

/// Destroys up to `count` building units in a region, drawing distinct present
/// building types uniformly without replacement and removing one unit of each.
/// Returns the destroyed kinds for reporting.
pub fn destroy_random_buildings(
    state: &mut GameState,
    target: RegionId,
    count: usize,
    rng: &mut SessionRng,
) -> Vec<veche_protocol::BuildingKind> {
    let Some(region) = state.regions.get_mut(&target) else {
        return Vec::new();
    };
    let mut present: Vec<veche_protocol::BuildingKind> =
        region.buildings.keys().copied().collect();
    let mut destroyed = Vec::new();
    for _ in 0..count {
        if present.is_empty() {
            break;
        }
        let kind = present.swap_remove(rng.gen_index(present.len()));
        match region.buildings.get_mut(&kind) {
            Some(n) if *n > 1 => *n -= 1,
            Some(_) => {
                region.buildings.remove(&kind);
            }
            None => continue,
        }
        destroyed.push(kind);
    }
    for &kind in &destroyed {
        let seat = kind.faction().seat();
        let player = &mut state.players[seat];
        player.improvements = player.improvements.saturating_sub(1);
    }
    destroyed
}

#[cfg(test)]
mod tests {
    use super::*;
    use veche_protocol::{
        BuildingKind, ConstructionState, Controller, Faction, Phase, PlayerState, Region,
    };

    fn state() -> GameState {
        let catalog = crate::catalog::load_catalog(crate::catalog::CatalogSource::Embedded).unwrap();
        GameState {
            turn: 1,
            phase: Phase::Events,
            players: Faction::ALL.map(|f| PlayerState::new(f, 0.0)),
            regions: catalog.starting_regions(),
            active_effects: Vec::new(),
            construction: ConstructionState::fresh(),
            event: None,
            attack_plan: None,
            fortress_plan: None,
            game_over: false,
        }
    }

    #[test]
    fn victory_chance_is_monotone_and_bounded() {
        let mut prev = 0.0;
        let mut d = -30.0;
        while d <= 30.0 {
            let c = victory_chance(d);
            assert!((5.0..=95.0).contains(&c), "chance {c} at diff {d}");
            assert!(c >= prev, "chance dropped at diff {d}");
            prev = c;
            d += 0.5;
        }
        assert_eq!(victory_chance(0.0), 50.0);
    }

    #[test]
    fn equipment_and_effects_feed_strength() {
        let mut s = state();
        s.players[0].weapons = 2;
        s.players[0].armor = 1;
        assert_eq!(player_strength(&s, 0), 40.0 + 15.0);
        crate::effects::add(
            &mut s,
            veche_protocol::Effect {
                kind: veche_protocol::EffectKind::StrengthPenalty,
                target: veche_protocol::EffectTarget::All,
                value: -100.0,
                turns_remaining: 1,
            },
        );
        assert_eq!(player_strength(&s, 0), 0.0);
    }

    #[test]
    fn lone_fortified_defender_holds_at_diff_thirty() {
        // Order strength 100 vs. 130 total defense: diff 30 means 95% and a
        // supplied roll of 10 is a successful defense.
        let mut s = state();
        s.regions.get_mut(&RegionId::Pskov).unwrap().fortress = true;
        s.players[0].weapons = 2;
        s.players[0].armor = 2;
        crate::effects::add(
            &mut s,
            veche_protocol::Effect {
                kind: veche_protocol::EffectKind::StrengthBonus,
                target: veche_protocol::EffectTarget::Faction(Faction::Nobles),
                value: 60.0,
                turns_remaining: 1,
            },
        );
        assert_eq!(
            republic_defense_strength(&s, RegionId::Pskov, &[0]),
            130.0
        );

        let held = execute_battle(&mut s, 100.0, RegionId::Pskov, &[0], 10.0);

        assert!(held);
        assert_eq!(
            s.region(RegionId::Pskov).unwrap().controller,
            Controller::Republic
        );
    }

    #[test]
    fn surrender_razes_buildings_and_scores() {
        let mut s = state();
        let region = s.regions.get_mut(&RegionId::Pskov).unwrap();
        region.buildings.insert(BuildingKind::Church, 1);
        region.buildings.insert(BuildingKind::Workshop, 1);
        region.fortress = true;
        s.players[0].improvements = 1;
        s.players[2].improvements = 1;

        surrender_region(&mut s, RegionId::Pskov);

        let region = s.region(RegionId::Pskov).unwrap();
        assert_eq!(region.controller, Controller::Order);
        assert!(region.buildings.is_empty());
        assert!(region.fortress);
        assert_eq!(s.players[0].improvements, 0);
        assert_eq!(s.players[2].improvements, 0);
        assert!(!s.game_over);
    }

    #[test]
    fn capital_surrender_is_terminal_only() {
        let mut s = state();
        s.regions
            .get_mut(&RegionId::Novgorod)
            .unwrap()
            .buildings
            .insert(BuildingKind::TradingPost, 3);
        s.players[1].improvements = 3;

        surrender_region(&mut s, RegionId::Novgorod);

        assert!(s.game_over);
        let capital = s.region(RegionId::Novgorod).unwrap();
        assert_eq!(capital.controller, Controller::Republic);
        assert_eq!(capital.buildings[&BuildingKind::TradingPost], 3);
        assert_eq!(s.players[1].improvements, 3);
    }

    #[test]
    fn random_destruction_draws_distinct_types() {
        let mut s = state();
        let region = s.regions.get_mut(&RegionId::Novgorod).unwrap();
        region.buildings.insert(BuildingKind::Church, 1);
        region.buildings.insert(BuildingKind::TradingPost, 4);
        s.players[0].improvements = 1;
        s.players[1].improvements = 4;

        let mut rng = SessionRng::seed_from_u64(3);
        let destroyed = destroy_random_buildings(&mut s, RegionId::Novgorod, 2, &mut rng);

        assert_eq!(destroyed.len(), 2);
        assert_ne!(destroyed[0], destroyed[1]);
        let total: u32 = s.players.iter().map(|p| p.improvements).sum();
        assert_eq!(total, 3);
    }
}
