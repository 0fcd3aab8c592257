//! The timed-effect ledger on `GameState::active_effects`.
//!
//! Decay runs exactly once per full phase cycle, at the veche wrap. Strength
//! modifiers are additive; income penalties compound multiplicatively.

use veche_protocol::{Effect, EffectKind, Faction, GameState};

pub fn add(state: &mut GameState, effect: Effect) {
    if effect.turns_remaining > 0 {
        state.active_effects.push(effect);
    }
}

/// Ticks every effect down one turn and drops the expired ones. An effect
/// never survives at zero.
pub fn decay(state: &mut GameState) {
    for effect in &mut state.active_effects {
        effect.turns_remaining -= 1;
    }
    state.active_effects.retain(|e| e.turns_remaining > 0);
}

/// Net additive strength delta for one faction.
pub fn strength_modifier(state: &GameState, faction: Faction) -> f64 {
    state
        .active_effects
        .iter()
        .filter(|e| {
            matches!(
                e.kind,
                EffectKind::StrengthBonus | EffectKind::StrengthPenalty
            ) && e.target.applies_to(faction)
        })
        .map(|e| e.value)
        .sum()
}

/// Income multiplier for one faction: each matching penalty compounds as
/// `(1 + value)`, with values being negative fractions. Never below zero.
pub fn income_multiplier(state: &GameState, faction: Faction) -> f64 {
    let factor = state
        .active_effects
        .iter()
        .filter(|e| e.kind == EffectKind::IncomePenalty && e.target.applies_to(faction))
        .fold(1.0, |acc, e| acc * (1.0 + e.value));
    factor.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use veche_protocol::{ConstructionState, EffectTarget, Phase, PlayerState};

    fn state() -> GameState {
        GameState {
            turn: 1,
            phase: Phase::Veche,
            players: Faction::ALL.map(|f| PlayerState::new(f, 0.0)),
            regions: Default::default(),
            active_effects: Vec::new(),
            construction: ConstructionState::fresh(),
            event: None,
            attack_plan: None,
            fortress_plan: None,
            game_over: false,
        }
    }

    fn effect(kind: EffectKind, target: EffectTarget, value: f64, turns: u32) -> Effect {
        Effect {
            kind,
            target,
            value,
            turns_remaining: turns,
        }
    }

    #[test]
    fn decay_removes_expired_effects() {
        let mut s = state();
        add(
            &mut s,
            effect(EffectKind::StrengthBonus, EffectTarget::All, 5.0, 2),
        );
        add(
            &mut s,
            effect(EffectKind::StrengthPenalty, EffectTarget::All, -5.0, 1),
        );
        decay(&mut s);
        assert_eq!(s.active_effects.len(), 1);
        assert_eq!(s.active_effects[0].turns_remaining, 1);
        decay(&mut s);
        assert!(s.active_effects.is_empty());
    }

    #[test]
    fn strength_modifier_respects_scope() {
        let mut s = state();
        add(
            &mut s,
            effect(EffectKind::StrengthBonus, EffectTarget::All, 5.0, 1),
        );
        add(
            &mut s,
            effect(
                EffectKind::StrengthBonus,
                EffectTarget::Faction(Faction::Nobles),
                10.0,
                1,
            ),
        );
        add(
            &mut s,
            effect(EffectKind::IncomePenalty, EffectTarget::All, -0.5, 1),
        );
        assert_eq!(strength_modifier(&s, Faction::Nobles), 15.0);
        assert_eq!(strength_modifier(&s, Faction::Merchants), 5.0);
    }

    #[test]
    fn income_penalties_compound() {
        let mut s = state();
        assert_eq!(income_multiplier(&s, Faction::Commoners), 1.0);
        add(
            &mut s,
            effect(EffectKind::IncomePenalty, EffectTarget::All, -0.5, 2),
        );
        add(
            &mut s,
            effect(EffectKind::IncomePenalty, EffectTarget::All, -0.5, 2),
        );
        assert_eq!(income_multiplier(&s, Faction::Commoners), 0.25);
    }
}
