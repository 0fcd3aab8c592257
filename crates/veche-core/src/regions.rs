use std::collections::BTreeMap;

use veche_protocol::{GameState, RegionId};

/// Undirected adjacency over the fixed territory map.
///
/// Built once by the catalog loader and never mutated afterwards; target
/// selection for both sides is derived from it plus the live controller map.
#[derive(Clone, Debug, Default)]
pub struct RegionGraph {
    adjacency: BTreeMap<RegionId, Vec<RegionId>>,
}

impl RegionGraph {
    pub(crate) fn from_edges(edges: &[[RegionId; 2]]) -> Self {
        let mut adjacency: BTreeMap<RegionId, Vec<RegionId>> = BTreeMap::new();
        for region in RegionId::ALL {
            adjacency.insert(region, Vec::new());
        }
        for [a, b] in edges {
            let fwd = adjacency.entry(*a).or_default();
            if !fwd.contains(b) {
                fwd.push(*b);
            }
            let rev = adjacency.entry(*b).or_default();
            if !rev.contains(a) {
                rev.push(*a);
            }
        }
        Self { adjacency }
    }

    pub fn neighbors(&self, region: RegionId) -> &[RegionId] {
        self.adjacency
            .get(&region)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn adjacent(&self, a: RegionId, b: RegionId) -> bool {
        self.neighbors(a).contains(&b)
    }

    /// Order-held regions the republic may attack: adjacent to at least one
    /// republic region. The Order home keep is never a valid target.
    pub fn valid_republic_targets(&self, state: &GameState) -> Vec<RegionId> {
        let mut targets = Vec::new();
        for (&id, region) in &state.regions {
            if id.is_order_home() || !region.is_order() {
                continue;
            }
            let frontier = self
                .neighbors(id)
                .iter()
                .any(|n| state.regions.get(n).is_some_and(|r| r.is_republic()));
            if frontier {
                targets.push(id);
            }
        }
        targets
    }

    /// Republic-held regions the Order may strike: adjacent to at least one
    /// Order-held region. The capital is spared while any other town stands.
    pub fn valid_order_targets(&self, state: &GameState) -> Vec<RegionId> {
        let mut targets = Vec::new();
        for (&id, region) in &state.regions {
            if !region.is_republic() {
                continue;
            }
            let frontier = self
                .neighbors(id)
                .iter()
                .any(|n| state.regions.get(n).is_some_and(|r| r.is_order()));
            if frontier {
                targets.push(id);
            }
        }
        if targets.len() > 1 {
            targets.retain(|id| !id.is_capital());
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veche_protocol::Controller;

    fn graph() -> RegionGraph {
        crate::catalog::load_catalog(crate::catalog::CatalogSource::Embedded)
            .unwrap()
            .graph
    }

    fn fresh_state() -> GameState {
        let catalog = crate::catalog::load_catalog(crate::catalog::CatalogSource::Embedded).unwrap();
        GameState {
            turn: 1,
            phase: veche_protocol::Phase::Events,
            players: veche_protocol::Faction::ALL
                .map(|f| veche_protocol::PlayerState::new(f, 0.0)),
            regions: catalog.starting_regions(),
            active_effects: Vec::new(),
            construction: veche_protocol::ConstructionState::fresh(),
            event: None,
            attack_plan: None,
            fortress_plan: None,
            game_over: false,
        }
    }

    #[test]
    fn adjacency_is_symmetric() {
        let g = graph();
        for a in RegionId::ALL {
            for &b in g.neighbors(a) {
                assert!(g.adjacent(b, a), "{a:?} -> {b:?} not mirrored");
            }
        }
    }

    #[test]
    fn keep_is_never_a_republic_target() {
        let g = graph();
        let state = fresh_state();
        assert!(!g.valid_republic_targets(&state).contains(&RegionId::OrderKeep));
    }

    #[test]
    fn capital_is_spared_while_other_towns_stand() {
        let g = graph();
        let state = fresh_state();
        let targets = g.valid_order_targets(&state);
        assert!(!targets.is_empty());
        assert!(!targets.contains(&RegionId::Novgorod));
    }

    #[test]
    fn capital_is_targetable_when_it_stands_alone() {
        let g = graph();
        let mut state = fresh_state();
        for (&id, region) in state.regions.iter_mut() {
            if !id.is_capital() {
                region.controller = Controller::Order;
            }
        }
        assert_eq!(g.valid_order_targets(&state), vec![RegionId::Novgorod]);
    }
}
