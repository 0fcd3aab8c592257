//! Rules data: the territory map and the event deck.
//!
//! Both are embedded YAML documents, parsed into raw serde shapes and then
//! compiled into validated, typed values. A catalog that loads successfully
//! is internally consistent: every [`EventId`] has a definition, every voting
//! card's default resolves to a real option, every order-attack card carries
//! its strength and defense pool.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use veche_protocol::{Controller, EffectKind, EventId, Region, RegionId};

use crate::regions::RegionGraph;

const REGIONS_YAML: &str = include_str!("../data/regions.yaml");
const EVENTS_YAML: &str = include_str!("../data/events.yaml");

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("malformed rules data: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("event {0:?} is not defined")]
    MissingEvent(EventId),
    #[error("event {0:?}: {1}")]
    BadEvent(EventId, String),
    #[error("region {0:?} is not defined")]
    MissingRegion(RegionId),
    #[error("capital must start under republic control")]
    CapitalNotRepublic,
    #[error("order keep must start under order control")]
    KeepNotOrder,
    #[error("adjacency joins {0:?} to itself")]
    SelfLoop(RegionId),
    #[error("region {0:?} has no neighbors")]
    Isolated(RegionId),
    #[error("event deck is empty")]
    EmptyDeck,
}

/// Where the rules data comes from. `Embedded` is the shipped deck; `Bytes`
/// exists for tests that want a doctored map or deck.
pub enum CatalogSource<'a> {
    Embedded,
    Bytes { regions: &'a str, events: &'a str },
}

/// Which players a card effect lands on once resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectScope {
    All,
    /// Only the seats that voted to join a participation card.
    Joiners,
}

/// A timed-effect template attached to a card.
#[derive(Clone, Debug, Deserialize)]
pub struct EffectSpec {
    pub kind: EffectKind,
    pub target: EffectScope,
    pub value: f64,
    pub turns: u32,
}

#[derive(Clone, Debug)]
pub struct VoteOption {
    pub id: String,
    /// Shared cost of the option, split evenly, if it has one.
    pub pool: Option<f64>,
}

#[derive(Clone, Debug)]
pub enum EventKind {
    /// Resolves with no input. Payload is whichever fields the card carries.
    Immediate {
        money_per_player: Option<f64>,
        effect: Option<EffectSpec>,
    },
    /// Majority vote over named options. `default` breaks ties; `fallback`
    /// is substituted when the winning option cannot be paid for.
    Voting {
        options: Vec<VoteOption>,
        default: u8,
        fallback: u8,
        effect: Option<EffectSpec>,
        success_chance: Option<f64>,
        loot: Option<f64>,
        reprisal: Option<EventId>,
    },
    /// Each seat independently joins or declines; joiners split the pool.
    Participation { pool: f64, effect: EffectSpec },
    /// The Order strikes a target fixed at draw time; seats vote whether to
    /// fund the shared defense pool.
    OrderAttack { strength: f64, defense_pool: f64 },
}

#[derive(Clone, Debug)]
pub struct EventDef {
    pub id: EventId,
    pub name: String,
    pub kind: EventKind,
    pub in_deck: bool,
}

impl EventDef {
    /// Option index for a named option. Only meaningful on voting cards.
    pub fn option_index(&self, name: &str) -> Option<u8> {
        match &self.kind {
            EventKind::Voting { options, .. } => options
                .iter()
                .position(|o| o.id == name)
                .map(|i| i as u8),
            _ => None,
        }
    }

    pub fn option_count(&self) -> u8 {
        match &self.kind {
            EventKind::Voting { options, .. } => options.len() as u8,
            // Immediate cards take no votes at all.
            EventKind::Immediate { .. } => 0,
            // join / decline
            _ => 2,
        }
    }
}

/// Compiled rules. Shared read-only by the engine and the validator.
#[derive(Clone, Debug)]
pub struct Catalog {
    pub graph: RegionGraph,
    events: BTreeMap<EventId, EventDef>,
    deck: Vec<EventId>,
    starting: BTreeMap<RegionId, Controller>,
}

impl Catalog {
    /// Definition for a card. Total by construction: validation refuses any
    /// catalog that is missing an id.
    pub fn event(&self, id: EventId) -> &EventDef {
        &self.events[&id]
    }

    /// Drawable card ids, in deck order.
    pub fn deck(&self) -> &[EventId] {
        &self.deck
    }

    /// Fresh region map for a new game.
    pub fn starting_regions(&self) -> BTreeMap<RegionId, Region> {
        self.starting
            .iter()
            .map(|(&id, &controller)| {
                let region = match controller {
                    Controller::Republic => Region::republic(),
                    Controller::Order => Region::order(),
                };
                (id, region)
            })
            .collect()
    }
}

#[derive(Deserialize)]
struct RawRegions {
    regions: BTreeMap<RegionId, Controller>,
    adjacency: Vec<[RegionId; 2]>,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawKind {
    Immediate,
    Voting,
    Participation,
    OrderAttack,
}

#[derive(Deserialize)]
struct RawOption {
    id: String,
    #[serde(default)]
    pool: Option<f64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEvent {
    name: String,
    kind: RawKind,
    #[serde(default = "default_true")]
    in_deck: bool,
    #[serde(default)]
    options: Vec<RawOption>,
    #[serde(default)]
    default_option: Option<String>,
    #[serde(default)]
    fallback_option: Option<String>,
    #[serde(default)]
    pool: Option<f64>,
    #[serde(default)]
    order_strength: Option<f64>,
    #[serde(default)]
    effect: Option<EffectSpec>,
    #[serde(default)]
    money_per_player: Option<f64>,
    #[serde(default)]
    success_chance: Option<f64>,
    #[serde(default)]
    loot: Option<f64>,
    #[serde(default)]
    reprisal: Option<EventId>,
}

fn default_true() -> bool {
    true
}

pub fn load_catalog(source: CatalogSource<'_>) -> Result<Catalog, RulesError> {
    let (regions_src, events_src) = match source {
        CatalogSource::Embedded => (REGIONS_YAML, EVENTS_YAML),
        CatalogSource::Bytes { regions, events } => (regions, events),
    };

    let raw_regions: RawRegions = serde_yaml::from_str(regions_src)?;
    let raw_events: BTreeMap<EventId, RawEvent> = serde_yaml::from_str(events_src)?;

    let starting = compile_regions(&raw_regions)?;
    let graph = RegionGraph::from_edges(&raw_regions.adjacency);
    for region in RegionId::ALL {
        if graph.neighbors(region).is_empty() {
            return Err(RulesError::Isolated(region));
        }
    }

    let mut events = BTreeMap::new();
    for id in EventId::ALL {
        let raw = raw_events.get(&id).ok_or(RulesError::MissingEvent(id))?;
        events.insert(id, compile_event(id, raw)?);
    }

    // Reprisal cross-references are only checkable once everything compiled.
    for def in events.values() {
        if let EventKind::Voting {
            reprisal: Some(target),
            ..
        } = def.kind
        {
            if !matches!(events[&target].kind, EventKind::OrderAttack { .. }) {
                return Err(RulesError::BadEvent(
                    def.id,
                    format!("reprisal {target:?} is not an order attack"),
                ));
            }
        }
    }

    let deck: Vec<EventId> = events
        .values()
        .filter(|d| d.in_deck)
        .map(|d| d.id)
        .collect();
    if deck.is_empty() {
        return Err(RulesError::EmptyDeck);
    }

    Ok(Catalog {
        graph,
        events,
        deck,
        starting,
    })
}

fn compile_regions(raw: &RawRegions) -> Result<BTreeMap<RegionId, Controller>, RulesError> {
    for id in RegionId::ALL {
        if !raw.regions.contains_key(&id) {
            return Err(RulesError::MissingRegion(id));
        }
    }
    if raw.regions[&RegionId::CAPITAL] != Controller::Republic {
        return Err(RulesError::CapitalNotRepublic);
    }
    if raw.regions[&RegionId::OrderKeep] != Controller::Order {
        return Err(RulesError::KeepNotOrder);
    }
    for [a, b] in &raw.adjacency {
        if a == b {
            return Err(RulesError::SelfLoop(*a));
        }
    }
    Ok(raw.regions.clone())
}

fn compile_event(id: EventId, raw: &RawEvent) -> Result<EventDef, RulesError> {
    let bad = |msg: &str| RulesError::BadEvent(id, msg.to_string());

    let kind = match raw.kind {
        RawKind::Immediate => EventKind::Immediate {
            money_per_player: raw.money_per_player,
            effect: raw.effect.clone(),
        },
        RawKind::Voting => {
            if raw.options.len() < 2 {
                return Err(bad("voting card needs at least two options"));
            }
            let options: Vec<VoteOption> = raw
                .options
                .iter()
                .map(|o| VoteOption {
                    id: o.id.clone(),
                    pool: o.pool,
                })
                .collect();
            let resolve = |field: &Option<String>, what: &str| -> Result<u8, RulesError> {
                let name = field
                    .as_deref()
                    .ok_or_else(|| bad(&format!("voting card is missing {what}")))?;
                options
                    .iter()
                    .position(|o| o.id == name)
                    .map(|i| i as u8)
                    .ok_or_else(|| bad(&format!("{what} `{name}` is not an option")))
            };
            let default = resolve(&raw.default_option, "default_option")?;
            let fallback = resolve(&raw.fallback_option, "fallback_option")?;
            if let Some(chance) = raw.success_chance {
                if !(0.0..=100.0).contains(&chance) {
                    return Err(bad("success_chance must be within 0..=100"));
                }
            }
            EventKind::Voting {
                options,
                default,
                fallback,
                effect: raw.effect.clone(),
                success_chance: raw.success_chance,
                loot: raw.loot,
                reprisal: raw.reprisal,
            }
        }
        RawKind::Participation => EventKind::Participation {
            pool: raw.pool.ok_or_else(|| bad("participation card needs a pool"))?,
            effect: raw
                .effect
                .clone()
                .ok_or_else(|| bad("participation card needs an effect"))?,
        },
        RawKind::OrderAttack => EventKind::OrderAttack {
            strength: raw
                .order_strength
                .ok_or_else(|| bad("order attack needs order_strength"))?,
            defense_pool: raw.pool.ok_or_else(|| bad("order attack needs a defense pool"))?,
        },
    };

    Ok(EventDef {
        id,
        name: raw.name.clone(),
        kind,
        in_deck: raw.in_deck,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_loads() {
        let catalog = load_catalog(CatalogSource::Embedded).unwrap();
        assert_eq!(catalog.deck().len(), 10);
        assert!(!catalog.event(EventId::OrderReprisal).in_deck);
        assert_eq!(catalog.starting_regions().len(), RegionId::ALL.len());
    }

    #[test]
    fn every_event_id_has_a_definition() {
        let catalog = load_catalog(CatalogSource::Embedded).unwrap();
        for id in EventId::ALL {
            assert_eq!(catalog.event(id).id, id);
        }
    }

    #[test]
    fn voting_defaults_resolve() {
        let catalog = load_catalog(CatalogSource::Embedded).unwrap();
        let tithe = catalog.event(EventId::ChurchTithe);
        match &tithe.kind {
            EventKind::Voting {
                options,
                default,
                fallback,
                ..
            } => {
                assert_eq!(options.len(), 2);
                assert_eq!(options[*default as usize].id, "refuse");
                assert_eq!(*fallback, *default);
                assert_eq!(options[0].pool, Some(3.0));
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn rob_merchants_carries_reprisal() {
        let catalog = load_catalog(CatalogSource::Embedded).unwrap();
        match &catalog.event(EventId::RobMerchants).kind {
            EventKind::Voting {
                success_chance,
                loot,
                reprisal,
                ..
            } => {
                assert_eq!(*success_chance, Some(60.0));
                assert_eq!(*loot, Some(2.0));
                assert_eq!(*reprisal, Some(EventId::OrderReprisal));
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn missing_event_is_rejected() {
        let events = "rich_caravan:\n  name: Rich Caravan\n  kind: immediate\n";
        let err = load_catalog(CatalogSource::Bytes {
            regions: super::REGIONS_YAML,
            events,
        })
        .unwrap_err();
        assert!(matches!(err, RulesError::MissingEvent(_)));
    }

    #[test]
    fn unattached_default_option_is_rejected() {
        let events = super::EVENTS_YAML.replace("default_option: refuse", "default_option: burn");
        let err = load_catalog(CatalogSource::Bytes {
            regions: super::REGIONS_YAML,
            events: &events,
        })
        .unwrap_err();
        assert!(matches!(err, RulesError::BadEvent(EventId::ChurchTithe, _)));
    }
}
