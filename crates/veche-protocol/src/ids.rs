use serde::{Deserialize, Serialize};

/// Player ID is the seat index (exactly 3 seats).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u8);

impl PlayerId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The three player archetypes. Seat index and faction are bound 1:1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    Nobles,
    Merchants,
    Commoners,
}

impl Faction {
    pub const ALL: [Faction; 3] = [Faction::Nobles, Faction::Merchants, Faction::Commoners];

    /// Faction for a seat index (0..2).
    pub fn for_seat(index: usize) -> Faction {
        Self::ALL[index % 3]
    }

    pub fn seat(self) -> usize {
        match self {
            Faction::Nobles => 0,
            Faction::Merchants => 1,
            Faction::Commoners => 2,
        }
    }

    /// Base combat strength, before equipment and effects.
    pub fn base_strength(self) -> f64 {
        match self {
            Faction::Nobles => 40.0,
            Faction::Merchants => 15.0,
            Faction::Commoners => 25.0,
        }
    }

    pub fn building_kinds(self) -> &'static [BuildingKind] {
        match self {
            Faction::Nobles => &[BuildingKind::Church, BuildingKind::Estate],
            Faction::Merchants => &[BuildingKind::TradingPost],
            Faction::Commoners => &[BuildingKind::Workshop, BuildingKind::Mill],
        }
    }
}

/// Who holds a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Controller {
    Republic,
    Order,
}

/// Named territories. The set is closed; adjacency lives in the region data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionId {
    Novgorod,
    Pskov,
    Ladoga,
    Izborsk,
    Koporye,
    Oreshek,
    /// Permanent Order home territory: never controllable by the republic,
    /// always a valid attack origin.
    OrderKeep,
}

impl RegionId {
    pub const ALL: [RegionId; 7] = [
        RegionId::Novgorod,
        RegionId::Pskov,
        RegionId::Ladoga,
        RegionId::Izborsk,
        RegionId::Koporye,
        RegionId::Oreshek,
        RegionId::OrderKeep,
    ];

    pub const CAPITAL: RegionId = RegionId::Novgorod;

    #[inline]
    pub fn is_capital(self) -> bool {
        self == Self::CAPITAL
    }

    #[inline]
    pub fn is_order_home(self) -> bool {
        self == RegionId::OrderKeep
    }
}

/// Building types. Each belongs to one faction; the improvement score of that
/// faction's player tracks how many of these stand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    Church,
    Estate,
    TradingPost,
    Workshop,
    Mill,
}

impl BuildingKind {
    pub fn faction(self) -> Faction {
        match self {
            BuildingKind::Church | BuildingKind::Estate => Faction::Nobles,
            BuildingKind::TradingPost => Faction::Merchants,
            BuildingKind::Workshop | BuildingKind::Mill => Faction::Commoners,
        }
    }

    /// Maximum copies per region. Merchant trading posts stack; everything
    /// else is one per region.
    pub fn per_region_cap(self) -> u8 {
        match self {
            BuildingKind::TradingPost => 7,
            _ => 1,
        }
    }

    /// Trading posts may only be raised in the capital.
    pub fn capital_only(self) -> bool {
        matches!(self, BuildingKind::TradingPost)
    }
}

/// Purchasable equipment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentKind {
    Weapons,
    Armor,
}

/// Event card identifiers. Card data (kind, options, costs) lives in the
/// embedded deck; resolution is dispatched on this id in `veche-core`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventId {
    RichCaravan,
    CityFire,
    HarshWinter,
    CropFailure,
    OrderRaid,
    OrderCrusade,
    ChurchTithe,
    RobMerchants,
    OrderReprisal,
    MercenaryOffer,
    MilitiaMuster,
}

impl EventId {
    pub const ALL: [EventId; 11] = [
        EventId::RichCaravan,
        EventId::CityFire,
        EventId::HarshWinter,
        EventId::CropFailure,
        EventId::OrderRaid,
        EventId::OrderCrusade,
        EventId::ChurchTithe,
        EventId::RobMerchants,
        EventId::OrderReprisal,
        EventId::MercenaryOffer,
        EventId::MilitiaMuster,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seats_and_factions_are_bound() {
        for (i, f) in Faction::ALL.iter().enumerate() {
            assert_eq!(Faction::for_seat(i), *f);
            assert_eq!(f.seat(), i);
        }
    }

    #[test]
    fn building_caps() {
        assert_eq!(BuildingKind::TradingPost.per_region_cap(), 7);
        assert!(BuildingKind::TradingPost.capital_only());
        assert_eq!(BuildingKind::Church.per_region_cap(), 1);
        assert!(!BuildingKind::Mill.capital_only());
    }

    #[test]
    fn region_ids_roundtrip_as_snake_case() {
        let json = serde_json::to_string(&RegionId::OrderKeep).unwrap();
        assert_eq!(json, "\"order_keep\"");
        let back: RegionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RegionId::OrderKeep);
    }
}
