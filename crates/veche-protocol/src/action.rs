use serde::{Deserialize, Serialize};

use crate::ids::{BuildingKind, EquipmentKind, RegionId};

/// All client→session game actions. Fully serializable; the wire tag uses the
/// protocol's SCREAMING_SNAKE_CASE action names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    NextPhase,
    BuildBuilding {
        building: BuildingKind,
        /// Defaults to the construction substate's selected region.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        region: Option<RegionId>,
    },
    BuyEquipment { item: EquipmentKind },

    /// Option index into the current event card's option list. Participation
    /// and order-attack cards use 0 = join/defend, 1 = decline.
    VoteEvent { vote: u8 },
    ResolveEvent,

    InitiateAttack { target: RegionId },
    VoteAttack { vote: bool },
    ExecuteAttack,
    CancelAttack,

    InitiateFortress { target: RegionId },
    VoteFortress { vote: bool },
    ExecuteFortress,
    CancelFortress,

    ResetGame,
}

impl Action {
    /// Wire tag of this action, echoed back in action results.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::NextPhase => "NEXT_PHASE",
            Action::BuildBuilding { .. } => "BUILD_BUILDING",
            Action::BuyEquipment { .. } => "BUY_EQUIPMENT",
            Action::VoteEvent { .. } => "VOTE_EVENT",
            Action::ResolveEvent => "RESOLVE_EVENT",
            Action::InitiateAttack { .. } => "INITIATE_ATTACK",
            Action::VoteAttack { .. } => "VOTE_ATTACK",
            Action::ExecuteAttack => "EXECUTE_ATTACK",
            Action::CancelAttack => "CANCEL_ATTACK",
            Action::InitiateFortress { .. } => "INITIATE_FORTRESS",
            Action::VoteFortress { .. } => "VOTE_FORTRESS",
            Action::ExecuteFortress => "EXECUTE_FORTRESS",
            Action::CancelFortress => "CANCEL_FORTRESS",
            Action::ResetGame => "RESET_GAME",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_tags_match_serde_tags() {
        let action = Action::InitiateAttack {
            target: RegionId::Pskov,
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], action.kind());
        assert_eq!(json["target"], "pskov");
    }

    #[test]
    fn unit_variants_roundtrip() {
        for action in [Action::NextPhase, Action::ResolveEvent, Action::ResetGame] {
            let json = serde_json::to_string(&action).unwrap();
            let back: Action = serde_json::from_str(&json).unwrap();
            assert_eq!(back, action);
        }
    }
}
