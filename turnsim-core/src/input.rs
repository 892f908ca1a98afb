use crate::grid::Coord;
use crate::state::{ArmyId, PlayerId, SettlementId, UnitId};
use serde::{Deserialize, Serialize};
use turnsim_data::{BuildingTypeId, UnitTypeId};

/// Everything one player submitted for the turn being resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerActions {
    pub player: PlayerId,
    pub actions: Vec<TurnAction>,
}

impl PlayerActions {
    pub fn new(player: PlayerId, actions: Vec<TurnAction>) -> Self {
        Self { player, actions }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnAction {
    // Movement (phase 1)
    Move {
        unit: UnitId,
        to: Coord,
    },
    MoveArmy {
        army: ArmyId,
        to: Coord,
    },
    CreateArmy {
        units: Vec<UnitId>,
    },
    DisbandArmy {
        army: ArmyId,
    },

    // Construction (phase 3)
    Build {
        building: BuildingTypeId,
        at: Coord,
        /// Unit consumed to found the building.
        #[serde(default)]
        sacrifice: Option<UnitId>,
    },
    Recruit {
        unit_type: UnitTypeId,
        at: Coord,
    },
    UpgradeSettlement {
        settlement: SettlementId,
    },
}
