//! Error taxonomy.
//!
//! [`EngineError`] is a reference-data or snapshot defect and aborts the
//! operation. [`RuleViolation`] is a legitimate player-facing rejection; the
//! state is left untouched and the caller decides how to surface it.

use crate::grid::{Coord, Margins};
use crate::state::{ArmyId, PlayerId, SettlementId, UnitId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Unknown unit type '{0}'")]
    UnknownUnitType(String),
    #[error("Unknown building type '{0}'")]
    UnknownBuildingType(String),
    #[error("Unknown faction '{0}'")]
    UnknownFaction(String),
    #[error("Unit {0} not found")]
    UnknownUnit(UnitId),
    #[error("No tile at {0}")]
    MissingTile(Coord),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("Insufficient resources")]
    InsufficientResources,
    #[error("Requires a {building} within 1 tile")]
    MissingBuilding { building: String },
    #[error("Unit {unit} cannot move to {to}")]
    IllegalMove { unit: UnitId, to: Coord },
    #[error("Player {player} does not own this")]
    NotOwner { player: PlayerId },
    #[error("Unit {0} is not alive")]
    UnitNotAlive(UnitId),
    #[error("Unit {0} not found")]
    UnitNotFound(UnitId),
    #[error("Army {0} not found")]
    ArmyNotFound(ArmyId),
    #[error("Settlement {0} not found")]
    SettlementNotFound(SettlementId),
    #[error("Units are not on the same tile")]
    NotCoLocated,
    #[error("An army needs at least one unit")]
    EmptyArmy,
    #[error("Unit {0} already belongs to an army")]
    AlreadyInArmy(UnitId),
    #[error("Settlement is already upgrading")]
    AlreadyUpgrading,
    #[error("Settlement is already at the highest tier")]
    MaxTier,
    #[error("{0} is outside the map")]
    OutOfBounds(Coord),
    #[error("Player has no turns left")]
    NoTurnsLeft,
}

/// Grid construction and mutation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("{0} is outside the {1}x{2} grid")]
    OutOfBounds(Coord, i32, i32),
    #[error("Grid dimensions must be at least 1x1 (got {width}x{height})")]
    InvalidDimensions { width: i32, height: i32 },
    #[error("Margins must not be negative (got {0:?})")]
    NegativeMargins(Margins),
    #[error("Chunk ({0}, {1}) does not fit the grid")]
    ChunkOutOfBounds(i32, i32),
}
