//! Unit type definitions.

use crate::resources::ResourceBag;
use serde::{Deserialize, Serialize};

pub type UnitTypeId = String;

/// Which terrain passability flag a unit obeys when moving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    #[default]
    Land,
    Naval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub movement: u32,
    pub range: u32,
    pub sight: u32,
}

/// Static unit definition, shared by every instance of the type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitType {
    pub id: UnitTypeId,
    pub name: String,
    pub stats: UnitStats,
    #[serde(default)]
    pub domain: Domain,
    /// Paid once on recruitment.
    #[serde(default)]
    pub cost: ResourceBag,
    /// Paid every month while the unit lives.
    #[serde(default)]
    pub upkeep: ResourceBag,
    #[serde(default)]
    pub can_reproduce: bool,
    /// Chance in [0, 1] of spawning one offspring per month.
    #[serde(default)]
    pub reproduction_chance: f64,
    /// Building type that must stand at or next to the recruitment tile.
    #[serde(default)]
    pub required_building: Option<String>,
}
