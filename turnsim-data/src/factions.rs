//! Faction definitions.

use crate::resources::Resource;
use serde::{Deserialize, Serialize};

pub type FactionId = String;

/// Percentage bonus on one resource's monthly net.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactionBonus {
    pub resource: Resource,
    /// e.g. `10.0` for +10%.
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactionDef {
    pub id: FactionId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: Option<String>,
    /// Applied in this order; later bonuses see earlier ones in the running net.
    #[serde(default)]
    pub bonuses: Vec<FactionBonus>,
}
