//! Building type definitions.

use crate::resources::ResourceBag;
use serde::{Deserialize, Serialize};

pub type BuildingTypeId = String;

/// Static building definition.
///
/// These are immutable after loading and shared across all instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingType {
    pub id: BuildingTypeId,
    pub name: String,
    /// Fixed production added every month once construction completes.
    #[serde(default)]
    pub production: ResourceBag,
}
