//! Reference data for the turn simulation.
//!
//! Terrain, unit, building and faction definitions are loaded once at startup
//! into a [`GameData`] and then only ever read. The engine receives it by
//! reference on every call.

pub mod buildings;
pub mod defines;
pub mod error;
pub mod factions;
pub mod resources;
pub mod terrain;
pub mod units;

pub use buildings::{BuildingType, BuildingTypeId};
pub use error::DataError;
pub use factions::{FactionBonus, FactionDef, FactionId};
pub use resources::{Resource, ResourceBag};
pub use terrain::{TerrainDef, TerrainKind, TerrainTable};
pub use units::{Domain, UnitStats, UnitType, UnitTypeId};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// On-disk shape of a data file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GameDataFile {
    /// Overrides for the builtin terrain table. When present, every kind must be listed.
    #[serde(default)]
    pub terrain: Option<HashMap<TerrainKind, TerrainDef>>,
    #[serde(default)]
    pub units: Vec<UnitType>,
    #[serde(default)]
    pub buildings: Vec<BuildingType>,
    #[serde(default)]
    pub factions: Vec<FactionDef>,
}

/// Immutable lookup tables for all reference data.
#[derive(Debug, Clone, Default)]
pub struct GameData {
    pub terrain: TerrainTable,
    pub unit_types: BTreeMap<UnitTypeId, UnitType>,
    pub building_types: BTreeMap<BuildingTypeId, BuildingType>,
    pub factions: BTreeMap<FactionId, FactionDef>,
}

impl GameData {
    /// Load and validate a JSON data file.
    pub fn load(path: &Path) -> Result<Self, DataError> {
        if !path.exists() {
            return Err(DataError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let data = Self::from_json_str(&text)?;
        log::info!(
            "Loaded {} unit types, {} building types, {} factions from {}",
            data.unit_types.len(),
            data.building_types.len(),
            data.factions.len(),
            path.display()
        );
        Ok(data)
    }

    pub fn from_json_str(text: &str) -> Result<Self, DataError> {
        let file: GameDataFile = serde_json::from_str(text)?;
        Self::from_file(file)
    }

    pub fn from_file(file: GameDataFile) -> Result<Self, DataError> {
        let terrain = match &file.terrain {
            Some(map) => TerrainTable::from_map(map)?,
            None => TerrainTable::default(),
        };

        let mut data = GameData {
            terrain,
            ..Default::default()
        };
        for unit in file.units {
            data.insert_unit_type(unit)?;
        }
        for building in file.buildings {
            data.insert_building_type(building)?;
        }
        for faction in file.factions {
            if data.factions.contains_key(&faction.id) {
                return Err(DataError::Duplicate {
                    kind: "faction",
                    id: faction.id,
                });
            }
            data.factions.insert(faction.id.clone(), faction);
        }

        data.validate()?;
        Ok(data)
    }

    pub fn insert_unit_type(&mut self, unit: UnitType) -> Result<(), DataError> {
        if self.unit_types.contains_key(&unit.id) {
            return Err(DataError::Duplicate {
                kind: "unit type",
                id: unit.id,
            });
        }
        self.unit_types.insert(unit.id.clone(), unit);
        Ok(())
    }

    pub fn insert_building_type(&mut self, building: BuildingType) -> Result<(), DataError> {
        if self.building_types.contains_key(&building.id) {
            return Err(DataError::Duplicate {
                kind: "building type",
                id: building.id,
            });
        }
        self.building_types.insert(building.id.clone(), building);
        Ok(())
    }

    /// Cross-reference checks that only make sense once everything is loaded.
    pub fn validate(&self) -> Result<(), DataError> {
        for unit in self.unit_types.values() {
            if let Some(building) = &unit.required_building
                && !self.building_types.contains_key(building)
            {
                return Err(DataError::UnknownRequiredBuilding {
                    unit: unit.id.clone(),
                    building: building.clone(),
                });
            }
            if !(0.0..=1.0).contains(&unit.reproduction_chance) {
                return Err(DataError::Invalid(format!(
                    "unit type '{}' has reproduction chance {} outside [0, 1]",
                    unit.id, unit.reproduction_chance
                )));
            }
            if unit.stats.hp <= 0 {
                return Err(DataError::Invalid(format!(
                    "unit type '{}' has non-positive hp",
                    unit.id
                )));
            }
        }
        Ok(())
    }

    pub fn unit_type(&self, id: &str) -> Option<&UnitType> {
        self.unit_types.get(id)
    }

    pub fn building_type(&self, id: &str) -> Option<&BuildingType> {
        self.building_types.get(id)
    }

    pub fn faction(&self, id: &str) -> Option<&FactionDef> {
        self.factions.get(id)
    }
}
