//! Terrain kinds and their static definitions.

use crate::error::DataError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Every terrain a tile can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainKind {
    // Water
    DeepOcean,
    Ocean,
    Sea,
    CoastalWater,
    Lake,
    Reef,
    // Flat
    Plains,
    Grassland,
    Farmland,
    Meadow,
    Steppe,
    Savanna,
    Prairie,
    // Arid
    Desert,
    Dunes,
    Badlands,
    SaltFlat,
    Oasis,
    // Cold
    Tundra,
    Snowfield,
    Glacier,
    Taiga,
    // Forest
    Forest,
    DenseForest,
    Jungle,
    Rainforest,
    Woodland,
    // Wetland
    Swamp,
    Marsh,
    Bog,
    Mangrove,
    Floodplain,
    // Elevated
    Hills,
    Highlands,
    Plateau,
    Mountains,
    HighMountains,
    Volcano,
    Canyon,
}

impl TerrainKind {
    pub const COUNT: usize = 39;

    /// All kinds, in declaration order.
    pub const ALL: [TerrainKind; Self::COUNT] = [
        TerrainKind::DeepOcean,
        TerrainKind::Ocean,
        TerrainKind::Sea,
        TerrainKind::CoastalWater,
        TerrainKind::Lake,
        TerrainKind::Reef,
        TerrainKind::Plains,
        TerrainKind::Grassland,
        TerrainKind::Farmland,
        TerrainKind::Meadow,
        TerrainKind::Steppe,
        TerrainKind::Savanna,
        TerrainKind::Prairie,
        TerrainKind::Desert,
        TerrainKind::Dunes,
        TerrainKind::Badlands,
        TerrainKind::SaltFlat,
        TerrainKind::Oasis,
        TerrainKind::Tundra,
        TerrainKind::Snowfield,
        TerrainKind::Glacier,
        TerrainKind::Taiga,
        TerrainKind::Forest,
        TerrainKind::DenseForest,
        TerrainKind::Jungle,
        TerrainKind::Rainforest,
        TerrainKind::Woodland,
        TerrainKind::Swamp,
        TerrainKind::Marsh,
        TerrainKind::Bog,
        TerrainKind::Mangrove,
        TerrainKind::Floodplain,
        TerrainKind::Hills,
        TerrainKind::Highlands,
        TerrainKind::Plateau,
        TerrainKind::Mountains,
        TerrainKind::HighMountains,
        TerrainKind::Volcano,
        TerrainKind::Canyon,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    pub fn is_water(self) -> bool {
        matches!(
            self,
            TerrainKind::DeepOcean
                | TerrainKind::Ocean
                | TerrainKind::Sea
                | TerrainKind::CoastalWater
                | TerrainKind::Lake
                | TerrainKind::Reef
        )
    }
}

/// Static, read-only properties of one terrain kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainDef {
    /// Cost to enter a tile of this terrain. Always at least 1.
    pub movement_cost: u32,
    /// Multiplier applied to a defender's base defense.
    pub defense_bonus: f64,
    /// Grain produced per month by an owned tile.
    pub food_yield: i64,
    pub land_passable: bool,
    pub naval_passable: bool,
}

impl TerrainDef {
    const fn land(movement_cost: u32, defense_bonus: f64, food_yield: i64) -> Self {
        Self {
            movement_cost,
            defense_bonus,
            food_yield,
            land_passable: true,
            naval_passable: false,
        }
    }

    const fn water(movement_cost: u32, food_yield: i64) -> Self {
        Self {
            movement_cost,
            defense_bonus: 1.0,
            food_yield,
            land_passable: false,
            naval_passable: true,
        }
    }

    const fn impassable(defense_bonus: f64) -> Self {
        Self {
            movement_cost: 99,
            defense_bonus,
            food_yield: 0,
            land_passable: false,
            naval_passable: false,
        }
    }

    /// Builtin definition for a kind.
    pub const fn builtin(kind: TerrainKind) -> Self {
        match kind {
            TerrainKind::DeepOcean => Self::water(2, 0),
            TerrainKind::Ocean => Self::water(1, 1),
            TerrainKind::Sea => Self::water(1, 1),
            TerrainKind::CoastalWater => Self::water(1, 2),
            TerrainKind::Lake => Self::water(1, 2),
            TerrainKind::Reef => Self::water(3, 1),
            TerrainKind::Plains => Self::land(1, 1.0, 2),
            TerrainKind::Grassland => Self::land(1, 1.0, 2),
            TerrainKind::Farmland => Self::land(1, 1.0, 4),
            TerrainKind::Meadow => Self::land(1, 1.0, 3),
            TerrainKind::Steppe => Self::land(1, 0.9, 1),
            TerrainKind::Savanna => Self::land(1, 1.0, 1),
            TerrainKind::Prairie => Self::land(1, 1.0, 2),
            TerrainKind::Desert => Self::land(2, 1.0, 0),
            TerrainKind::Dunes => Self::land(3, 1.1, 0),
            TerrainKind::Badlands => Self::land(2, 1.2, 0),
            TerrainKind::SaltFlat => Self::land(1, 0.9, 0),
            TerrainKind::Oasis => Self::land(1, 1.0, 3),
            TerrainKind::Tundra => Self::land(2, 1.0, 1),
            TerrainKind::Snowfield => Self::land(3, 1.1, 0),
            TerrainKind::Glacier => Self::impassable(1.0),
            TerrainKind::Taiga => Self::land(2, 1.25, 1),
            TerrainKind::Forest => Self::land(2, 1.25, 1),
            TerrainKind::DenseForest => Self::land(3, 1.5, 1),
            TerrainKind::Jungle => Self::land(3, 1.5, 1),
            TerrainKind::Rainforest => Self::land(3, 1.5, 2),
            TerrainKind::Woodland => Self::land(2, 1.2, 1),
            TerrainKind::Swamp => Self::land(3, 0.8, 1),
            TerrainKind::Marsh => Self::land(3, 0.8, 1),
            TerrainKind::Bog => Self::land(3, 0.8, 0),
            TerrainKind::Mangrove => Self::land(3, 1.1, 1),
            TerrainKind::Floodplain => Self::land(1, 0.9, 4),
            TerrainKind::Hills => Self::land(2, 1.5, 1),
            TerrainKind::Highlands => Self::land(2, 1.5, 1),
            TerrainKind::Plateau => Self::land(2, 1.3, 1),
            TerrainKind::Mountains => Self::land(3, 2.0, 0),
            TerrainKind::HighMountains => Self::impassable(2.5),
            TerrainKind::Volcano => Self::impassable(1.0),
            TerrainKind::Canyon => Self::land(3, 1.75, 0),
        }
    }
}

/// Lookup table with a definition for every [`TerrainKind`].
///
/// Construction guarantees completeness, so lookups never fail.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainTable {
    defs: [TerrainDef; TerrainKind::COUNT],
}

impl Default for TerrainTable {
    fn default() -> Self {
        Self {
            defs: TerrainKind::ALL.map(TerrainDef::builtin),
        }
    }
}

impl TerrainTable {
    /// Build a table from a per-kind map. Every kind must be present.
    pub fn from_map(map: &HashMap<TerrainKind, TerrainDef>) -> Result<Self, DataError> {
        let mut table = Self::default();
        for kind in TerrainKind::ALL {
            let def = map.get(&kind).ok_or(DataError::MissingTerrain(kind))?;
            table.set(kind, *def)?;
        }
        Ok(table)
    }

    #[inline]
    pub fn get(&self, kind: TerrainKind) -> &TerrainDef {
        &self.defs[kind.index()]
    }

    /// Replace one definition. Movement costs must be at least 1.
    pub fn set(&mut self, kind: TerrainKind, def: TerrainDef) -> Result<(), DataError> {
        if def.movement_cost == 0 {
            return Err(DataError::Invalid(format!(
                "terrain {kind:?} has zero movement cost"
            )));
        }
        self.defs[kind.index()] = def;
        Ok(())
    }

    /// Smallest movement cost of any terrain. Admissible heuristics scale by this.
    pub fn min_movement_cost(&self) -> u32 {
        self.defs
            .iter()
            .map(|d| d.movement_cost)
            .min()
            .unwrap_or(1)
    }
}
