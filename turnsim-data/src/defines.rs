//! Game mechanic constants (defines).
//!
//! Fixed rule values shared by the engine. Anything a host is expected to
//! tune per game lives in the engine's `SimConfig` instead.

/// Combat constants
pub mod combat {
    /// Lower bound of the uniform damage roll
    pub const RANDOM_FACTOR_MIN: f64 = 0.8;

    /// Upper bound of the uniform damage roll
    pub const RANDOM_FACTOR_MAX: f64 = 1.2;

    /// Attack multiplier when the defender stands on a river tile
    pub const RIVER_ATTACK_PENALTY: f64 = 0.9;

    /// Counter-attacks strike at 70% strength
    pub const COUNTER_ATTACK_FACTOR: f64 = 0.70;

    /// Share of the effective defense subtracted from incoming damage
    pub const DEFENSE_WEIGHT: f64 = 0.5;

    /// A successful attack always deals at least this much damage
    pub const MIN_ATTACK_DAMAGE: i32 = 1;
}

/// Map constants
pub mod map {
    /// Flat defense addend for a tile with a river
    pub const RIVER_DEFENSE_BONUS: f64 = 0.25;

    /// Movement cost of any tile with a road, regardless of terrain
    pub const ROAD_MOVEMENT_COST: u32 = 1;

    /// Side length of a storage chunk, in tiles
    pub const CHUNK_SIZE: i32 = 16;
}

/// Economy constants
pub mod economy {
    /// Monthly treasury income of a settlement per tier
    pub const CAMPFIRE_TAX: i64 = 2;
    pub const VILLAGE_TAX: i64 = 10;
    pub const TOWN_TAX: i64 = 25;
    pub const CITY_TAX: i64 = 50;
    pub const CAPITAL_TAX: i64 = 100;
}

/// Turn pipeline constants
pub mod turn {
    /// Turns between two monthly economy ticks
    pub const TURNS_PER_MONTH: u32 = 10;

    /// Turns a newly placed building needs before it produces
    pub const BUILDING_CONSTRUCTION_TURNS: u32 = 3;

    /// Turns a settlement needs to reach its next tier
    pub const SETTLEMENT_UPGRADE_TURNS: u32 = 5;

    /// At most this many allied units may share a tile
    pub const MAX_ALLIED_STACK: usize = 2;

    /// Cap on banked turns in permanent mode
    pub const MAX_ACCUMULATED_TURNS: u32 = 10;

    /// Seconds in one day, for accumulated-turn accounting
    pub const SECONDS_PER_DAY: u64 = 86_400;
}
