use serde::{Deserialize, Serialize};
use turnsim_data::defines::turn as defines;

/// Simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// The economy runs on every positive multiple of this turn number.
    pub turns_per_month: u32,
    /// Countdown given to a freshly placed building.
    pub building_construction_turns: u32,
    /// Countdown given to a settlement when its upgrade starts.
    pub settlement_upgrade_turns: u32,
    /// Most allied units one tile may hold.
    pub max_allied_stack: usize,
    /// Cap on banked turns in permanent mode.
    pub max_accumulated_turns: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            turns_per_month: defines::TURNS_PER_MONTH,
            building_construction_turns: defines::BUILDING_CONSTRUCTION_TURNS,
            settlement_upgrade_turns: defines::SETTLEMENT_UPGRADE_TURNS,
            max_allied_stack: defines::MAX_ALLIED_STACK,
            max_accumulated_turns: defines::MAX_ACCUMULATED_TURNS,
        }
    }
}

impl SimConfig {
    /// Whether `turn` is a monthly economy tick.
    pub fn is_month_tick(&self, turn: u32) -> bool {
        self.turns_per_month > 0 && turn > 0 && turn % self.turns_per_month == 0
    }
}
