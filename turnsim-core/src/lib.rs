//! # Turn Simulation Core
//!
//! Deterministic engine for a persistent turn-based strategy game.
//!
//! The engine is a pure function of its inputs: a snapshot, the actions every
//! player submitted for the turn, the reference data and a seeded RNG go in;
//! the next snapshot, combat logs and player messages come out. Storage,
//! scheduling and transport belong to the host.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌───────────────┐
//! │   Players    │────▶│ PlayerActions │────▶│  TurnEngine   │
//! │  (submit)    │     │  (per turn)   │     │ (7 phases)    │
//! └──────────────┘     └───────────────┘     └───────┬───────┘
//!                                                    │
//!        ┌──────────────┬──────────────┬─────────────┼──────────────┐
//!        ▼              ▼              ▼             ▼              ▼
//!   UnitManager    CombatResolver  EconomyEngine  Pathfinder     TileGrid
//!                                                    │
//!                                             ┌──────▼───────┐
//!                                             │ TurnOutcome  │
//!                                             │ (new state)  │
//!                                             └──────────────┘
//! ```
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`GameSnapshot`] | Everything persisted for one game |
//! | [`TurnAction`] | Player orders (Move, Build, Recruit, ...) |
//! | [`TurnEngine`] | `(snapshot, actions, seed) -> outcome` |
//! | [`CombatResolver`] | Pluggable single-encounter formula |
//! | [`Pathfinder`] | A* and reachable sets over the tile grid |
//! | [`EconomyEngine`] | Monthly ledger and resource application |

pub mod combat;
pub mod config;
pub mod economy;
pub mod error;
pub mod grid;
pub mod input;
pub mod pathing;
pub mod rng;
pub mod state;
pub mod testing;
pub mod turn;
pub mod units;

pub use combat::{
    apply_combat, resolve_army_battle, resolve_encounter, CombatLog, CombatResolver,
    CombatResult, Combatant, StandardCombat,
};
pub use config::SimConfig;
pub use economy::{EconomyEngine, EconomyReport, LedgerEntry, ProductionOutcome};
pub use error::{EngineError, GridError, RuleViolation};
pub use grid::{Coord, Margins, Tile, TileChunk, TileGrid};
pub use input::{PlayerActions, TurnAction};
pub use pathing::{PathResult, Pathfinder};
pub use rng::{sim_rng, SimRng};
pub use state::{
    Army, BuildingInstance, DiplomacyState, DiplomacyStatus, GameSnapshot, Player,
    SettlementInstance, SettlementTier, UnitInstance,
};
pub use turn::{Message, TurnEngine, TurnOutcome};
pub use units::{RecruitCheck, UnitManager};
