//! Combat resolution.
//!
//! Resolution is split in two: a [`CombatResolver`] computes the outcome of
//! one encounter without touching any unit, and [`apply_combat`] writes that
//! outcome back. The turn pipeline records the [`CombatLog`] between the two.

use crate::error::EngineError;
use crate::grid::{Coord, Tile, TileGrid};
use crate::state::{PlayerId, Turn, UnitId, UnitInstance};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use turnsim_data::defines::combat as defines;
use turnsim_data::{GameData, UnitStats, UnitTypeId};

/// One side of an encounter, with everything a resolver may read.
#[derive(Debug, Clone, Copy)]
pub struct Combatant<'a> {
    pub unit: &'a UnitInstance,
    pub stats: &'a UnitStats,
    pub tile: &'a Tile,
    /// Terrain defense multiplier of `tile`, river included.
    pub terrain_bonus: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatResult {
    pub damage_to_defender: i32,
    pub damage_to_attacker: i32,
    pub attacker_survives: bool,
    pub defender_survives: bool,
    /// Whether the defender was in range to strike back.
    pub counter_attack: bool,
    /// Defender's terrain multiplier.
    pub terrain_bonus: f64,
}

/// Formula for a single attacker-vs-defender encounter.
///
/// Implementations must not mutate state; all randomness comes from `rng`.
pub trait CombatResolver {
    fn resolve(
        &self,
        attacker: &Combatant<'_>,
        defender: &Combatant<'_>,
        rng: &mut dyn RngCore,
    ) -> CombatResult;
}

/// The production combat formula.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCombat;

impl StandardCombat {
    fn roll(rng: &mut dyn RngCore) -> f64 {
        rng.gen_range(defines::RANDOM_FACTOR_MIN..=defines::RANDOM_FACTOR_MAX)
    }
}

impl CombatResolver for StandardCombat {
    fn resolve(
        &self,
        attacker: &Combatant<'_>,
        defender: &Combatant<'_>,
        rng: &mut dyn RngCore,
    ) -> CombatResult {
        let river_penalty = if defender.tile.river {
            defines::RIVER_ATTACK_PENALTY
        } else {
            1.0
        };
        let attack_power = f64::from(attacker.stats.attack) * Self::roll(rng) * river_penalty;
        let defense_value = f64::from(defender.stats.defense) * defender.terrain_bonus;
        let damage_to_defender = ((attack_power - defense_value * defines::DEFENSE_WEIGHT).round()
            as i32)
            .max(defines::MIN_ATTACK_DAMAGE);

        let distance = attacker.tile.coord().chebyshev(defender.tile.coord());
        let counter_attack = distance <= defender.stats.range;
        let damage_to_attacker = if counter_attack {
            let counter_power =
                f64::from(defender.stats.attack) * Self::roll(rng) * defines::COUNTER_ATTACK_FACTOR;
            let attacker_defense = f64::from(attacker.stats.defense)
                * attacker.terrain_bonus
                * defines::DEFENSE_WEIGHT;
            ((counter_power - attacker_defense).round() as i32).max(0)
        } else {
            0
        };

        CombatResult {
            damage_to_defender,
            damage_to_attacker,
            attacker_survives: attacker.unit.hp - damage_to_attacker > 0,
            defender_survives: defender.unit.hp - damage_to_defender > 0,
            counter_attack,
            terrain_bonus: defender.terrain_bonus,
        }
    }
}

/// Immutable record of one resolved encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatLog {
    pub turn: Turn,
    pub attacker_id: UnitId,
    pub defender_id: UnitId,
    pub attacker_owner: PlayerId,
    pub defender_owner: PlayerId,
    pub attacker_type: UnitTypeId,
    pub defender_type: UnitTypeId,
    pub location: Coord,
    pub damage_to_defender: i32,
    pub damage_to_attacker: i32,
    pub attacker_survived: bool,
    pub defender_survived: bool,
    pub terrain_bonus: f64,
    /// Unix seconds supplied by the host.
    pub timestamp: u64,
}

/// When an encounter happened, for its log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatStamp {
    pub turn: Turn,
    pub timestamp: u64,
}

fn combatant<'a>(
    unit: &'a UnitInstance,
    grid: &'a TileGrid,
    data: &'a GameData,
) -> Result<Combatant<'a>, EngineError> {
    let unit_type = data
        .unit_type(&unit.type_id)
        .ok_or_else(|| EngineError::UnknownUnitType(unit.type_id.clone()))?;
    let tile = grid
        .at(unit.position())
        .ok_or(EngineError::MissingTile(unit.position()))?;
    Ok(Combatant {
        unit,
        stats: &unit_type.stats,
        tile,
        terrain_bonus: TileGrid::defense_bonus(tile, &data.terrain),
    })
}

fn find_unit(units: &[UnitInstance], id: UnitId) -> Result<&UnitInstance, EngineError> {
    units
        .iter()
        .find(|u| u.id == id)
        .ok_or(EngineError::UnknownUnit(id))
}

/// Resolve one encounter and build its log. Nothing is mutated.
#[allow(clippy::too_many_arguments)]
pub fn resolve_encounter(
    resolver: &dyn CombatResolver,
    units: &[UnitInstance],
    grid: &TileGrid,
    data: &GameData,
    attacker_id: UnitId,
    defender_id: UnitId,
    stamp: CombatStamp,
    rng: &mut dyn RngCore,
) -> Result<(CombatResult, CombatLog), EngineError> {
    let attacker = combatant(find_unit(units, attacker_id)?, grid, data)?;
    let defender = combatant(find_unit(units, defender_id)?, grid, data)?;
    let result = resolver.resolve(&attacker, &defender, rng);

    let log = CombatLog {
        turn: stamp.turn,
        attacker_id,
        defender_id,
        attacker_owner: attacker.unit.owner,
        defender_owner: defender.unit.owner,
        attacker_type: attacker.unit.type_id.clone(),
        defender_type: defender.unit.type_id.clone(),
        location: defender.unit.position(),
        damage_to_defender: result.damage_to_defender,
        damage_to_attacker: result.damage_to_attacker,
        attacker_survived: result.attacker_survives,
        defender_survived: result.defender_survives,
        terrain_bonus: result.terrain_bonus,
        timestamp: stamp.timestamp,
    };
    Ok((result, log))
}

/// Write a resolved outcome back onto both units. HP never drops below zero.
pub fn apply_combat(
    units: &mut [UnitInstance],
    attacker_id: UnitId,
    defender_id: UnitId,
    result: &CombatResult,
) {
    for unit in units.iter_mut() {
        let (damage, survives) = if unit.id == attacker_id {
            (result.damage_to_attacker, result.attacker_survives)
        } else if unit.id == defender_id {
            (result.damage_to_defender, result.defender_survives)
        } else {
            continue;
        };
        unit.hp = (unit.hp - damage).max(0);
        if !survives || unit.hp == 0 {
            unit.hp = 0;
            unit.alive = false;
        }
    }
}

fn is_alive(units: &[UnitInstance], id: UnitId) -> bool {
    units.iter().any(|u| u.id == id && u.alive)
}

/// Fight two groups of units.
///
/// Living attackers strike in order; attacker `i` targets the
/// `i % n`-th surviving defender, where `n` shrinks as defenders fall. Each
/// encounter is applied before the next one is rolled. Stops once no
/// defender is left.
#[instrument(skip_all, name = "army_battle")]
#[allow(clippy::too_many_arguments)]
pub fn resolve_army_battle(
    resolver: &dyn CombatResolver,
    units: &mut [UnitInstance],
    grid: &TileGrid,
    data: &GameData,
    attackers: &[UnitId],
    defenders: &[UnitId],
    stamp: CombatStamp,
    rng: &mut dyn RngCore,
) -> Result<Vec<CombatLog>, EngineError> {
    let living_attackers: Vec<UnitId> = attackers
        .iter()
        .copied()
        .filter(|&id| is_alive(units, id))
        .collect();
    let mut logs = Vec::new();

    for (i, &attacker_id) in living_attackers.iter().enumerate() {
        let surviving: Vec<UnitId> = defenders
            .iter()
            .copied()
            .filter(|&id| is_alive(units, id))
            .collect();
        if surviving.is_empty() {
            break;
        }
        // An attacker killed by an earlier counter-attack sits out
        if !is_alive(units, attacker_id) {
            continue;
        }

        let defender_id = surviving[i % surviving.len()];
        let (result, log) = resolve_encounter(
            resolver,
            units,
            grid,
            data,
            attacker_id,
            defender_id,
            stamp,
            rng,
        )?;
        apply_combat(units, attacker_id, defender_id, &result);
        logs.push(log);
    }

    log::debug!(
        "Army battle: {} encounters, {} of {} defenders left",
        logs.len(),
        defenders.iter().filter(|&&id| is_alive(units, id)).count(),
        defenders.len()
    );
    Ok(logs)
}
