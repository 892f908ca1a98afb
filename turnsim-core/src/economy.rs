//! Monthly economy: production, upkeep, tax, faction bonuses and reproduction.
//!
//! [`EconomyEngine::simulate`] is a pure preview. Nothing changes until the
//! caller applies [`EconomyEngine::execute_production`] and appends the units
//! from [`EconomyEngine::process_reproduction`].
//!
//! # Order
//! ```text
//! 1. constructed buildings   +production
//! 2. owned tiles             +terrain food (grain)
//! 3. living units            -upkeep
//! 4. reproducing units       forecast only, no delta
//! 5. settlements             +tier tax (gold)
//! 6. faction bonuses         +round(running_net x percent / 100), in listed order
//! ```
//! Bonuses compound on whatever has been accumulated before them, so two
//! +50% grain bonuses yield more than a single +100% one.

use crate::error::EngineError;
use crate::grid::Coord;
use crate::state::{
    BuildingId, GameSnapshot, Player, PlayerId, SettlementId, SettlementTier, UnitId,
    UnitInstance,
};
use crate::units::UnitManager;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use turnsim_data::{FactionId, GameData, Resource, ResourceBag, UnitTypeId};

/// One line of a monthly report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEntry {
    Production {
        building: BuildingId,
        resource: Resource,
        amount: i64,
    },
    TileYield {
        at: Coord,
        amount: i64,
    },
    Upkeep {
        unit: UnitId,
        resource: Resource,
        amount: i64,
    },
    ReproductionForecast {
        unit: UnitId,
        type_id: UnitTypeId,
        chance: f64,
    },
    SettlementTax {
        settlement: SettlementId,
        tier: SettlementTier,
        amount: i64,
    },
    /// `percent` of the resource's running net at this point of the ledger.
    ///
    /// `amount` rounds half away from zero in both directions (`f64::round`):
    /// 7.5 gives 8 and -1.5 gives -2.
    FactionBonus {
        faction: FactionId,
        resource: Resource,
        percent: f64,
        amount: i64,
    },
}

impl LedgerEntry {
    /// The resource change this line contributes, if any.
    pub fn delta(&self) -> Option<(Resource, i64)> {
        match *self {
            LedgerEntry::Production {
                resource, amount, ..
            }
            | LedgerEntry::Upkeep {
                resource, amount, ..
            }
            | LedgerEntry::FactionBonus {
                resource, amount, ..
            } => Some((resource, amount)),
            LedgerEntry::TileYield { amount, .. } => Some((Resource::Grain, amount)),
            LedgerEntry::SettlementTax { amount, .. } => Some((Resource::Gold, amount)),
            LedgerEntry::ReproductionForecast { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EconomyReport {
    pub player: PlayerId,
    pub entries: Vec<LedgerEntry>,
    /// Sum of all entry deltas.
    pub net: ResourceBag,
    pub warnings: Vec<String>,
}

impl EconomyReport {
    fn push(&mut self, entry: LedgerEntry) {
        if let Some((resource, amount)) = entry.delta() {
            self.net.add(resource, amount);
        }
        self.entries.push(entry);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductionOutcome {
    /// The player's pool after the month, every entry non-negative.
    pub resources: ResourceBag,
    /// Always empty: shortages warn about desertion but nobody leaves yet.
    pub deserted_units: Vec<UnitId>,
}

pub struct EconomyEngine;

impl EconomyEngine {
    /// Preview one month for `player`.
    #[instrument(skip_all, name = "economy_simulate")]
    pub fn simulate(
        state: &GameSnapshot,
        data: &GameData,
        player: &Player,
    ) -> Result<EconomyReport, EngineError> {
        let mut report = EconomyReport {
            player: player.id,
            ..Default::default()
        };

        for building in state
            .buildings
            .iter()
            .filter(|b| b.owner == player.id && b.constructed)
        {
            let def = data
                .building_type(&building.type_id)
                .ok_or_else(|| EngineError::UnknownBuildingType(building.type_id.clone()))?;
            for (resource, amount) in def.production.iter() {
                report.push(LedgerEntry::Production {
                    building: building.id,
                    resource,
                    amount,
                });
            }
        }

        for tile in state.grid.iter().filter(|t| t.owner == Some(player.id)) {
            let food = data.terrain.get(tile.terrain).food_yield;
            if food != 0 {
                report.push(LedgerEntry::TileYield {
                    at: tile.coord(),
                    amount: food,
                });
            }
        }

        let owned_units: Vec<&UnitInstance> = state
            .units
            .iter()
            .filter(|u| u.owner == player.id && u.alive)
            .collect();

        for unit in &owned_units {
            let def = data
                .unit_type(&unit.type_id)
                .ok_or_else(|| EngineError::UnknownUnitType(unit.type_id.clone()))?;
            for (resource, amount) in def.upkeep.iter() {
                report.push(LedgerEntry::Upkeep {
                    unit: unit.id,
                    resource,
                    amount: -amount,
                });
            }
        }

        for unit in &owned_units {
            if let Some(def) = data.unit_type(&unit.type_id).filter(|d| d.can_reproduce) {
                report.push(LedgerEntry::ReproductionForecast {
                    unit: unit.id,
                    type_id: def.id.clone(),
                    chance: def.reproduction_chance,
                });
            }
        }

        for settlement in state.settlements.iter().filter(|s| s.owner == player.id) {
            report.push(LedgerEntry::SettlementTax {
                settlement: settlement.id,
                tier: settlement.tier,
                amount: settlement.tier.tax(),
            });
        }

        if let Some(faction_id) = &player.faction {
            let faction = data
                .faction(faction_id)
                .ok_or_else(|| EngineError::UnknownFaction(faction_id.clone()))?;
            for bonus in &faction.bonuses {
                let running = report.net.get(bonus.resource);
                let amount = (running as f64 * bonus.percent / 100.0).round() as i64;
                report.push(LedgerEntry::FactionBonus {
                    faction: faction.id.clone(),
                    resource: bonus.resource,
                    percent: bonus.percent,
                    amount,
                });
            }
        }

        let grain = report.net.get(Resource::Grain);
        if grain < 0 {
            report.warnings.push(format!(
                "Grain shortage: net grain {} per month, units risk deserting",
                grain
            ));
        }
        let gold = report.net.get(Resource::Gold);
        if gold < 0 {
            report
                .warnings
                .push(format!("Treasury deficit: net gold {} per month", gold));
        }

        Ok(report)
    }

    /// Apply a report's net onto the player's current pool. Deficits are
    /// absorbed at zero rather than carried as debt.
    pub fn execute_production(player: &Player, report: &EconomyReport) -> ProductionOutcome {
        let mut resources = player.resources.clone();
        resources.add_all(&report.net);
        resources.clamp_non_negative();
        ProductionOutcome {
            resources,
            deserted_units: Vec::new(),
        }
    }

    /// Roll once per living, reproducing unit of `player`.
    ///
    /// Offspring stand on the parent's tile, already spent for the current
    /// turn. They receive fresh ids but are not inserted into `state.units`.
    #[instrument(skip_all, name = "reproduction")]
    pub fn process_reproduction(
        state: &mut GameSnapshot,
        data: &GameData,
        player: PlayerId,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<UnitInstance>, EngineError> {
        let mut parents = Vec::new();
        for unit in state.units.iter().filter(|u| u.owner == player && u.alive) {
            let def = data
                .unit_type(&unit.type_id)
                .ok_or_else(|| EngineError::UnknownUnitType(unit.type_id.clone()))?;
            if def.can_reproduce {
                parents.push((unit.type_id.clone(), unit.position(), def.reproduction_chance));
            }
        }

        let mut offspring = Vec::new();
        for (type_id, at, chance) in parents {
            if rng.gen::<f64>() >= chance {
                continue;
            }
            let id = state.allocate_unit_id();
            let mut unit = UnitManager::create_unit(data, id, &type_id, player, at, state.turn)?;
            unit.has_moved = true;
            unit.has_acted = true;
            log::debug!("Player {} gained a {} at {}", player, type_id, at);
            offspring.push(unit);
        }
        Ok(offspring)
    }
}
