//! Turn resolution pipeline.
//!
//! ```text
//! 1. movement      armies formed/disbanded, then unit and army moves
//! 2. combat        adjacent enemy pairs, each pair once
//! 3. orders        build, recruit, settlement upgrades
//! 4. construction  building countdowns
//! 5. upgrades      settlement countdowns
//! 6. economy       monthly ticks only
//! 7. reset         unit and player turn flags, armies with no survivors
//! ```
//!
//! A rejected action becomes a message for the player who sent it and the
//! phase carries on. A data error aborts the whole turn; since resolution
//! works on a copy, the caller's snapshot is never half-updated.

use crate::combat::{
    apply_combat, resolve_encounter, CombatLog, CombatResolver, CombatStamp, StandardCombat,
};
use crate::config::SimConfig;
use crate::economy::EconomyEngine;
use crate::error::{EngineError, RuleViolation};
use crate::grid::Coord;
use crate::input::{PlayerActions, TurnAction};
use crate::state::{
    ArmyId, BuildingInstance, GameSnapshot, Player, PlayerId, SettlementId, UnitId, UnitInstance,
};
use crate::units::UnitManager;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::instrument;
use turnsim_data::defines::turn::SECONDS_PER_DAY;
use turnsim_data::GameData;

/// Player-facing text produced during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// `None` for messages addressed to everyone.
    pub player: Option<PlayerId>,
    pub text: String,
}

impl Message {
    fn to(player: PlayerId, text: impl Into<String>) -> Self {
        Self {
            player: Some(player),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The resolved state. The turn counter is not advanced.
    pub snapshot: GameSnapshot,
    pub combat_logs: Vec<CombatLog>,
    /// Recruited and newborn units; also present in `snapshot.units`.
    pub new_units: Vec<UnitInstance>,
    pub messages: Vec<Message>,
}

pub struct TurnEngine {
    config: SimConfig,
    resolver: Box<dyn CombatResolver>,
}

impl Default for TurnEngine {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl TurnEngine {
    pub fn new(config: SimConfig) -> Self {
        Self::with_resolver(config, Box::new(StandardCombat))
    }

    pub fn with_resolver(config: SimConfig, resolver: Box<dyn CombatResolver>) -> Self {
        Self { config, resolver }
    }

    /// Resolve one turn. `now` is unix seconds, stamped onto combat logs.
    ///
    /// Identical `(state, actions, rng seed)` produce identical outcomes.
    #[instrument(skip_all, name = "resolve_turn", fields(turn = state.turn))]
    pub fn resolve_turn(
        &self,
        state: &GameSnapshot,
        actions: &[PlayerActions],
        data: &GameData,
        now: u64,
        rng: &mut dyn RngCore,
    ) -> Result<TurnOutcome, EngineError> {
        let mut turn = Resolution {
            state: state.clone(),
            data,
            config: &self.config,
            resolver: self.resolver.as_ref(),
            stamp: CombatStamp {
                turn: state.turn,
                timestamp: now,
            },
            combat_logs: Vec::new(),
            new_units: Vec::new(),
            messages: Vec::new(),
        };

        turn.movement_phase(actions);
        turn.combat_phase(rng)?;
        turn.orders_phase(actions)?;
        turn.construction_phase();
        turn.upgrade_phase();
        if self.config.is_month_tick(state.turn) {
            turn.economy_phase(rng)?;
        }
        turn.reset_phase();

        log::debug!(
            "Turn {} resolved: {} combats, {} new units, {} messages",
            state.turn,
            turn.combat_logs.len(),
            turn.new_units.len(),
            turn.messages.len()
        );

        Ok(TurnOutcome {
            snapshot: turn.state,
            combat_logs: turn.combat_logs,
            new_units: turn.new_units,
            messages: turn.messages,
        })
    }

    /// Banked turns after `now`: one per whole day since the last login,
    /// capped at `max_accumulated_turns`.
    pub fn calculate_accumulated_turns(&self, player: &Player, now: u64) -> u32 {
        let days = player
            .last_login
            .map_or(0, |login| now.saturating_sub(login) / SECONDS_PER_DAY);
        let total = u64::from(player.accumulated_turns).saturating_add(days);
        total.min(u64::from(self.config.max_accumulated_turns)) as u32
    }

    /// Spend one banked turn.
    pub fn consume_turn(&self, player: &mut Player) -> Result<(), RuleViolation> {
        if player.accumulated_turns == 0 {
            return Err(RuleViolation::NoTurnsLeft);
        }
        player.accumulated_turns -= 1;
        Ok(())
    }
}

/// Working state of one `resolve_turn` call.
struct Resolution<'a> {
    state: GameSnapshot,
    data: &'a GameData,
    config: &'a SimConfig,
    resolver: &'a dyn CombatResolver,
    stamp: CombatStamp,
    combat_logs: Vec<CombatLog>,
    new_units: Vec<UnitInstance>,
    messages: Vec<Message>,
}

impl Resolution<'_> {
    fn reject(&mut self, player: PlayerId, action: &TurnAction, violation: RuleViolation) {
        log::debug!(
            "Rejected {:?} from player {}: {}",
            action,
            player,
            violation
        );
        self.messages.push(Message::to(player, violation.to_string()));
    }

    fn check_in_bounds(&self, to: Coord) -> Result<(), RuleViolation> {
        if self.state.grid.at(to).is_some() {
            Ok(())
        } else {
            Err(RuleViolation::OutOfBounds(to))
        }
    }

    fn owned_living_unit(
        &self,
        player: PlayerId,
        unit_id: UnitId,
    ) -> Result<&UnitInstance, RuleViolation> {
        let unit = self
            .state
            .unit(unit_id)
            .ok_or(RuleViolation::UnitNotFound(unit_id))?;
        if unit.owner != player {
            return Err(RuleViolation::NotOwner { player });
        }
        if !unit.alive {
            return Err(RuleViolation::UnitNotAlive(unit_id));
        }
        Ok(unit)
    }

    #[instrument(skip_all, name = "phase_movement")]
    fn movement_phase(&mut self, actions: &[PlayerActions]) {
        // Army bookkeeping first so moves see the new groupings
        for submitted in actions {
            for action in &submitted.actions {
                let applied = match action {
                    TurnAction::CreateArmy { units } => {
                        UnitManager::create_army(&mut self.state, submitted.player, units)
                            .map(|_| ())
                    }
                    TurnAction::DisbandArmy { army } => {
                        self.disband_army(submitted.player, *army)
                    }
                    _ => continue,
                };
                if let Err(violation) = applied {
                    self.reject(submitted.player, action, violation);
                }
            }
        }

        for submitted in actions {
            for action in &submitted.actions {
                let applied = match action {
                    TurnAction::Move { unit, to } => {
                        self.move_unit(submitted.player, *unit, *to)
                    }
                    TurnAction::MoveArmy { army, to } => {
                        self.move_army(submitted.player, *army, *to)
                    }
                    _ => continue,
                };
                if let Err(violation) = applied {
                    self.reject(submitted.player, action, violation);
                }
            }
        }
    }

    fn move_unit(
        &mut self,
        player: PlayerId,
        unit_id: UnitId,
        to: Coord,
    ) -> Result<(), RuleViolation> {
        let unit = self.owned_living_unit(player, unit_id)?;
        if unit.army.is_some() {
            return Err(RuleViolation::AlreadyInArmy(unit_id));
        }
        self.check_in_bounds(to)?;
        UnitManager::move_unit(&mut self.state.units, unit_id, to)?;
        log::trace!("Unit {} moved to {}", unit_id, to);
        Ok(())
    }

    fn move_army(
        &mut self,
        player: PlayerId,
        army_id: ArmyId,
        to: Coord,
    ) -> Result<(), RuleViolation> {
        let army = self
            .state
            .army(army_id)
            .ok_or(RuleViolation::ArmyNotFound(army_id))?;
        if army.owner != player {
            return Err(RuleViolation::NotOwner { player });
        }
        self.check_in_bounds(to)?;
        UnitManager::move_army(&mut self.state, army_id, to)?;
        log::trace!("Army {} moved to {}", army_id, to);
        Ok(())
    }

    fn disband_army(&mut self, player: PlayerId, army_id: ArmyId) -> Result<(), RuleViolation> {
        let army = self
            .state
            .army(army_id)
            .ok_or(RuleViolation::ArmyNotFound(army_id))?;
        if army.owner != player {
            return Err(RuleViolation::NotOwner { player });
        }
        UnitManager::disband_army(&mut self.state, army_id).map(|_| ())
    }

    /// Every adjacent pair of living enemy units fights once. The unit that
    /// comes first in the collection attacks.
    #[instrument(skip_all, name = "phase_combat")]
    fn combat_phase(&mut self, rng: &mut dyn RngCore) -> Result<(), EngineError> {
        let mut fought: BTreeSet<(UnitId, UnitId)> = BTreeSet::new();
        let count = self.state.units.len();

        for i in 0..count {
            for j in (i + 1)..count {
                let (a, b) = (&self.state.units[i], &self.state.units[j]);
                if !a.alive || !b.alive || a.owner == b.owner {
                    continue;
                }
                if a.position().chebyshev(b.position()) > 1 {
                    continue;
                }
                if !self.state.diplomacy.are_enemies(a.owner, b.owner) {
                    continue;
                }
                let key = (a.id.min(b.id), a.id.max(b.id));
                if !fought.insert(key) {
                    continue;
                }

                let (attacker_id, defender_id) = (a.id, b.id);
                let (result, log) = resolve_encounter(
                    self.resolver,
                    &self.state.units,
                    &self.state.grid,
                    self.data,
                    attacker_id,
                    defender_id,
                    self.stamp,
                    rng,
                )?;
                apply_combat(&mut self.state.units, attacker_id, defender_id, &result);
                log::debug!(
                    "Combat at {}: unit {} dealt {}, unit {} dealt {}",
                    log.location,
                    attacker_id,
                    result.damage_to_defender,
                    defender_id,
                    result.damage_to_attacker
                );
                self.combat_logs.push(log);
            }
        }
        Ok(())
    }

    #[instrument(skip_all, name = "phase_orders")]
    fn orders_phase(&mut self, actions: &[PlayerActions]) -> Result<(), EngineError> {
        for submitted in actions {
            for action in &submitted.actions {
                let applied = match action {
                    TurnAction::Build {
                        building,
                        at,
                        sacrifice,
                    } => self.build(submitted.player, building, *at, *sacrifice)?,
                    TurnAction::Recruit { unit_type, at } => {
                        self.recruit(submitted.player, unit_type, *at)?
                    }
                    TurnAction::UpgradeSettlement { settlement } => {
                        self.start_upgrade(submitted.player, *settlement)
                    }
                    _ => continue,
                };
                if let Err(violation) = applied {
                    self.reject(submitted.player, action, violation);
                }
            }
        }
        Ok(())
    }

    fn check_build(
        &self,
        player: PlayerId,
        at: Coord,
        sacrifice: Option<UnitId>,
    ) -> Result<(), RuleViolation> {
        if self.state.player(player).is_none() {
            return Err(RuleViolation::NotOwner { player });
        }
        self.check_in_bounds(at)?;
        if let Some(unit_id) = sacrifice {
            self.owned_living_unit(player, unit_id)?;
        }
        Ok(())
    }

    /// Outer error aborts the turn, inner error rejects the action.
    fn build(
        &mut self,
        player: PlayerId,
        type_id: &str,
        at: Coord,
        sacrifice: Option<UnitId>,
    ) -> Result<Result<(), RuleViolation>, EngineError> {
        let data = self.data;
        let def = data
            .building_type(type_id)
            .ok_or_else(|| EngineError::UnknownBuildingType(type_id.to_string()))?;
        if let Err(violation) = self.check_build(player, at, sacrifice) {
            return Ok(Err(violation));
        }

        if let Some(unit) = sacrifice.and_then(|id| self.state.unit_mut(id)) {
            unit.alive = false;
            unit.hp = 0;
        }
        let id = self.state.allocate_building_id();
        self.state.buildings.push(BuildingInstance {
            id,
            type_id: def.id.clone(),
            owner: player,
            x: at.x,
            y: at.y,
            constructed: false,
            turns_remaining: self.config.building_construction_turns,
        });
        log::debug!("Player {} started a {} at {}", player, def.id, at);
        Ok(Ok(()))
    }

    fn recruit(
        &mut self,
        player: PlayerId,
        type_id: &str,
        at: Coord,
    ) -> Result<Result<(), RuleViolation>, EngineError> {
        let Some(index) = self.state.players.iter().position(|p| p.id == player) else {
            return Ok(Err(RuleViolation::NotOwner { player }));
        };
        if let Err(violation) = self.check_in_bounds(at) {
            return Ok(Err(violation));
        }
        let data = self.data;
        let check = UnitManager::can_recruit(
            data,
            &self.state.buildings,
            &self.state.players[index],
            type_id,
            at,
        )?;
        if let Err(violation) = check.into_result() {
            return Ok(Err(violation));
        }

        let id = self.state.allocate_unit_id();
        let mut unit = UnitManager::create_unit(data, id, type_id, player, at, self.state.turn)?;
        unit.has_moved = true;
        unit.has_acted = true;

        // can_recruit resolved the type above
        if let Some(def) = data.unit_type(type_id) {
            self.state.players[index].resources.subtract_all(&def.cost);
        }
        log::debug!("Player {} recruited a {} at {}", player, type_id, at);
        self.state.units.push(unit.clone());
        self.new_units.push(unit);
        Ok(Ok(()))
    }

    fn start_upgrade(
        &mut self,
        player: PlayerId,
        settlement_id: SettlementId,
    ) -> Result<(), RuleViolation> {
        let turns = self.config.settlement_upgrade_turns;
        let settlement = self
            .state
            .settlements
            .iter_mut()
            .find(|s| s.id == settlement_id)
            .ok_or(RuleViolation::SettlementNotFound(settlement_id))?;
        if settlement.owner != player {
            return Err(RuleViolation::NotOwner { player });
        }
        if settlement.upgrading {
            return Err(RuleViolation::AlreadyUpgrading);
        }
        if settlement.tier.next().is_none() {
            return Err(RuleViolation::MaxTier);
        }
        settlement.upgrading = true;
        settlement.upgrade_turns_remaining = turns;
        Ok(())
    }

    #[instrument(skip_all, name = "phase_construction")]
    fn construction_phase(&mut self) {
        for building in self.state.buildings.iter_mut().filter(|b| !b.constructed) {
            building.turns_remaining = building.turns_remaining.saturating_sub(1);
            if building.turns_remaining == 0 {
                building.constructed = true;
                self.messages.push(Message::to(
                    building.owner,
                    format!("{} at {} is complete", building.type_id, building.position()),
                ));
            }
        }
    }

    #[instrument(skip_all, name = "phase_upgrades")]
    fn upgrade_phase(&mut self) {
        for settlement in self.state.settlements.iter_mut().filter(|s| s.upgrading) {
            settlement.upgrade_turns_remaining =
                settlement.upgrade_turns_remaining.saturating_sub(1);
            if settlement.upgrade_turns_remaining > 0 {
                continue;
            }
            settlement.upgrading = false;
            if let Some(next) = settlement.tier.next() {
                settlement.tier = next;
            }
            self.messages.push(Message::to(
                settlement.owner,
                format!("{} has grown into a {:?}", settlement.name, settlement.tier),
            ));
        }
    }

    #[instrument(skip_all, name = "phase_economy")]
    fn economy_phase(&mut self, rng: &mut dyn RngCore) -> Result<(), EngineError> {
        for index in 0..self.state.players.len() {
            let report =
                EconomyEngine::simulate(&self.state, self.data, &self.state.players[index])?;
            let outcome = EconomyEngine::execute_production(&self.state.players[index], &report);
            let player = &mut self.state.players[index];
            player.resources = outcome.resources;
            let player_id = player.id;

            for warning in report.warnings {
                self.messages.push(Message::to(player_id, warning));
            }

            let born =
                EconomyEngine::process_reproduction(&mut self.state, self.data, player_id, rng)?;
            self.state.units.extend(born.iter().cloned());
            self.new_units.extend(born);
        }
        Ok(())
    }

    #[instrument(skip_all, name = "phase_reset")]
    fn reset_phase(&mut self) {
        UnitManager::reset_units_for_turn(&mut self.state.units);
        UnitManager::prune_dead_armies(&mut self.state);
        for player in &mut self.state.players {
            player.turn_played = false;
        }
    }
}

#[cfg(test)]
#[path = "turn_tests.rs"]
mod tests;
