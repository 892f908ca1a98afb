//! Unit and army lifecycle.
//!
//! Recruitment checks, creation, legal-move derivation, army grouping and the
//! per-turn flag reset. Unit to army membership is two id indices kept in step
//! here: [`Army::members`] and [`UnitInstance::army`].

use crate::config::SimConfig;
use crate::error::{EngineError, RuleViolation};
use crate::grid::Coord;
use crate::pathing::Pathfinder;
use crate::state::{
    Army, ArmyId, BuildingInstance, GameSnapshot, Player, PlayerId, Turn, UnitId, UnitInstance,
};
use tracing::instrument;
use turnsim_data::{GameData, UnitType};

/// Outcome of a recruitment check. Rejections carry the reason shown to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecruitCheck {
    pub can_recruit: bool,
    pub violation: Option<RuleViolation>,
}

impl RecruitCheck {
    fn allowed() -> Self {
        Self {
            can_recruit: true,
            violation: None,
        }
    }

    fn rejected(violation: RuleViolation) -> Self {
        Self {
            can_recruit: false,
            violation: Some(violation),
        }
    }

    pub fn reason(&self) -> Option<String> {
        self.violation.as_ref().map(|v| v.to_string())
    }

    pub fn into_result(self) -> Result<(), RuleViolation> {
        match self.violation {
            Some(v) => Err(v),
            None => Ok(()),
        }
    }
}

fn unit_type<'d>(data: &'d GameData, type_id: &str) -> Result<&'d UnitType, EngineError> {
    data.unit_type(type_id)
        .ok_or_else(|| EngineError::UnknownUnitType(type_id.to_string()))
}

pub struct UnitManager;

impl UnitManager {
    /// Whether `player` may recruit `type_id` at `at`.
    ///
    /// A required building counts when it is constructed, owned by the player
    /// and stands on `at` or an adjacent tile.
    pub fn can_recruit(
        data: &GameData,
        buildings: &[BuildingInstance],
        player: &Player,
        type_id: &str,
        at: Coord,
    ) -> Result<RecruitCheck, EngineError> {
        let def = unit_type(data, type_id)?;

        if !player.resources.can_afford(&def.cost) {
            return Ok(RecruitCheck::rejected(RuleViolation::InsufficientResources));
        }

        if let Some(required) = &def.required_building {
            let present = buildings.iter().any(|b| {
                b.type_id == *required
                    && b.constructed
                    && b.owner == player.id
                    && b.position().chebyshev(at) <= 1
            });
            if !present {
                return Ok(RecruitCheck::rejected(RuleViolation::MissingBuilding {
                    building: required.clone(),
                }));
            }
        }

        Ok(RecruitCheck::allowed())
    }

    /// A fresh unit at full health with its turn flags cleared.
    pub fn create_unit(
        data: &GameData,
        id: UnitId,
        type_id: &str,
        owner: PlayerId,
        at: Coord,
        turn: Turn,
    ) -> Result<UnitInstance, EngineError> {
        let def = unit_type(data, type_id)?;
        Ok(UnitInstance {
            id,
            type_id: def.id.clone(),
            owner,
            x: at.x,
            y: at.y,
            hp: def.stats.hp,
            alive: true,
            has_moved: false,
            has_acted: false,
            army: None,
            created_turn: turn,
        })
    }

    /// Tiles the unit may end its move on this turn, in coordinate order.
    ///
    /// Occupied tiles are only allowed when every occupant is friendly and
    /// the stack is not yet full.
    #[instrument(skip_all, name = "valid_moves")]
    pub fn valid_moves(
        state: &GameSnapshot,
        data: &GameData,
        config: &SimConfig,
        unit_id: UnitId,
    ) -> Result<Vec<Coord>, EngineError> {
        let unit = state
            .unit(unit_id)
            .ok_or(EngineError::UnknownUnit(unit_id))?;
        let def = unit_type(data, &unit.type_id)?;
        if !unit.alive || unit.has_moved {
            return Ok(Vec::new());
        }

        let origin = unit.position();
        let reachable = Pathfinder::reachable_tiles(
            &state.grid,
            &data.terrain,
            origin,
            def.stats.movement,
            def.domain,
        );

        let moves = reachable
            .into_keys()
            .filter(|&coord| coord != origin)
            .filter(|&coord| {
                let mut occupants = state
                    .units
                    .iter()
                    .filter(|u| u.alive && u.id != unit_id && u.position() == coord)
                    .peekable();
                if occupants.peek().is_none() {
                    return true;
                }
                let mut count = 0usize;
                for occupant in occupants {
                    if !state.diplomacy.are_allied(unit.owner, occupant.owner) {
                        return false;
                    }
                    count += 1;
                }
                count < config.max_allied_stack
            })
            .collect();
        Ok(moves)
    }

    /// `None` when `to` is among [`UnitManager::valid_moves`], otherwise the
    /// rejection to show the player.
    pub fn check_move(
        state: &GameSnapshot,
        data: &GameData,
        config: &SimConfig,
        unit_id: UnitId,
        to: Coord,
    ) -> Result<Option<RuleViolation>, EngineError> {
        let moves = Self::valid_moves(state, data, config, unit_id)?;
        if moves.binary_search(&to).is_ok() {
            Ok(None)
        } else {
            Ok(Some(RuleViolation::IllegalMove { unit: unit_id, to }))
        }
    }

    /// Relocate a unit and mark it moved. Legality is the caller's concern.
    pub fn move_unit(
        units: &mut [UnitInstance],
        unit_id: UnitId,
        to: Coord,
    ) -> Result<(), RuleViolation> {
        let unit = units
            .iter_mut()
            .find(|u| u.id == unit_id)
            .ok_or(RuleViolation::UnitNotFound(unit_id))?;
        unit.x = to.x;
        unit.y = to.y;
        unit.has_moved = true;
        Ok(())
    }

    pub fn reset_units_for_turn(units: &mut [UnitInstance]) {
        for unit in units.iter_mut().filter(|u| u.alive) {
            unit.has_moved = false;
            unit.has_acted = false;
        }
    }

    /// Group co-located living units of `owner` into a new army.
    pub fn create_army(
        state: &mut GameSnapshot,
        owner: PlayerId,
        members: &[UnitId],
    ) -> Result<ArmyId, RuleViolation> {
        let Some(&first) = members.first() else {
            return Err(RuleViolation::EmptyArmy);
        };
        let position = state
            .unit(first)
            .ok_or(RuleViolation::UnitNotFound(first))?
            .position();

        for &id in members {
            let unit = state.unit(id).ok_or(RuleViolation::UnitNotFound(id))?;
            if !unit.alive {
                return Err(RuleViolation::UnitNotAlive(id));
            }
            if unit.owner != owner {
                return Err(RuleViolation::NotOwner { player: owner });
            }
            if unit.position() != position {
                return Err(RuleViolation::NotCoLocated);
            }
            if unit.army.is_some() {
                return Err(RuleViolation::AlreadyInArmy(id));
            }
        }

        let army_id = state.allocate_army_id();
        let mut member_ids = Vec::with_capacity(members.len());
        for &id in members {
            if member_ids.contains(&id) {
                continue;
            }
            member_ids.push(id);
        }
        for unit in state.units.iter_mut().filter(|u| member_ids.contains(&u.id)) {
            unit.army = Some(army_id);
        }
        state.armies.push(Army {
            id: army_id,
            owner,
            members: member_ids,
            x: position.x,
            y: position.y,
        });

        log::debug!(
            "Player {} formed army {} at {} ({} units)",
            owner,
            army_id,
            position,
            members.len()
        );
        Ok(army_id)
    }

    /// Speed of the slowest living member; 0 if none survive.
    pub fn army_movement(
        army: &Army,
        units: &[UnitInstance],
        data: &GameData,
    ) -> Result<u32, EngineError> {
        let mut slowest: Option<u32> = None;
        for unit in units
            .iter()
            .filter(|u| u.alive && army.members.contains(&u.id))
        {
            let movement = unit_type(data, &unit.type_id)?.stats.movement;
            slowest = Some(slowest.map_or(movement, |s| s.min(movement)));
        }
        Ok(slowest.unwrap_or(0))
    }

    /// Relocate the army and all of its living members together.
    pub fn move_army(
        state: &mut GameSnapshot,
        army_id: ArmyId,
        to: Coord,
    ) -> Result<(), RuleViolation> {
        let army = state
            .armies
            .iter_mut()
            .find(|a| a.id == army_id)
            .ok_or(RuleViolation::ArmyNotFound(army_id))?;
        army.x = to.x;
        army.y = to.y;
        let members = army.members.clone();

        for unit in state
            .units
            .iter_mut()
            .filter(|u| u.alive && members.contains(&u.id))
        {
            unit.x = to.x;
            unit.y = to.y;
            unit.has_moved = true;
        }
        Ok(())
    }

    /// Dissolve an army. Members keep their positions.
    pub fn disband_army(
        state: &mut GameSnapshot,
        army_id: ArmyId,
    ) -> Result<Vec<UnitId>, RuleViolation> {
        let index = state
            .armies
            .iter()
            .position(|a| a.id == army_id)
            .ok_or(RuleViolation::ArmyNotFound(army_id))?;
        let army = state.armies.remove(index);

        let mut released = Vec::new();
        for unit in state
            .units
            .iter_mut()
            .filter(|u| u.alive && u.army == Some(army_id))
        {
            unit.army = None;
            released.push(unit.id);
        }
        log::debug!("Army {} of player {} disbanded", army.id, army.owner);
        Ok(released)
    }

    /// Drop every army with no living member and return their ids.
    pub fn prune_dead_armies(state: &mut GameSnapshot) -> Vec<ArmyId> {
        let units = &state.units;
        let mut pruned = Vec::new();
        state.armies.retain(|army| {
            let alive = units
                .iter()
                .any(|u| u.alive && u.army == Some(army.id));
            if !alive {
                pruned.push(army.id);
            }
            alive
        });
        if !pruned.is_empty() {
            log::debug!("Pruned {} empty armies", pruned.len());
        }
        pruned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Tile;
    use crate::state::DiplomacyStatus;
    use crate::testing::{sample_data, unit_at, SnapshotBuilder};
    use proptest::prelude::*;
    use turnsim_data::{Resource, TerrainKind};

    fn config() -> SimConfig {
        SimConfig::default()
    }

    #[test]
    fn test_recruit_requires_nearby_barracks() {
        let data = sample_data();
        let state = SnapshotBuilder::new(6, 6).with_player(1).build();
        let player = state.player(1).unwrap();

        let check =
            UnitManager::can_recruit(&data, &state.buildings, player, "archer", Coord::new(3, 3))
                .unwrap();
        assert!(!check.can_recruit);
        assert!(check.reason().unwrap().contains("barracks"));
    }

    #[test]
    fn test_recruit_barracks_rules() {
        let data = sample_data();
        let state = SnapshotBuilder::new(6, 6)
            .with_player(1)
            .with_building(1, "barracks", 2, 2, true)
            .with_building(1, "barracks", 5, 5, false)
            .with_building(2, "barracks", 0, 5, true)
            .build();
        let player = state.player(1).unwrap();
        let check = |x, y| {
            UnitManager::can_recruit(&data, &state.buildings, player, "archer", Coord::new(x, y))
                .unwrap()
                .can_recruit
        };

        assert!(check(2, 2), "on the barracks tile");
        assert!(check(3, 3), "diagonally adjacent");
        assert!(!check(4, 2), "two tiles away");
        assert!(!check(5, 4), "still under construction");
        assert!(!check(0, 4), "someone else's barracks");
    }

    #[test]
    fn test_recruit_checks_cost_first() {
        let data = sample_data();
        let mut state = SnapshotBuilder::new(3, 3).with_player(1).build();
        state.players[0].resources.set(Resource::Gold, 9);

        let check = UnitManager::can_recruit(
            &data,
            &state.buildings,
            &state.players[0],
            "spearman",
            Coord::new(0, 0),
        )
        .unwrap();
        assert_eq!(check.violation, Some(RuleViolation::InsufficientResources));
        assert_eq!(check.reason().as_deref(), Some("Insufficient resources"));
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let data = sample_data();
        let state = SnapshotBuilder::new(3, 3).with_player(1).build();
        let err = UnitManager::can_recruit(
            &data,
            &state.buildings,
            &state.players[0],
            "dragon",
            Coord::new(0, 0),
        )
        .unwrap_err();
        assert_eq!(err, EngineError::UnknownUnitType("dragon".to_string()));
    }

    #[test]
    fn test_create_unit_uses_base_hp() {
        let data = sample_data();
        let unit = UnitManager::create_unit(&data, 7, "archer", 2, Coord::new(1, 4), 3).unwrap();
        assert_eq!(unit.hp, 15);
        assert!(unit.alive);
        assert!(!unit.has_moved && !unit.has_acted);
        assert_eq!(unit.position(), Coord::new(1, 4));
        assert_eq!(unit.created_turn, 3);
    }

    #[test]
    fn test_moved_unit_has_no_moves() {
        let data = sample_data();
        let mut state = SnapshotBuilder::new(5, 5)
            .with_player(1)
            .with_unit(1, "spearman", 2, 2)
            .build();
        assert!(!UnitManager::valid_moves(&state, &data, &config(), 1)
            .unwrap()
            .is_empty());

        state.units[0].has_moved = true;
        assert!(UnitManager::valid_moves(&state, &data, &config(), 1)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_valid_moves_exclude_own_tile() {
        let data = sample_data();
        let state = SnapshotBuilder::new(3, 3)
            .with_player(1)
            .with_unit(1, "sheep", 1, 1)
            .build();
        let moves = UnitManager::valid_moves(&state, &data, &config(), 1).unwrap();
        assert_eq!(moves.len(), 8);
        assert!(!moves.contains(&Coord::new(1, 1)));
    }

    #[test]
    fn test_stacking_rules() {
        let data = sample_data();
        let state = SnapshotBuilder::new(5, 1)
            .with_player(1)
            .with_player(2)
            .with_player(3)
            .with_relation(1, 3, DiplomacyStatus::Allied)
            .with_unit(1, "spearman", 0, 0)
            .with_unit(1, "spearman", 1, 0) // one friend: joinable
            .with_unit(1, "spearman", 2, 0)
            .with_unit(1, "spearman", 2, 0) // full stack
            .with_unit(2, "spearman", 3, 0) // neutral stranger
            .build();
        let moves = UnitManager::valid_moves(&state, &data, &config(), 1).unwrap();
        assert_eq!(moves, vec![Coord::new(1, 0)]);

        let with_ally = SnapshotBuilder::new(3, 1)
            .with_player(1)
            .with_player(3)
            .with_relation(1, 3, DiplomacyStatus::Allied)
            .with_unit(1, "spearman", 0, 0)
            .with_unit(3, "spearman", 1, 0)
            .build();
        let moves = UnitManager::valid_moves(&with_ally, &data, &config(), 1).unwrap();
        assert_eq!(moves, vec![Coord::new(1, 0), Coord::new(2, 0)]);
    }

    #[test]
    fn test_check_move_rejects_targets_outside_valid_moves() {
        let data = sample_data();
        let state = SnapshotBuilder::new(4, 1)
            .with_player(1)
            .with_player(2)
            .with_unit(1, "spearman", 0, 0)
            .with_unit(2, "spearman", 2, 0)
            .build();
        let check = |to| UnitManager::check_move(&state, &data, &config(), 1, to).unwrap();

        assert_eq!(check(Coord::new(1, 0)), None);
        assert_eq!(
            check(Coord::new(2, 0)),
            Some(RuleViolation::IllegalMove {
                unit: 1,
                to: Coord::new(2, 0)
            })
        );
        assert!(check(Coord::new(0, 0)).is_some());
        assert!(check(Coord::new(9, 0)).is_some());
        assert_eq!(
            UnitManager::check_move(&state, &data, &config(), 7, Coord::new(1, 0)),
            Err(EngineError::UnknownUnit(7))
        );
    }

    #[test]
    fn test_dead_occupants_do_not_block() {
        let data = sample_data();
        let mut corpse = unit_at(9, 2, "spearman", 1, 0);
        corpse.alive = false;
        corpse.hp = 0;
        let state = SnapshotBuilder::new(2, 1)
            .with_player(1)
            .with_unit(1, "spearman", 0, 0)
            .with_unit_state(corpse)
            .build();
        let moves = UnitManager::valid_moves(&state, &data, &config(), 1).unwrap();
        assert_eq!(moves, vec![Coord::new(1, 0)]);
    }

    #[test]
    fn test_naval_moves_stay_on_water() {
        let data = sample_data();
        let state = SnapshotBuilder::new(3, 1)
            .with_tile(Tile::new(0, 0, TerrainKind::Sea))
            .with_tile(Tile::new(1, 0, TerrainKind::Sea))
            .with_player(1)
            .with_unit(1, "galley", 0, 0)
            .build();
        let moves = UnitManager::valid_moves(&state, &data, &config(), 1).unwrap();
        assert_eq!(moves, vec![Coord::new(1, 0)]);
    }

    #[test]
    fn test_move_unit_sets_flag() {
        let mut units = vec![unit_at(1, 1, "spearman", 0, 0)];
        UnitManager::move_unit(&mut units, 1, Coord::new(4, 4)).unwrap();
        assert_eq!(units[0].position(), Coord::new(4, 4));
        assert!(units[0].has_moved);
        assert_eq!(
            UnitManager::move_unit(&mut units, 2, Coord::new(0, 0)),
            Err(RuleViolation::UnitNotFound(2))
        );
    }

    #[test]
    fn test_reset_skips_dead_units() {
        let mut units = vec![unit_at(1, 1, "spearman", 0, 0), unit_at(2, 1, "spearman", 0, 0)];
        for u in &mut units {
            u.has_moved = true;
            u.has_acted = true;
        }
        units[1].alive = false;

        UnitManager::reset_units_for_turn(&mut units);
        assert!(!units[0].has_moved && !units[0].has_acted);
        assert!(units[1].has_moved && units[1].has_acted);
    }

    #[test]
    fn test_army_lifecycle() {
        let data = sample_data();
        let mut state = SnapshotBuilder::new(6, 6)
            .with_player(1)
            .with_unit(1, "spearman", 1, 1)
            .with_unit(1, "archer", 1, 1)
            .build();

        let army = UnitManager::create_army(&mut state, 1, &[1, 2]).unwrap();
        assert!(state.units.iter().all(|u| u.army == Some(army)));
        assert_eq!(
            UnitManager::army_movement(state.army(army).unwrap(), &state.units, &data).unwrap(),
            2
        );

        UnitManager::move_army(&mut state, army, Coord::new(3, 2)).unwrap();
        assert_eq!(state.army(army).unwrap().position(), Coord::new(3, 2));
        assert!(state
            .units
            .iter()
            .all(|u| u.position() == Coord::new(3, 2) && u.has_moved));

        let released = UnitManager::disband_army(&mut state, army).unwrap();
        assert_eq!(released, vec![1, 2]);
        assert!(state.armies.is_empty());
        assert!(state.units.iter().all(|u| u.army.is_none()));
        assert_eq!(state.units[0].position(), Coord::new(3, 2));
    }

    #[test]
    fn test_create_army_rejections() {
        let mut state = SnapshotBuilder::new(6, 6)
            .with_player(1)
            .with_player(2)
            .with_unit(1, "spearman", 1, 1)
            .with_unit(1, "spearman", 2, 1)
            .with_unit(2, "spearman", 1, 1)
            .build();

        assert_eq!(
            UnitManager::create_army(&mut state, 1, &[]),
            Err(RuleViolation::EmptyArmy)
        );
        assert_eq!(
            UnitManager::create_army(&mut state, 1, &[1, 2]),
            Err(RuleViolation::NotCoLocated)
        );
        assert_eq!(
            UnitManager::create_army(&mut state, 1, &[1, 3]),
            Err(RuleViolation::NotOwner { player: 1 })
        );
        state.units[0].alive = false;
        assert_eq!(
            UnitManager::create_army(&mut state, 1, &[1]),
            Err(RuleViolation::UnitNotAlive(1))
        );
        assert!(state.armies.is_empty());
        assert!(state.units.iter().all(|u| u.army.is_none()));
    }

    #[test]
    fn test_prune_dead_armies() {
        let mut state = SnapshotBuilder::new(3, 3)
            .with_player(1)
            .with_unit(1, "spearman", 0, 0)
            .with_unit(1, "spearman", 2, 2)
            .with_unit(1, "spearman", 2, 2)
            .build();
        let lonely = UnitManager::create_army(&mut state, 1, &[1]).unwrap();
        let pair = UnitManager::create_army(&mut state, 1, &[2, 3]).unwrap();

        state.units[0].alive = false;
        state.units[1].alive = false;
        assert_eq!(UnitManager::prune_dead_armies(&mut state), vec![lonely]);
        assert_eq!(state.armies.len(), 1);
        assert!(state.army(pair).is_some());

        assert!(UnitManager::prune_dead_armies(&mut state).is_empty());
    }

    #[test]
    fn test_army_movement_ignores_dead() {
        let data = sample_data();
        let mut state = SnapshotBuilder::new(3, 3)
            .with_player(1)
            .with_unit(1, "scout", 0, 0)
            .with_unit(1, "sheep", 0, 0)
            .build();
        let army = UnitManager::create_army(&mut state, 1, &[1, 2]).unwrap();
        state.units[1].alive = false;
        assert_eq!(
            UnitManager::army_movement(state.army(army).unwrap(), &state.units, &data).unwrap(),
            5
        );
    }

    proptest! {
        #[test]
        fn prop_reset_is_idempotent(
            flags in proptest::collection::vec(any::<(bool, bool, bool)>(), 0..20),
        ) {
            let mut units: Vec<UnitInstance> = flags
                .iter()
                .enumerate()
                .map(|(i, &(alive, moved, acted))| {
                    let mut u = unit_at(i as u32 + 1, 1, "spearman", 0, 0);
                    u.alive = alive;
                    u.has_moved = moved;
                    u.has_acted = acted;
                    u
                })
                .collect();

            UnitManager::reset_units_for_turn(&mut units);
            let once = units.clone();
            UnitManager::reset_units_for_turn(&mut units);
            prop_assert_eq!(once, units);
        }
    }
}
