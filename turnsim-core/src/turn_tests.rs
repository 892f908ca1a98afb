//! Pipeline tests for turn.rs.
use super::*;
use crate::combat::{CombatResult, Combatant};
use crate::rng::sim_rng;
use crate::state::{DiplomacyStatus, SettlementTier};
use crate::testing::{sample_data, SnapshotBuilder};
use turnsim_data::Resource;

const NOW: u64 = 1_700_000_000;

fn resolve(state: &GameSnapshot, actions: &[PlayerActions]) -> TurnOutcome {
    TurnEngine::default()
        .resolve_turn(state, actions, &sample_data(), NOW, &mut sim_rng(7))
        .unwrap()
}

fn texts_for(outcome: &TurnOutcome, player: PlayerId) -> Vec<&str> {
    outcome
        .messages
        .iter()
        .filter(|m| m.player == Some(player))
        .map(|m| m.text.as_str())
        .collect()
}

/// Deals a fixed amount both ways, no dice.
struct FixedDamage(i32);

impl CombatResolver for FixedDamage {
    fn resolve(
        &self,
        attacker: &Combatant<'_>,
        defender: &Combatant<'_>,
        _rng: &mut dyn RngCore,
    ) -> CombatResult {
        CombatResult {
            damage_to_defender: self.0,
            damage_to_attacker: self.0,
            attacker_survives: attacker.unit.hp > self.0,
            defender_survives: defender.unit.hp > self.0,
            counter_attack: true,
            terrain_bonus: defender.terrain_bonus,
        }
    }
}

fn farm_state(turn: u32) -> GameSnapshot {
    SnapshotBuilder::new(3, 3)
        .turn(turn)
        .with_player(1)
        .with_building(1, "farm", 0, 0, true)
        .build()
}

#[test]
fn test_economy_runs_on_month_ticks_only() {
    let engine = TurnEngine::new(SimConfig {
        turns_per_month: 10,
        ..Default::default()
    });
    let data = sample_data();

    let tick = engine
        .resolve_turn(&farm_state(10), &[], &data, NOW, &mut sim_rng(1))
        .unwrap();
    assert_eq!(tick.snapshot.players[0].resources.get(Resource::Grain), 55);

    let quiet = engine
        .resolve_turn(&farm_state(9), &[], &data, NOW, &mut sim_rng(1))
        .unwrap();
    assert_eq!(quiet.snapshot.players[0].resources.get(Resource::Grain), 50);

    let first = engine
        .resolve_turn(&farm_state(0), &[], &data, NOW, &mut sim_rng(1))
        .unwrap();
    assert_eq!(first.snapshot.players[0].resources.get(Resource::Grain), 50);
}

#[test]
fn test_same_seed_same_outcome() {
    let state = SnapshotBuilder::new(4, 4)
        .turn(10)
        .with_player(1)
        .with_player(2)
        .with_relation(1, 2, DiplomacyStatus::Enemy)
        .with_unit(1, "spearman", 1, 1)
        .with_unit(2, "spearman", 2, 1)
        .with_unit(1, "sheep", 0, 0)
        .with_unit(1, "sheep", 0, 3)
        .build();
    let engine = TurnEngine::default();
    let data = sample_data();

    let a = engine
        .resolve_turn(&state, &[], &data, NOW, &mut sim_rng(99))
        .unwrap();
    let b = engine
        .resolve_turn(&state, &[], &data, NOW, &mut sim_rng(99))
        .unwrap();
    assert_eq!(a.snapshot.checksum(), b.snapshot.checksum());
    assert_eq!(a.combat_logs, b.combat_logs);
    assert_eq!(a.new_units, b.new_units);
    assert_eq!(a.messages, b.messages);
}

#[test]
fn test_each_enemy_pair_fights_once() {
    let state = SnapshotBuilder::new(4, 4)
        .with_player(1)
        .with_player(2)
        .with_player(3)
        .with_relation(1, 2, DiplomacyStatus::Enemy)
        .with_unit(1, "spearman", 1, 1)
        .with_unit(2, "spearman", 2, 1)
        .with_unit(2, "spearman", 1, 2)
        .with_unit(3, "spearman", 0, 1) // neutral neighbour
        .with_unit(2, "spearman", 3, 3) // out of reach
        .build();
    let engine = TurnEngine::with_resolver(SimConfig::default(), Box::new(FixedDamage(4)));
    let outcome = engine
        .resolve_turn(&state, &[], &sample_data(), NOW, &mut sim_rng(0))
        .unwrap();

    let pairs: Vec<(UnitId, UnitId)> = outcome
        .combat_logs
        .iter()
        .map(|l| (l.attacker_id, l.defender_id))
        .collect();
    assert_eq!(pairs, vec![(1, 2), (1, 3)]);
    assert!(outcome.combat_logs.iter().all(|l| l.timestamp == NOW));

    let hp: Vec<i32> = outcome.snapshot.units.iter().map(|u| u.hp).collect();
    assert_eq!(hp, vec![12, 16, 16, 20, 20]);
}

#[test]
fn test_combat_kills_are_applied() {
    let state = SnapshotBuilder::new(3, 1)
        .with_player(1)
        .with_player(2)
        .with_relation(1, 2, DiplomacyStatus::Enemy)
        .with_unit(1, "spearman", 0, 0)
        .with_unit(2, "spearman", 1, 0)
        .build();
    let engine = TurnEngine::with_resolver(SimConfig::default(), Box::new(FixedDamage(50)));
    let outcome = engine
        .resolve_turn(&state, &[], &sample_data(), NOW, &mut sim_rng(0))
        .unwrap();

    assert_eq!(outcome.combat_logs.len(), 1);
    for unit in &outcome.snapshot.units {
        assert!(!unit.alive);
        assert_eq!(unit.hp, 0);
    }
}

#[test]
fn test_wiped_out_army_is_removed() {
    let state = SnapshotBuilder::new(3, 1)
        .with_player(1)
        .with_player(2)
        .with_relation(1, 2, DiplomacyStatus::Enemy)
        .with_unit(1, "spearman", 0, 0)
        .with_unit(2, "spearman", 1, 0)
        .build();
    let actions = [PlayerActions::new(
        1,
        vec![TurnAction::CreateArmy { units: vec![1] }],
    )];
    let engine = TurnEngine::with_resolver(SimConfig::default(), Box::new(FixedDamage(50)));
    let outcome = engine
        .resolve_turn(&state, &actions, &sample_data(), NOW, &mut sim_rng(0))
        .unwrap();

    assert_eq!(outcome.combat_logs.len(), 1);
    assert!(outcome.snapshot.armies.is_empty());
}

#[test]
fn test_moves_apply_before_combat() {
    let state = SnapshotBuilder::new(5, 1)
        .with_player(1)
        .with_player(2)
        .with_relation(1, 2, DiplomacyStatus::Enemy)
        .with_unit(1, "spearman", 0, 0)
        .with_unit(2, "spearman", 4, 0)
        .build();
    let actions = [PlayerActions::new(
        1,
        vec![TurnAction::Move {
            unit: 1,
            to: Coord::new(3, 0),
        }],
    )];
    let outcome = resolve(&state, &actions);

    assert_eq!(outcome.snapshot.units[0].position(), Coord::new(3, 0));
    assert_eq!(outcome.combat_logs.len(), 1);
    assert!(!outcome.snapshot.units[0].has_moved, "flags reset at end of turn");
}

#[test]
fn test_invalid_action_does_not_block_others() {
    let state = SnapshotBuilder::new(4, 4)
        .with_player(1)
        .with_player(2)
        .with_unit(1, "spearman", 0, 0)
        .with_unit(2, "spearman", 3, 3)
        .build();
    let actions = [PlayerActions::new(
        1,
        vec![
            TurnAction::Move {
                unit: 2,
                to: Coord::new(0, 3),
            },
            TurnAction::Move {
                unit: 1,
                to: Coord::new(9, 9),
            },
            TurnAction::Move {
                unit: 1,
                to: Coord::new(1, 1),
            },
        ],
    )];
    let outcome = resolve(&state, &actions);

    assert_eq!(outcome.snapshot.units[0].position(), Coord::new(1, 1));
    assert_eq!(outcome.snapshot.units[1].position(), Coord::new(3, 3));
    assert_eq!(
        texts_for(&outcome, 1),
        vec!["Player 1 does not own this", "(9, 9) is outside the map"]
    );
    assert!(texts_for(&outcome, 2).is_empty());
}

#[test]
fn test_unknown_building_aborts_turn() {
    let state = SnapshotBuilder::new(3, 3).with_player(1).build();
    let before = state.clone();
    let actions = [PlayerActions::new(
        1,
        vec![TurnAction::Build {
            building: "wonder".to_string(),
            at: Coord::new(1, 1),
            sacrifice: None,
        }],
    )];

    let err = TurnEngine::default()
        .resolve_turn(&state, &actions, &sample_data(), NOW, &mut sim_rng(0))
        .unwrap_err();
    assert_eq!(err, EngineError::UnknownBuildingType("wonder".to_string()));
    assert_eq!(state, before);
}

#[test]
fn test_building_countdown() {
    let state = SnapshotBuilder::new(3, 3)
        .turn(1)
        .with_player(1)
        .with_unit(1, "sheep", 1, 1)
        .build();
    let actions = [PlayerActions::new(
        1,
        vec![TurnAction::Build {
            building: "farm".to_string(),
            at: Coord::new(1, 1),
            sacrifice: Some(1),
        }],
    )];

    let mut outcome = resolve(&state, &actions);
    let building = &outcome.snapshot.buildings[0];
    assert!(!building.constructed);
    assert_eq!(building.turns_remaining, 2);
    assert!(!outcome.snapshot.units[0].alive, "sacrificed");

    for _ in 0..2 {
        let mut next = outcome.snapshot.clone();
        next.turn += 1;
        outcome = resolve(&next, &[]);
    }
    let building = &outcome.snapshot.buildings[0];
    assert!(building.constructed);
    assert_eq!(building.turns_remaining, 0);
    assert_eq!(texts_for(&outcome, 1), vec!["farm at (1, 1) is complete"]);
}

#[test]
fn test_recruit() {
    let mut state = SnapshotBuilder::new(4, 4)
        .with_player(1)
        .with_building(1, "barracks", 2, 2, true)
        .build();
    state.players[0].resources.set(Resource::Wood, 5);
    let actions = [PlayerActions::new(
        1,
        vec![
            TurnAction::Recruit {
                unit_type: "archer".to_string(),
                at: Coord::new(0, 0),
            },
            TurnAction::Recruit {
                unit_type: "spearman".to_string(),
                at: Coord::new(3, 3),
            },
        ],
    )];

    let outcome = resolve(&state, &actions);
    assert_eq!(outcome.new_units.len(), 1);
    assert_eq!(outcome.new_units[0].type_id, "spearman");
    assert_eq!(outcome.snapshot.units.len(), 1);
    assert_eq!(
        outcome.snapshot.players[0].resources.get(Resource::Gold),
        90
    );
    let texts = texts_for(&outcome, 1);
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("barracks"));
}

#[test]
fn test_settlement_upgrade() {
    let state = SnapshotBuilder::new(3, 3)
        .with_player(1)
        .with_player(2)
        .with_settlement(1, SettlementTier::Campfire, 0, 0)
        .with_settlement(1, SettlementTier::Capital, 2, 2)
        .build();
    let actions = [
        PlayerActions::new(
            1,
            vec![
                TurnAction::UpgradeSettlement { settlement: 1 },
                TurnAction::UpgradeSettlement { settlement: 1 },
                TurnAction::UpgradeSettlement { settlement: 2 },
            ],
        ),
        PlayerActions::new(2, vec![TurnAction::UpgradeSettlement { settlement: 1 }]),
    ];

    let mut outcome = resolve(&state, &actions);
    assert_eq!(
        texts_for(&outcome, 1),
        vec![
            "Settlement is already upgrading",
            "Settlement is already at the highest tier"
        ]
    );
    assert_eq!(texts_for(&outcome, 2), vec!["Player 2 does not own this"]);
    assert_eq!(outcome.snapshot.settlements[0].upgrade_turns_remaining, 4);

    for _ in 0..4 {
        outcome = resolve(&outcome.snapshot.clone(), &[]);
    }
    let settlement = &outcome.snapshot.settlements[0];
    assert_eq!(settlement.tier, SettlementTier::Village);
    assert!(!settlement.upgrading);
}

#[test]
fn test_armies_form_then_move() {
    let state = SnapshotBuilder::new(5, 5)
        .with_player(1)
        .with_unit(1, "spearman", 0, 0)
        .with_unit(1, "archer", 0, 0)
        .build();
    let actions = [PlayerActions::new(
        1,
        vec![
            TurnAction::MoveArmy {
                army: 1,
                to: Coord::new(2, 2),
            },
            TurnAction::Move {
                unit: 1,
                to: Coord::new(4, 4),
            },
            TurnAction::CreateArmy { units: vec![1, 2] },
        ],
    )];

    let outcome = resolve(&state, &actions);
    assert_eq!(outcome.snapshot.armies.len(), 1);
    for unit in &outcome.snapshot.units {
        assert_eq!(unit.position(), Coord::new(2, 2));
        assert_eq!(unit.army, Some(1));
    }
    assert_eq!(
        texts_for(&outcome, 1),
        vec!["Unit 1 already belongs to an army"]
    );
}

#[test]
fn test_month_tick_messages_and_offspring() {
    let mut data = sample_data();
    data.unit_types.get_mut("sheep").unwrap().reproduction_chance = 1.0;
    let mut state = SnapshotBuilder::new(3, 3)
        .turn(20)
        .with_player(1)
        .with_unit(1, "sheep", 2, 2)
        .build();
    state.players[0].resources.set(Resource::Grain, 0);
    state.players[0].resources.set(Resource::Gold, 0);
    state.players[0].turn_played = true;
    for _ in 0..3 {
        let id = state.allocate_unit_id();
        state
            .units
            .push(crate::testing::unit_at(id, 1, "spearman", 0, 0));
    }

    let outcome = TurnEngine::default()
        .resolve_turn(&state, &[], &data, NOW, &mut sim_rng(3))
        .unwrap();

    let player = &outcome.snapshot.players[0];
    assert_eq!(player.resources.get(Resource::Grain), 0);
    assert!(!player.turn_played);
    assert!(texts_for(&outcome, 1)[0].starts_with("Grain shortage"));

    assert_eq!(outcome.new_units.len(), 1);
    let lamb = &outcome.new_units[0];
    assert_eq!(lamb.position(), Coord::new(2, 2));
    assert_eq!(outcome.snapshot.units.len(), 5);
    assert!(outcome.snapshot.units.iter().all(|u| !u.has_moved));
}

#[test]
fn test_accumulated_turns() {
    let engine = TurnEngine::default();
    let mut player = Player {
        id: 1,
        accumulated_turns: 2,
        last_login: Some(NOW - 3 * SECONDS_PER_DAY - 100),
        ..Default::default()
    };
    assert_eq!(engine.calculate_accumulated_turns(&player, NOW), 5);

    player.last_login = Some(NOW - 40 * SECONDS_PER_DAY);
    assert_eq!(engine.calculate_accumulated_turns(&player, NOW), 10);

    player.last_login = None;
    assert_eq!(engine.calculate_accumulated_turns(&player, NOW), 2);

    player.last_login = Some(NOW + 500);
    assert_eq!(engine.calculate_accumulated_turns(&player, NOW), 2);
}

#[test]
fn test_consume_turn() {
    let engine = TurnEngine::default();
    let mut player = Player {
        accumulated_turns: 1,
        ..Default::default()
    };
    assert_eq!(engine.consume_turn(&mut player), Ok(()));
    assert_eq!(player.accumulated_turns, 0);
    assert_eq!(
        engine.consume_turn(&mut player),
        Err(RuleViolation::NoTurnsLeft)
    );
    assert_eq!(player.accumulated_turns, 0);
}
