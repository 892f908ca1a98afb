//! Fixtures for tests: a fluent snapshot builder and a small reference data set.

use crate::grid::{Tile, TileGrid};
use crate::state::{
    BuildingInstance, DiplomacyStatus, GameSnapshot, Player, PlayerId, SettlementInstance,
    SettlementTier, UnitId, UnitInstance,
};
use turnsim_data::{
    BuildingType, Domain, FactionBonus, FactionDef, GameData, Resource, ResourceBag, TerrainKind,
    UnitStats, UnitType,
};

/// HP given to units created through the builder.
pub const TEST_UNIT_HP: i32 = 20;

pub fn unit_at(id: UnitId, owner: PlayerId, type_id: &str, x: i32, y: i32) -> UnitInstance {
    UnitInstance {
        id,
        type_id: type_id.to_string(),
        owner,
        x,
        y,
        hp: TEST_UNIT_HP,
        alive: true,
        has_moved: false,
        has_acted: false,
        army: None,
        created_turn: 0,
    }
}

fn unit_type(id: &str, stats: UnitStats) -> UnitType {
    UnitType {
        id: id.to_string(),
        name: id.to_string(),
        stats,
        domain: Domain::Land,
        cost: ResourceBag::new(),
        upkeep: ResourceBag::new(),
        can_reproduce: false,
        reproduction_chance: 0.0,
        required_building: None,
    }
}

/// Units: `spearman`, `archer` (needs barracks), `scout`, `galley` (naval),
/// `sheep` (reproduces). Buildings: `barracks`, `farm`, `mine`.
/// Factions: `northmen` (two stacked grain bonuses), `merchants`.
pub fn sample_data() -> GameData {
    let mut data = GameData::default();

    let mut spearman = unit_type(
        "spearman",
        UnitStats {
            hp: TEST_UNIT_HP,
            attack: 10,
            defense: 6,
            movement: 3,
            range: 1,
            sight: 2,
        },
    );
    spearman.cost = ResourceBag::new().with(Resource::Gold, 10);
    spearman.upkeep = ResourceBag::new().with(Resource::Grain, 1);

    let mut archer = unit_type(
        "archer",
        UnitStats {
            hp: 15,
            attack: 8,
            defense: 3,
            movement: 2,
            range: 2,
            sight: 3,
        },
    );
    archer.cost = ResourceBag::new()
        .with(Resource::Gold, 15)
        .with(Resource::Wood, 5);
    archer.upkeep = ResourceBag::new()
        .with(Resource::Grain, 1)
        .with(Resource::Gold, 1);
    archer.required_building = Some("barracks".to_string());

    let scout = unit_type(
        "scout",
        UnitStats {
            hp: 10,
            attack: 3,
            defense: 2,
            movement: 5,
            range: 1,
            sight: 4,
        },
    );

    let mut galley = unit_type(
        "galley",
        UnitStats {
            hp: 30,
            attack: 7,
            defense: 5,
            movement: 4,
            range: 1,
            sight: 3,
        },
    );
    galley.domain = Domain::Naval;

    let mut sheep = unit_type(
        "sheep",
        UnitStats {
            hp: 5,
            attack: 0,
            defense: 1,
            movement: 1,
            range: 0,
            sight: 1,
        },
    );
    sheep.can_reproduce = true;
    sheep.reproduction_chance = 0.5;

    for unit in [spearman, archer, scout, galley, sheep] {
        data.unit_types.insert(unit.id.clone(), unit);
    }

    for (id, production) in [
        ("barracks", ResourceBag::new()),
        ("farm", ResourceBag::new().with(Resource::Grain, 5)),
        (
            "mine",
            ResourceBag::new()
                .with(Resource::Gold, 3)
                .with(Resource::Iron, 2),
        ),
    ] {
        data.building_types.insert(
            id.to_string(),
            BuildingType {
                id: id.to_string(),
                name: id.to_string(),
                production,
            },
        );
    }

    for faction in [
        FactionDef {
            id: "northmen".to_string(),
            name: "Northmen".to_string(),
            description: String::new(),
            color: None,
            bonuses: vec![
                FactionBonus {
                    resource: Resource::Grain,
                    percent: 50.0,
                },
                FactionBonus {
                    resource: Resource::Grain,
                    percent: 50.0,
                },
            ],
        },
        FactionDef {
            id: "merchants".to_string(),
            name: "Merchants".to_string(),
            description: String::new(),
            color: None,
            bonuses: vec![FactionBonus {
                resource: Resource::Gold,
                percent: 20.0,
            }],
        },
    ] {
        data.factions.insert(faction.id.clone(), faction);
    }

    data
}

pub struct SnapshotBuilder {
    state: GameSnapshot,
}

impl SnapshotBuilder {
    /// A `width` x `height` plains map with nothing on it.
    pub fn new(width: i32, height: i32) -> Self {
        let grid = match TileGrid::filled(width, height, TerrainKind::Plains) {
            Ok(grid) => grid,
            Err(e) => panic!("invalid test grid: {e}"),
        };
        Self {
            state: GameSnapshot::new(grid),
        }
    }

    pub fn turn(mut self, turn: u32) -> Self {
        self.state.turn = turn;
        self
    }

    pub fn with_tile(mut self, tile: Tile) -> Self {
        if let Err(e) = self.state.grid.set(tile) {
            panic!("invalid test tile: {e}");
        }
        self
    }

    /// A player with 100 gold and 50 grain.
    pub fn with_player(mut self, id: PlayerId) -> Self {
        self.state.players.push(Player {
            id,
            name: format!("Player {id}"),
            resources: ResourceBag::new()
                .with(Resource::Gold, 100)
                .with(Resource::Grain, 50),
            ..Default::default()
        });
        self
    }

    pub fn with_player_state(mut self, player: Player) -> Self {
        self.state.players.push(player);
        self
    }

    pub fn with_unit(mut self, owner: PlayerId, type_id: &str, x: i32, y: i32) -> Self {
        let id = self.state.allocate_unit_id();
        self.state.units.push(unit_at(id, owner, type_id, x, y));
        self
    }

    pub fn with_unit_state(mut self, unit: UnitInstance) -> Self {
        self.state.next_unit_id = self.state.next_unit_id.max(unit.id + 1);
        self.state.units.push(unit);
        self
    }

    pub fn with_building(
        mut self,
        owner: PlayerId,
        type_id: &str,
        x: i32,
        y: i32,
        constructed: bool,
    ) -> Self {
        let id = self.state.allocate_building_id();
        self.state.buildings.push(BuildingInstance {
            id,
            type_id: type_id.to_string(),
            owner,
            x,
            y,
            constructed,
            turns_remaining: if constructed { 0 } else { 3 },
        });
        self
    }

    pub fn with_settlement(
        mut self,
        owner: PlayerId,
        tier: SettlementTier,
        x: i32,
        y: i32,
    ) -> Self {
        let id = self.state.settlements.len() as u32 + 1;
        self.state.settlements.push(SettlementInstance {
            id,
            name: format!("Settlement {id}"),
            owner,
            x,
            y,
            tier,
            upgrading: false,
            upgrade_turns_remaining: 0,
        });
        self
    }

    pub fn with_relation(mut self, a: PlayerId, b: PlayerId, status: DiplomacyStatus) -> Self {
        self.state.diplomacy.set(a, b, status);
        self
    }

    pub fn build(self) -> GameSnapshot {
        self.state
    }
}
