use crate::grid::{Coord, TileGrid};
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use turnsim_data::defines::economy as defines;
use turnsim_data::{BuildingTypeId, FactionId, ResourceBag, UnitTypeId};

pub type PlayerId = u32;
pub type UnitId = u32;
pub type ArmyId = u32;
pub type BuildingId = u32;
pub type SettlementId = u32;
pub type Turn = u32;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub faction: Option<FactionId>,
    /// Stored pool. Every entry is kept non-negative.
    #[serde(default)]
    pub resources: ResourceBag,
    #[serde(default)]
    pub turn_played: bool,
    /// Banked turns (permanent mode only), in [0, 10].
    #[serde(default)]
    pub accumulated_turns: u32,
    /// Unix seconds of the last login (permanent mode only).
    #[serde(default)]
    pub last_login: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInstance {
    pub id: UnitId,
    pub type_id: UnitTypeId,
    pub owner: PlayerId,
    pub x: i32,
    pub y: i32,
    pub hp: i32,
    pub alive: bool,
    pub has_moved: bool,
    pub has_acted: bool,
    /// Back-reference only; the army lists its members separately.
    pub army: Option<ArmyId>,
    pub created_turn: Turn,
}

impl UnitInstance {
    #[inline]
    pub fn position(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Army {
    pub id: ArmyId,
    pub owner: PlayerId,
    pub members: Vec<UnitId>,
    pub x: i32,
    pub y: i32,
}

impl Army {
    #[inline]
    pub fn position(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingInstance {
    pub id: BuildingId,
    pub type_id: BuildingTypeId,
    pub owner: PlayerId,
    pub x: i32,
    pub y: i32,
    pub constructed: bool,
    /// Turns of construction left; 0 once constructed.
    pub turns_remaining: u32,
}

impl BuildingInstance {
    #[inline]
    pub fn position(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SettlementTier {
    #[default]
    Campfire,
    Village,
    Town,
    City,
    Capital,
}

impl SettlementTier {
    /// Flat monthly treasury income.
    pub fn tax(self) -> i64 {
        match self {
            SettlementTier::Campfire => defines::CAMPFIRE_TAX,
            SettlementTier::Village => defines::VILLAGE_TAX,
            SettlementTier::Town => defines::TOWN_TAX,
            SettlementTier::City => defines::CITY_TAX,
            SettlementTier::Capital => defines::CAPITAL_TAX,
        }
    }

    pub fn next(self) -> Option<SettlementTier> {
        match self {
            SettlementTier::Campfire => Some(SettlementTier::Village),
            SettlementTier::Village => Some(SettlementTier::Town),
            SettlementTier::Town => Some(SettlementTier::City),
            SettlementTier::City => Some(SettlementTier::Capital),
            SettlementTier::Capital => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementInstance {
    pub id: SettlementId,
    pub name: String,
    pub owner: PlayerId,
    pub x: i32,
    pub y: i32,
    pub tier: SettlementTier,
    pub upgrading: bool,
    pub upgrade_turns_remaining: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiplomacyStatus {
    #[default]
    Neutral,
    Allied,
    Enemy,
}

/// Pairwise relations. Keys are stored in sorted order (smaller id first);
/// a missing entry means neutral.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiplomacyState {
    #[serde(with = "pair_map")]
    relations: BTreeMap<(PlayerId, PlayerId), DiplomacyStatus>,
}

impl DiplomacyState {
    fn key(a: PlayerId, b: PlayerId) -> (PlayerId, PlayerId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn status(&self, a: PlayerId, b: PlayerId) -> DiplomacyStatus {
        self.relations
            .get(&Self::key(a, b))
            .copied()
            .unwrap_or_default()
    }

    pub fn set(&mut self, a: PlayerId, b: PlayerId, status: DiplomacyStatus) {
        let key = Self::key(a, b);
        if status == DiplomacyStatus::Neutral {
            self.relations.remove(&key);
        } else {
            self.relations.insert(key, status);
        }
    }

    pub fn are_enemies(&self, a: PlayerId, b: PlayerId) -> bool {
        self.status(a, b) == DiplomacyStatus::Enemy
    }

    /// Same owner, or an explicit alliance.
    pub fn are_allied(&self, a: PlayerId, b: PlayerId) -> bool {
        a == b || self.status(a, b) == DiplomacyStatus::Allied
    }
}

/// JSON object keys must be strings, so tuple-keyed maps go over the wire as a list.
mod pair_map {
    use super::{DiplomacyStatus, PlayerId};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    #[derive(Serialize, Deserialize)]
    struct Entry {
        a: PlayerId,
        b: PlayerId,
        status: DiplomacyStatus,
    }

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<(PlayerId, PlayerId), DiplomacyStatus>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let entries: Vec<Entry> = map
            .iter()
            .map(|(&(a, b), &status)| Entry { a, b, status })
            .collect();
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<(PlayerId, PlayerId), DiplomacyStatus>, D::Error> {
        let entries = Vec::<Entry>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|e| ((e.a.min(e.b), e.a.max(e.b)), e.status))
            .collect())
    }
}

/// Everything the engine reads and writes for one game.
///
/// The host loads this before resolution and persists the returned copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub turn: Turn,
    pub grid: TileGrid,
    pub players: Vec<Player>,
    pub units: Vec<UnitInstance>,
    pub armies: Vec<Army>,
    pub buildings: Vec<BuildingInstance>,
    pub settlements: Vec<SettlementInstance>,
    pub diplomacy: DiplomacyState,
    pub next_unit_id: UnitId,
    pub next_army_id: ArmyId,
    pub next_building_id: BuildingId,
}

impl GameSnapshot {
    pub fn new(grid: TileGrid) -> Self {
        Self {
            turn: 0,
            grid,
            players: Vec::new(),
            units: Vec::new(),
            armies: Vec::new(),
            buildings: Vec::new(),
            settlements: Vec::new(),
            diplomacy: DiplomacyState::default(),
            next_unit_id: 1,
            next_army_id: 1,
            next_building_id: 1,
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn unit(&self, id: UnitId) -> Option<&UnitInstance> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut UnitInstance> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    pub fn army(&self, id: ArmyId) -> Option<&Army> {
        self.armies.iter().find(|a| a.id == id)
    }

    /// Hand out the next unit id.
    pub fn allocate_unit_id(&mut self) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id += 1;
        id
    }

    pub fn allocate_army_id(&mut self) -> ArmyId {
        let id = self.next_army_id;
        self.next_army_id += 1;
        id
    }

    pub fn allocate_building_id(&mut self) -> BuildingId {
        let id = self.next_building_id;
        self.next_building_id += 1;
        id
    }

    /// Compute a deterministic checksum of the snapshot.
    ///
    /// Used for replay validation and desync detection: identical snapshots
    /// produce identical checksums on every platform.
    pub fn checksum(&self) -> u64 {
        use std::hash::Hasher;

        let mut hasher = FxHasher::default();
        match serde_json::to_vec(self) {
            Ok(bytes) => hasher.write(&bytes),
            Err(e) => {
                log::warn!("Snapshot serialization failed during checksum: {}", e);
                hasher.write_u8(0);
            }
        }
        hasher.finish()
    }
}
