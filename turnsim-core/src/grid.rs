//! Tile storage.
//!
//! [`TileGrid`] is a bounded, row-major store of optional tiles. Cells can be
//! absent (e.g. not yet imported); neighbour queries only ever return present,
//! in-bounds tiles.

use crate::error::GridError;
use crate::state::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use turnsim_data::defines::map as defines;
use turnsim_data::{TerrainKind, TerrainTable};

/// Integer tile coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// max(|dx|, |dy|)
    pub fn chebyshev(self, other: Coord) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.y - other.y).unsigned_abs())
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
    pub terrain: TerrainKind,
    #[serde(default)]
    pub river: bool,
    #[serde(default)]
    pub road: bool,
    #[serde(default)]
    pub owner: Option<PlayerId>,
}

impl Tile {
    pub fn new(x: i32, y: i32, terrain: TerrainKind) -> Self {
        Self {
            x,
            y,
            terrain,
            river: false,
            road: false,
            owner: None,
        }
    }

    pub fn with_river(mut self) -> Self {
        self.river = true;
        self
    }

    pub fn with_road(mut self) -> Self {
        self.road = true;
        self
    }

    pub fn owned_by(mut self, player: PlayerId) -> Self {
        self.owner = Some(player);
        self
    }

    #[inline]
    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

/// Per-side growth or cut for [`TileGrid::expand`] and [`TileGrid::shrink`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Margins {
    pub const fn uniform(n: i32) -> Self {
        Self {
            left: n,
            top: n,
            right: n,
            bottom: n,
        }
    }

    fn check(self) -> Result<Self, GridError> {
        if self.left < 0 || self.top < 0 || self.right < 0 || self.bottom < 0 {
            return Err(GridError::NegativeMargins(self));
        }
        Ok(self)
    }
}

/// Square block of tiles, the unit of storage serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileChunk {
    pub cx: i32,
    pub cy: i32,
    pub tiles: Vec<Tile>,
}

/// Offsets in scan order: rows top to bottom, each row left to right.
const NEIGHBORS_8: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

const NEIGHBORS_4: [(i32, i32); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    width: i32,
    height: i32,
    /// Row-major, `width * height` cells.
    tiles: Vec<Option<Tile>>,
}

impl TileGrid {
    /// An empty grid with no tiles present.
    pub fn new(width: i32, height: i32) -> Result<Self, GridError> {
        if width < 1 || height < 1 {
            return Err(GridError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            tiles: vec![None; (width as usize) * (height as usize)],
        })
    }

    /// A grid with every cell present and set to `terrain`.
    pub fn filled(width: i32, height: i32, terrain: TerrainKind) -> Result<Self, GridError> {
        let mut grid = Self::new(width, height)?;
        for y in 0..height {
            for x in 0..width {
                let idx = grid.index(x, y);
                grid.tiles[idx] = Some(Tile::new(x, y, terrain));
            }
        }
        Ok(grid)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&Tile> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.tiles[self.index(x, y)].as_ref()
    }

    #[inline]
    pub fn at(&self, coord: Coord) -> Option<&Tile> {
        self.get(coord.x, coord.y)
    }

    /// Insert or replace the tile at the tile's own coordinate.
    pub fn set(&mut self, tile: Tile) -> Result<(), GridError> {
        if !self.in_bounds(tile.x, tile.y) {
            return Err(GridError::OutOfBounds(
                tile.coord(),
                self.width,
                self.height,
            ));
        }
        let idx = self.index(tile.x, tile.y);
        self.tiles[idx] = Some(tile);
        Ok(())
    }

    /// Present tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.iter().all(Option::is_none)
    }

    fn neighbors_with(&self, x: i32, y: i32, offsets: &[(i32, i32)]) -> Vec<&Tile> {
        offsets
            .iter()
            .filter_map(|&(dx, dy)| self.get(x + dx, y + dy))
            .collect()
    }

    /// Present tiles among the eight surrounding cells, in scan order.
    pub fn neighbors8(&self, x: i32, y: i32) -> Vec<&Tile> {
        self.neighbors_with(x, y, &NEIGHBORS_8)
    }

    /// Present tiles among the four edge-adjacent cells.
    pub fn neighbors_cardinal(&self, x: i32, y: i32) -> Vec<&Tile> {
        self.neighbors_with(x, y, &NEIGHBORS_4)
    }

    /// Cost to enter `tile`. A road overrides the terrain cost entirely.
    pub fn movement_cost(tile: &Tile, terrain: &TerrainTable) -> u32 {
        if tile.road {
            defines::ROAD_MOVEMENT_COST
        } else {
            terrain.get(tile.terrain).movement_cost
        }
    }

    /// Defense multiplier for a unit standing on `tile`.
    pub fn defense_bonus(tile: &Tile, terrain: &TerrainTable) -> f64 {
        let base = terrain.get(tile.terrain).defense_bonus;
        if tile.river {
            base + defines::RIVER_DEFENSE_BONUS
        } else {
            base
        }
    }

    /// Grow the grid. Existing tiles move by `(left, top)`; new cells get `fill`.
    /// Margins must be non-negative.
    pub fn expand(&self, margins: Margins, fill: TerrainKind) -> Result<TileGrid, GridError> {
        let margins = margins.check()?;
        let width = self.width + margins.left + margins.right;
        let height = self.height + margins.top + margins.bottom;
        let mut grid = TileGrid::new(width, height)?;

        for y in 0..height {
            for x in 0..width {
                let (ox, oy) = (x - margins.left, y - margins.top);
                let cell = if self.in_bounds(ox, oy) {
                    self.get(ox, oy).map(|old| Tile {
                        x,
                        y,
                        ..old.clone()
                    })
                } else {
                    Some(Tile::new(x, y, fill))
                };
                let idx = grid.index(x, y);
                grid.tiles[idx] = cell;
            }
        }
        Ok(grid)
    }

    /// Cut the grid. Surviving tiles move by `(-left, -top)`. Margins must be
    /// non-negative.
    pub fn shrink(&self, margins: Margins) -> Result<TileGrid, GridError> {
        let margins = margins.check()?;
        let width = self.width - margins.left - margins.right;
        let height = self.height - margins.top - margins.bottom;
        let mut grid = TileGrid::new(width, height)?;

        for tile in self.iter() {
            let (x, y) = (tile.x - margins.left, tile.y - margins.top);
            if grid.in_bounds(x, y) {
                let idx = grid.index(x, y);
                grid.tiles[idx] = Some(Tile {
                    x,
                    y,
                    ..tile.clone()
                });
            }
        }
        Ok(grid)
    }

    /// Chunk coordinate containing `coord`.
    pub fn chunk_of(coord: Coord) -> (i32, i32) {
        (
            coord.x.div_euclid(defines::CHUNK_SIZE),
            coord.y.div_euclid(defines::CHUNK_SIZE),
        )
    }

    /// Split present tiles into chunks, ordered by (cy, cx).
    pub fn to_chunks(&self) -> Vec<TileChunk> {
        let mut chunks: BTreeMap<(i32, i32), Vec<Tile>> = BTreeMap::new();
        for tile in self.iter() {
            let (cx, cy) = Self::chunk_of(tile.coord());
            chunks.entry((cy, cx)).or_default().push(tile.clone());
        }
        chunks
            .into_iter()
            .map(|((cy, cx), tiles)| TileChunk { cx, cy, tiles })
            .collect()
    }

    /// Rebuild a grid from chunks given in any order.
    pub fn from_chunks<I>(width: i32, height: i32, chunks: I) -> Result<TileGrid, GridError>
    where
        I: IntoIterator<Item = TileChunk>,
    {
        let mut grid = TileGrid::new(width, height)?;
        for chunk in chunks {
            for tile in chunk.tiles {
                if Self::chunk_of(tile.coord()) != (chunk.cx, chunk.cy) {
                    return Err(GridError::ChunkOutOfBounds(chunk.cx, chunk.cy));
                }
                grid.set(tile)?;
            }
        }
        Ok(grid)
    }
}
