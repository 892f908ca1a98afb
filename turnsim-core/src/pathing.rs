//! Terrain- and domain-aware search over a [`TileGrid`].
//!
//! Moves are 8-directional. Entering a tile costs that tile's movement cost;
//! the starting tile is free. Tiles whose terrain is impassable for the
//! requested [`Domain`] are never entered.

use crate::grid::{Coord, TileGrid};
use game_pathfinding::{AStar, Dijkstra, Graph};
use std::collections::BTreeMap;
use tracing::instrument;
use turnsim_data::defines::map as defines;
use turnsim_data::{Domain, TerrainTable};

/// Per-search parameters handed to the graph callbacks.
pub struct PathContext<'a> {
    terrain: &'a TerrainTable,
    domain: Domain,
    /// Cheapest possible step, so the Chebyshev heuristic stays admissible.
    /// Zero degrades the search to uniform cost.
    min_step: u32,
}

impl<'a> PathContext<'a> {
    pub fn new(terrain: &'a TerrainTable, domain: Domain) -> Self {
        Self {
            terrain,
            domain,
            min_step: terrain
                .min_movement_cost()
                .min(defines::ROAD_MOVEMENT_COST),
        }
    }

    fn passable(&self, grid: &TileGrid, coord: Coord) -> bool {
        grid.at(coord).is_some_and(|tile| {
            let def = self.terrain.get(tile.terrain);
            match self.domain {
                Domain::Land => def.land_passable,
                Domain::Naval => def.naval_passable,
            }
        })
    }
}

struct GridGraph<'g>(&'g TileGrid);

impl Graph<Coord, PathContext<'_>> for GridGraph<'_> {
    fn neighbors(&self, node: Coord, context: &PathContext<'_>) -> Vec<Coord> {
        self.0
            .neighbors8(node.x, node.y)
            .into_iter()
            .map(|tile| tile.coord())
            .filter(|&c| context.passable(self.0, c))
            .collect()
    }

    fn cost(&self, _from: Coord, to: Coord, context: &PathContext<'_>) -> u32 {
        // neighbors() only yields present tiles
        self.0
            .at(to)
            .map_or(u32::MAX, |tile| TileGrid::movement_cost(tile, context.terrain))
    }

    fn heuristic(&self, from: Coord, target: Coord, context: &PathContext<'_>) -> u32 {
        from.chebyshev(target) * context.min_step
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResult {
    /// Start and goal inclusive; empty when unreachable.
    pub path: Vec<Coord>,
    pub cost: u32,
    pub reachable: bool,
}

impl PathResult {
    fn unreachable() -> Self {
        Self {
            path: Vec::new(),
            cost: 0,
            reachable: false,
        }
    }
}

pub struct Pathfinder;

impl Pathfinder {
    /// Cheapest path from `start` to `goal` costing at most `max_cost`.
    ///
    /// "No path" is a normal result, not an error.
    #[instrument(skip_all, name = "find_path")]
    pub fn find_path(
        grid: &TileGrid,
        terrain: &TerrainTable,
        start: Coord,
        goal: Coord,
        domain: Domain,
        max_cost: u32,
    ) -> PathResult {
        if grid.at(start).is_none() || grid.at(goal).is_none() {
            return PathResult::unreachable();
        }

        let context = PathContext::new(terrain, domain);
        match AStar::find_path(&GridGraph(grid), start, goal, max_cost, &context) {
            Some((path, cost)) => PathResult {
                path,
                cost,
                reachable: true,
            },
            None => {
                log::trace!("No {:?} path {} -> {} within {}", domain, start, goal, max_cost);
                PathResult::unreachable()
            }
        }
    }

    /// Minimum cost to every tile reachable from `start` within `max_cost`,
    /// including `start` itself at cost 0.
    #[instrument(skip_all, name = "reachable_tiles")]
    pub fn reachable_tiles(
        grid: &TileGrid,
        terrain: &TerrainTable,
        start: Coord,
        max_cost: u32,
        domain: Domain,
    ) -> BTreeMap<Coord, u32> {
        if grid.at(start).is_none() {
            return BTreeMap::new();
        }

        let context = PathContext::new(terrain, domain);
        Dijkstra::reachable(&GridGraph(grid), start, max_cost, &context)
            .into_iter()
            .collect()
    }
}
