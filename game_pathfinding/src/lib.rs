use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::hash::Hash;

/// A trait for graphs that can be searched.
///
/// `Node`: The type of node identifiers (e.g., a tile coordinate).
/// `Ctx`: A context object passed to cost calculations (e.g., terrain table, movement domain).
pub trait Graph<Node, Ctx> {
    /// Return the neighbors of a node, in a stable order.
    ///
    /// Nodes that cannot be entered under `context` should not be returned.
    fn neighbors(&self, node: Node, context: &Ctx) -> Vec<Node>;

    /// Calculate the cost to move from `from` to `to`.
    fn cost(&self, from: Node, to: Node, context: &Ctx) -> u32;

    /// Calculate the estimated cost (heuristic) from `from` to `target`.
    /// For A*, this must be admissible (never overestimate).
    fn heuristic(&self, from: Node, target: Node, context: &Ctx) -> u32;
}

/// Tracks the order in which nodes were first discovered.
///
/// A node keeps its first sequence number even when a cheaper route to it is
/// found later, so equal-priority ties always resolve to the node that entered
/// the frontier first.
struct Discovery<Node> {
    seq: HashMap<Node, u64>,
    next: u64,
}

impl<Node: Copy + Eq + Hash> Discovery<Node> {
    fn new() -> Self {
        Self {
            seq: HashMap::new(),
            next: 0,
        }
    }

    fn seq_of(&mut self, node: Node) -> u64 {
        *self.seq.entry(node).or_insert_with(|| {
            let s = self.next;
            self.next += 1;
            s
        })
    }
}

/// A generic A* pathfinder.
pub struct AStar;

impl AStar {
    /// Find the shortest path from `start` to `goal` whose total cost does not
    /// exceed `max_cost`.
    ///
    /// Returns the path (start and goal inclusive) and its cost, or `None` if
    /// the goal cannot be reached within the budget.
    pub fn find_path<Node, Ctx, G>(
        graph: &G,
        start: Node,
        goal: Node,
        max_cost: u32,
        context: &Ctx,
    ) -> Option<(Vec<Node>, u32)>
    where
        Node: Copy + Eq + Hash + std::fmt::Debug,
        G: Graph<Node, Ctx>,
    {
        let mut open_set = BinaryHeap::new();
        let mut came_from: HashMap<Node, Node> = HashMap::new();
        let mut g_score: HashMap<Node, u32> = HashMap::new();
        let mut closed_set: HashSet<Node> = HashSet::new();
        let mut discovery = Discovery::new();

        g_score.insert(start, 0);
        open_set.push(State {
            node: start,
            seq: discovery.seq_of(start),
            priority: graph.heuristic(start, goal, context),
        });

        while let Some(State { node: current, .. }) = open_set.pop() {
            // Stale heap entry for a node we already expanded
            if !closed_set.insert(current) {
                continue;
            }

            if current == goal {
                let mut path = vec![current];
                let mut curr = current;
                while let Some(&prev) = came_from.get(&curr) {
                    path.push(prev);
                    curr = prev;
                }
                path.reverse();
                return Some((path, g_score[&goal]));
            }

            let current_g = g_score[&current];

            for neighbor in graph.neighbors(current, context) {
                if closed_set.contains(&neighbor) {
                    continue;
                }

                let tentative_g = current_g.saturating_add(graph.cost(current, neighbor, context));
                if tentative_g > max_cost {
                    continue;
                }

                if tentative_g < *g_score.get(&neighbor).unwrap_or(&u32::MAX) {
                    came_from.insert(neighbor, current);
                    g_score.insert(neighbor, tentative_g);
                    open_set.push(State {
                        node: neighbor,
                        seq: discovery.seq_of(neighbor),
                        priority: tentative_g
                            .saturating_add(graph.heuristic(neighbor, goal, context)),
                    });
                }
            }
        }

        None
    }
}

/// Bounded uniform-cost search.
pub struct Dijkstra;

impl Dijkstra {
    /// Compute the minimum cost to every node reachable from `start` within
    /// `max_cost`. The start node is included with cost 0.
    pub fn reachable<Node, Ctx, G>(
        graph: &G,
        start: Node,
        max_cost: u32,
        context: &Ctx,
    ) -> HashMap<Node, u32>
    where
        Node: Copy + Eq + Hash + std::fmt::Debug,
        G: Graph<Node, Ctx>,
    {
        let mut frontier = BinaryHeap::new();
        let mut best: HashMap<Node, u32> = HashMap::new();
        let mut settled: HashSet<Node> = HashSet::new();
        let mut discovery = Discovery::new();

        best.insert(start, 0);
        frontier.push(State {
            node: start,
            seq: discovery.seq_of(start),
            priority: 0,
        });

        while let Some(State {
            node: current,
            priority: current_cost,
            ..
        }) = frontier.pop()
        {
            if !settled.insert(current) {
                continue;
            }

            for neighbor in graph.neighbors(current, context) {
                if settled.contains(&neighbor) {
                    continue;
                }

                let next_cost = current_cost.saturating_add(graph.cost(current, neighbor, context));
                if next_cost > max_cost {
                    continue;
                }

                if next_cost < *best.get(&neighbor).unwrap_or(&u32::MAX) {
                    best.insert(neighbor, next_cost);
                    frontier.push(State {
                        node: neighbor,
                        seq: discovery.seq_of(neighbor),
                        priority: next_cost,
                    });
                }
            }
        }

        best
    }
}

/// Helper struct for the priority queue.
#[derive(Copy, Clone, Eq, PartialEq)]
struct State<Node> {
    node: Node,
    seq: u64,      // First-discovery order, used to break ties
    priority: u32, // f = g + h for A*, g for Dijkstra
}

// BinaryHeap is a max-heap: flip both comparisons so the lowest priority,
// then the earliest discovered node, pops first.
impl<Node: Eq> Ord for State<Node> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<Node: Eq> PartialOrd for State<Node> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
