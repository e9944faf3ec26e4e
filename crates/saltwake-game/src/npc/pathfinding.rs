//! A* grid pathfinder used for all NPC movement

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use saltwake_core::Cell;
use saltwake_world::Passable;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which neighbours a step may move to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    #[default]
    Four,
    Eight,
}

const ORTHOGONAL: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
const DIAGONAL: [(i32, i32); 4] = [(1, -1), (1, 1), (-1, 1), (-1, -1)];

impl Connectivity {
    fn heuristic(self, a: Cell, b: Cell) -> u32 {
        match self {
            Connectivity::Four => a.manhattan(b),
            Connectivity::Eight => a.chebyshev(b),
        }
    }

    pub fn is_diagonal(self) -> bool {
        self == Connectivity::Eight
    }
}

/// Bounds on a single search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub connectivity: Connectivity,
    /// Node expansions allowed before the search gives up
    pub max_expansions: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            connectivity: Connectivity::Four,
            max_expansions: 4096,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathError {
    #[error("cell {0} is outside the map")]
    OutOfBounds(Cell),

    #[error("start cell {0} is not walkable")]
    StartBlocked(Cell),

    #[error("goal cell {0} is not walkable")]
    GoalBlocked(Cell),

    #[error("no path exists")]
    Unreachable,

    #[error("search gave up after {expansions} expansions")]
    SearchLimit { expansions: usize },
}

/// Cells from start to goal, both inclusive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Path {
    cells: Vec<Cell>,
}

impl Path {
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn start(&self) -> Cell {
        self.cells[0]
    }

    pub fn goal(&self) -> Cell {
        self.cells[self.cells.len() - 1]
    }

    /// Number of steps, one less than the number of cells
    pub fn len(&self) -> usize {
        self.cells.len() - 1
    }

    /// True for the trivial path where start equals goal
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cells still to walk, excluding the start
    pub fn steps(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().skip(1).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    /// Estimated total cost (f = g + h)
    estimated_total: u32,
    /// Push order, earlier entries win ties
    seq: u64,
    index: usize,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .estimated_total
            .cmp(&self.estimated_total)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a shortest path from `start` to `goal`.
///
/// Step cost is uniform. Diagonal steps (with [`Connectivity::Eight`]) may not
/// cut past a blocked orthogonal neighbour. The map is only read.
pub fn find_path<P: Passable>(
    start: Cell,
    goal: Cell,
    map: &P,
    limits: SearchLimits,
) -> Result<Path, PathError> {
    for cell in [start, goal] {
        if !map.in_bounds(cell) {
            return Err(PathError::OutOfBounds(cell));
        }
    }
    if !map.is_passable(start) {
        return Err(PathError::StartBlocked(start));
    }
    if !map.is_passable(goal) {
        return Err(PathError::GoalBlocked(goal));
    }
    if start == goal {
        return Ok(Path { cells: vec![start] });
    }

    let (width, height) = map.dimensions();
    let width = width as usize;
    let size = width * height as usize;
    let index_of = |cell: Cell| cell.y as usize * width + cell.x as usize;
    let cell_of = |index: usize| Cell::new((index % width) as i32, (index / width) as i32);

    let mut best_cost = vec![u32::MAX; size];
    let mut came_from = vec![usize::MAX; size];
    let mut closed = vec![false; size];
    let mut open = BinaryHeap::new();
    let mut seq = 0u64;

    let start_index = index_of(start);
    let goal_index = index_of(goal);
    best_cost[start_index] = 0;
    open.push(OpenNode {
        estimated_total: limits.connectivity.heuristic(start, goal),
        seq,
        index: start_index,
    });

    let mut expansions = 0;
    while let Some(node) = open.pop() {
        if closed[node.index] {
            continue;
        }
        if node.index == goal_index {
            return Ok(Path {
                cells: reconstruct(&came_from, goal_index, start_index, cell_of),
            });
        }
        if expansions >= limits.max_expansions {
            return Err(PathError::SearchLimit { expansions });
        }
        expansions += 1;
        closed[node.index] = true;

        let current = cell_of(node.index);
        let next_cost = best_cost[node.index] + 1;
        for next in neighbours(current, map, limits.connectivity) {
            let next_index = index_of(next);
            if closed[next_index] || next_cost >= best_cost[next_index] {
                continue;
            }
            best_cost[next_index] = next_cost;
            came_from[next_index] = node.index;
            seq += 1;
            open.push(OpenNode {
                estimated_total: next_cost + limits.connectivity.heuristic(next, goal),
                seq,
                index: next_index,
            });
        }
    }

    Err(PathError::Unreachable)
}

fn neighbours<P: Passable>(cell: Cell, map: &P, connectivity: Connectivity) -> Vec<Cell> {
    let mut out: Vec<Cell> = ORTHOGONAL
        .iter()
        .map(|&(dx, dy)| cell.offset(dx, dy))
        .filter(|&c| map.is_passable(c))
        .collect();

    if connectivity.is_diagonal() {
        for &(dx, dy) in &DIAGONAL {
            let next = cell.offset(dx, dy);
            // No squeezing between two blocked orthogonals or past a corner
            if map.is_passable(next)
                && map.is_passable(cell.offset(dx, 0))
                && map.is_passable(cell.offset(0, dy))
            {
                out.push(next);
            }
        }
    }
    out
}

fn reconstruct(
    came_from: &[usize],
    goal: usize,
    start: usize,
    cell_of: impl Fn(usize) -> Cell,
) -> Vec<Cell> {
    let mut cells = vec![cell_of(goal)];
    let mut current = goal;
    while current != start {
        current = came_from[current];
        cells.push(cell_of(current));
    }
    cells.reverse();
    cells
}
