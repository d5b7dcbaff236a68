// A* search over a weighted movement grid.
//
// Standard A* with a `BinaryHeap` open set (min-heap via reversed
// ordering). Scores, parents and the closed set live in `Vec`s indexed by
// the grid's flat cell index, so there is no hashing and iteration order is
// fixed.
//
// Step cost is the geometric step length (1 or sqrt 2) times the weight of
// the cell being entered. The heuristic is octile distance, which is
// admissible because no passable cell weighs less than 1.
//
// The start cell is allowed to be impassable (a worker may stand on a cell
// whose weight just dropped to 0); the goal cell is not.
//
// See also: `grid.rs` for the grid being searched, `path_finder.rs` which
// runs this search on cache misses.
//
// **Critical constraint: determinism.** Ties in f-score are broken by cell
// index, so the same grid and endpoints always produce the same path.

use crate::grid::{DIAGONAL_STEP, WeightedGrid};
use crate::types::GridCell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// The result of a successful search.
#[derive(Clone, Debug, PartialEq)]
pub struct GridPath {
    /// Cells from start to goal, both inclusive.
    pub cells: Vec<GridCell>,
    /// Sum of weighted step costs.
    pub total_cost: f32,
}

/// Entry in the open set.
struct OpenEntry {
    index: usize,
    f_score: f32,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the smallest f-score pops first.
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.index.cmp(&self.index))
    }
}

/// Find the cheapest path from `start` to `goal`.
///
/// Returns `None` when either end is off the grid, the goal is impassable,
/// or the two cells are not connected.
pub fn astar(grid: &WeightedGrid, start: GridCell, goal: GridCell) -> Option<GridPath> {
    let start_i = grid.index(start)?;
    let goal_i = grid.index(goal)?;
    if start_i == goal_i {
        return Some(GridPath {
            cells: vec![start],
            total_cost: 0.0,
        });
    }
    if !grid.is_passable(goal) {
        return None;
    }

    let n = grid.len();
    let mut g_score = vec![f32::INFINITY; n];
    let mut came_from: Vec<Option<usize>> = vec![None; n];
    let mut closed = vec![false; n];

    g_score[start_i] = 0.0;
    let mut open = BinaryHeap::new();
    open.push(OpenEntry {
        index: start_i,
        f_score: octile(start, goal),
    });

    while let Some(current) = open.pop() {
        let ci = current.index;
        if ci == goal_i {
            return Some(reconstruct(grid, &came_from, start_i, goal_i, g_score[ci]));
        }
        if closed[ci] {
            continue;
        }
        closed[ci] = true;

        let cell = grid.cell_at(ci);
        let current_g = g_score[ci];
        for step in grid.steps_from(cell) {
            let Some(ni) = grid.index(step.to) else {
                continue;
            };
            if closed[ni] {
                continue;
            }
            let tentative = current_g + step.length * grid.weight(step.to);
            if tentative < g_score[ni] {
                g_score[ni] = tentative;
                came_from[ni] = Some(ci);
                open.push(OpenEntry {
                    index: ni,
                    f_score: tentative + octile(step.to, goal),
                });
            }
        }
    }

    None
}

/// Octile distance: exact step count on an open 8-connected grid.
fn octile(a: GridCell, b: GridCell) -> f32 {
    let dx = (a.x - b.x).unsigned_abs() as f32;
    let dy = (a.y - b.y).unsigned_abs() as f32;
    let (lo, hi) = if dx < dy { (dx, dy) } else { (dy, dx) };
    hi - lo + lo * DIAGONAL_STEP
}

fn reconstruct(
    grid: &WeightedGrid,
    came_from: &[Option<usize>],
    start_i: usize,
    goal_i: usize,
    total_cost: f32,
) -> GridPath {
    let mut cells = vec![grid.cell_at(goal_i)];
    let mut current = goal_i;
    while current != start_i {
        match came_from[current] {
            Some(prev) => {
                cells.push(grid.cell_at(prev));
                current = prev;
            }
            None => break,
        }
    }
    cells.reverse();
    GridPath { cells, total_cost }
}
