// Weighted movement grids, one per movement domain.
//
// A `WeightedGrid` is a dense `width x height` array of traversal weights
// indexed by `x + y * width`. A weight of 0 means the cell is impassable;
// any positive weight multiplies the cost of stepping into the cell. The
// path finder derives weights from terrain surfaces and keeps them current
// as the terrain changes (see `path_finder.rs`).
//
// Movement is 8-connected. A diagonal step is only allowed when both
// orthogonal cells it squeezes between are passable, so paths never cut
// wall corners.
//
// See also: `pathfinding.rs` for the A* search over this grid.

use crate::types::GridCell;
use smallvec::SmallVec;

/// Length of a diagonal step in cell units.
pub const DIAGONAL_STEP: f32 = std::f32::consts::SQRT_2;

/// Neighbor offsets: 4 orthogonal first, then 4 diagonal.
const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

/// A reachable neighbor of a cell and the geometric length of the step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    pub to: GridCell,
    pub length: f32,
}

#[derive(Clone, Debug, Default)]
pub struct WeightedGrid {
    width: i32,
    height: i32,
    weights: Vec<f32>,
}

impl WeightedGrid {
    /// A grid with every cell impassable.
    pub fn new(width: i32, height: i32) -> Self {
        let len = (width.max(0) as usize) * (height.max(0) as usize);
        Self {
            width,
            height,
            weights: vec![0.0; len],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn in_bounds(&self, cell: GridCell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    /// Flat index of an in-bounds cell.
    pub fn index(&self, cell: GridCell) -> Option<usize> {
        self.in_bounds(cell)
            .then(|| (cell.x + cell.y * self.width) as usize)
    }

    /// Inverse of `index`.
    pub fn cell_at(&self, index: usize) -> GridCell {
        let i = index as i32;
        GridCell::new(i % self.width, i / self.width)
    }

    /// Weight of a cell; off-grid cells weigh 0.
    pub fn weight(&self, cell: GridCell) -> f32 {
        self.index(cell).map_or(0.0, |i| self.weights[i])
    }

    pub fn is_passable(&self, cell: GridCell) -> bool {
        self.weight(cell) > 0.0
    }

    /// Set a cell's weight. Returns `true` when the stored value changed.
    pub fn set_weight(&mut self, cell: GridCell, weight: f32) -> bool {
        let Some(i) = self.index(cell) else {
            return false;
        };
        let weight = weight.max(0.0);
        if self.weights[i] == weight {
            return false;
        }
        self.weights[i] = weight;
        true
    }

    /// Passable neighbors of `cell`, orthogonal before diagonal.
    pub fn steps_from(&self, cell: GridCell) -> SmallVec<[Step; 8]> {
        let mut out = SmallVec::new();
        for (dx, dy) in NEIGHBOR_OFFSETS {
            let to = GridCell::new(cell.x + dx, cell.y + dy);
            if !self.is_passable(to) {
                continue;
            }
            let diagonal = dx != 0 && dy != 0;
            if diagonal {
                let side_a = GridCell::new(cell.x + dx, cell.y);
                let side_b = GridCell::new(cell.x, cell.y + dy);
                if !self.is_passable(side_a) || !self.is_passable(side_b) {
                    continue;
                }
            }
            let length = if diagonal { DIAGONAL_STEP } else { 1.0 };
            out.push(Step { to, length });
        }
        out
    }
}
