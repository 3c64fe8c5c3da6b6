//! Grid coordinates and cell keys.

use serde::{Deserialize, Serialize};

/// A cell on the uniform simulation grid.
///
/// Valid coordinates satisfy `0 <= x, y < grid_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Deterministic integer encoding of this cell, used as a map index and
    /// as the global lock order. Injective over the valid coordinate range.
    pub fn key(&self, grid_size: usize) -> usize {
        self.x as usize * grid_size + self.y as usize
    }

    /// Whether this cell lies inside a `grid_size` x `grid_size` grid.
    pub fn in_bounds(&self, grid_size: usize) -> bool {
        let size = grid_size as i32;
        (0..size).contains(&self.x) && (0..size).contains(&self.y)
    }
}
