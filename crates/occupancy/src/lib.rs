//! # Occupancy
//!
//! Shared grid-occupancy index and collision-avoidance protocol.
//!
//! Responsibilities:
//! - cell -> vehicle mapping with atomic single-entry updates
//! - per-cell lock table, acquired in ascending key order
//! - blocked-cell registry written by the event manager

mod blocked;
mod grid;

pub use blocked::BlockedCells;
pub use grid::GridOccupancy;
