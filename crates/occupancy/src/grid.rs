//! Grid occupancy index and move arbitration.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use contracts::{Axis, GridPos, IntersectionSignal, PRIORITY_WINDOW_MS};
use parking_lot::Mutex;
use tracing::instrument;

use crate::BlockedCells;

/// Shared cell -> vehicle mapping plus the per-cell lock table.
///
/// The lock table is the only mutual-exclusion region in the engine. Both
/// cell locks of a contested move are acquired in ascending key order; a
/// fixed global order prevents circular wait regardless of move direction.
pub struct GridOccupancy {
    grid_size: usize,
    collisions_enabled: bool,
    cells: Mutex<HashMap<usize, u32>>,
    cell_locks: Vec<tokio::sync::Mutex<()>>,
    blocked: Arc<BlockedCells>,
    collisions_avoided: AtomicU64,
}

impl GridOccupancy {
    /// Allocate an index for a `grid_size` x `grid_size` world. The lock
    /// table is sized to the full grid up front.
    pub fn new(grid_size: usize, collisions_enabled: bool, blocked: Arc<BlockedCells>) -> Self {
        let mut cell_locks = Vec::with_capacity(grid_size * grid_size);
        cell_locks.resize_with(grid_size * grid_size, || tokio::sync::Mutex::new(()));

        Self {
            grid_size,
            collisions_enabled,
            cells: Mutex::new(HashMap::new()),
            cell_locks,
            blocked,
            collisions_avoided: AtomicU64::new(0),
        }
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn blocked(&self) -> &Arc<BlockedCells> {
        &self.blocked
    }

    /// Place a vehicle on a cell without arbitration (initial spawn).
    pub fn occupy(&self, key: usize, vehicle_id: u32) {
        self.cells.lock().insert(key, vehicle_id);
    }

    pub fn is_occupied(&self, key: usize) -> bool {
        self.cells.lock().contains_key(&key)
    }

    pub fn vehicle_at(&self, key: usize) -> Option<u32> {
        self.cells.lock().get(&key).copied()
    }

    /// Current (cell, vehicle) pairs, for inspection and tests.
    pub fn entries(&self) -> Vec<(usize, u32)> {
        self.cells.lock().iter().map(|(&k, &v)| (k, v)).collect()
    }

    pub fn collisions_avoided(&self) -> u64 {
        self.collisions_avoided.load(Ordering::Relaxed)
    }

    /// Attempt to move `vehicle_id` from `from` to `to`.
    ///
    /// Exactly one of {move applied, collision counted, rejection by
    /// block/light} happens per call. Failures are symmetric: the outcome
    /// carries no contender identity.
    #[instrument(
        level = "trace",
        name = "occupancy_try_move",
        skip(self, light),
        fields(has_light = light.is_some())
    )]
    pub async fn try_move(
        &self,
        vehicle_id: u32,
        from: GridPos,
        to: GridPos,
        is_priority: bool,
        light: Option<&dyn IntersectionSignal>,
        now_ms: u64,
    ) -> bool {
        let from_key = from.key(self.grid_size);
        let to_key = to.key(self.grid_size);
        if from_key == to_key {
            return true;
        }

        // Blocking events close the target cell until their expiry.
        if self.blocked.is_blocked(to_key, now_ms) {
            metrics::counter!("sim_move_attempts_total", "outcome" => "blocked").increment(1);
            return false;
        }

        if let Some(light) = light {
            if is_priority {
                light.request_priority(Axis::of_move(from, to), PRIORITY_WINDOW_MS);
            }
            if !light.is_green_for_move(from, to) {
                metrics::counter!("sim_move_attempts_total", "outcome" => "red_light")
                    .increment(1);
                return false;
            }
        }

        // Chaos mode: occupancy tracked but never arbitrated.
        if !self.collisions_enabled {
            let mut cells = self.cells.lock();
            cells.remove(&from_key);
            cells.insert(to_key, vehicle_id);
            metrics::counter!("sim_move_attempts_total", "outcome" => "ok").increment(1);
            return true;
        }

        let (first, second) = if from_key < to_key {
            (from_key, to_key)
        } else {
            (to_key, from_key)
        };

        let _first_guard = self.cell_locks[first].lock().await;
        let _second_guard = self.cell_locks[second].lock().await;

        let mut cells = self.cells.lock();
        if cells.contains_key(&to_key) {
            self.collisions_avoided.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("sim_collisions_avoided_total").increment(1);
            metrics::counter!("sim_move_attempts_total", "outcome" => "occupied").increment(1);
            false
        } else {
            cells.remove(&from_key);
            cells.insert(to_key, vehicle_id);
            metrics::counter!("sim_move_attempts_total", "outcome" => "ok").increment(1);
            true
        }
    }
}

impl std::fmt::Debug for GridOccupancy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridOccupancy")
            .field("grid_size", &self.grid_size)
            .field("collisions_enabled", &self.collisions_enabled)
            .field("occupied_cells", &self.cells.lock().len())
            .field("collisions_avoided", &self.collisions_avoided())
            .finish()
    }
}
