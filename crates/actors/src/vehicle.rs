//! Vehicle actor: repeating movement loop with greedy axis-priority routing.

use std::sync::Arc;
use std::time::Duration;

use contracts::{
    now_ms, GridPos, IntersectionSignal, VehicleKind, VehicleState, VehicleStatus,
};
use occupancy::GridOccupancy;
use parking_lot::Mutex;
use rand::Rng;
use tokio::sync::watch;
use tracing::debug;

use crate::controls::sleep_or_shutdown;
use crate::light::LightRegistry;
use crate::RunControls;

/// Wait time charged per failed move attempt, independent of tick length.
const WAIT_INCREMENT_MS: u64 = 60;

/// Tick interval bounds after speed scaling.
const MIN_TICK_MS: u64 = 20;
const MAX_TICK_MS: u64 = 600;

/// One vehicle and its movement loop.
///
/// State is owned by this actor and mutated only on its tick; the publisher
/// takes clones through [`VehicleActor::state`].
pub struct VehicleActor {
    id: u32,
    kind: VehicleKind,
    state: Mutex<VehicleState>,

    occupancy: Arc<GridOccupancy>,
    lights: Arc<LightRegistry>,
    controls: Arc<RunControls>,
    base_step_ms: u64,
}

impl VehicleActor {
    pub fn new(
        id: u32,
        kind: VehicleKind,
        pos: GridPos,
        dest: GridPos,
        occupancy: Arc<GridOccupancy>,
        lights: Arc<LightRegistry>,
        controls: Arc<RunControls>,
        base_step_ms: u64,
    ) -> Self {
        let state = VehicleState {
            id,
            kind,
            pos,
            dest,
            status: VehicleStatus::Moving,
            color_argb: kind.color_argb(),
            render_size: kind.render_size(),
            moved_cells: 0,
            wait_ms: 0,
        };
        Self {
            id,
            kind,
            state: Mutex::new(state),
            occupancy,
            lights,
            controls,
            base_step_ms,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> VehicleKind {
        self.kind
    }

    pub fn state(&self) -> VehicleState {
        self.state.lock().clone()
    }

    /// Greedy axis-priority routing: close the X gap one cell per tick,
    /// then the Y gap. L-shaped paths, never diagonal.
    fn next_step(cur: GridPos, dest: GridPos) -> GridPos {
        let dx = dest.x - cur.x;
        let dy = dest.y - cur.y;
        if dx != 0 {
            GridPos::new(cur.x + dx.clamp(-1, 1), cur.y)
        } else if dy != 0 {
            GridPos::new(cur.x, cur.y + dy.clamp(-1, 1))
        } else {
            cur
        }
    }

    /// Current tick interval; recomputed every tick so runtime speed
    /// changes apply without a restart.
    pub fn tick_interval(&self) -> Duration {
        let speed = self.controls.speed() * self.kind.speed_factor();
        let ms = (self.base_step_ms as f64 / speed) as u64;
        Duration::from_millis(ms.clamp(MIN_TICK_MS, MAX_TICK_MS))
    }

    /// Drive exactly one tick of movement logic.
    pub async fn attempt_move_once(&self) {
        let (cur, dest) = {
            let state = self.state.lock();
            (state.pos, state.dest)
        };

        if cur == dest {
            let grid_size = self.occupancy.grid_size() as i32;
            let mut rng = rand::rng();
            let new_dest = GridPos::new(
                rng.random_range(0..grid_size),
                rng.random_range(0..grid_size),
            );
            let mut state = self.state.lock();
            state.dest = new_dest;
            state.status = VehicleStatus::Moving;
            return;
        }

        let next = Self::next_step(cur, dest);
        let light = self
            .lights
            .light_at(next)
            .map(|l| l.as_ref() as &dyn IntersectionSignal);

        let moved = self
            .occupancy
            .try_move(self.id, cur, next, self.kind.is_priority(), light, now_ms())
            .await;

        let mut state = self.state.lock();
        if moved {
            state.pos = next;
            state.status = VehicleStatus::Moving;
            state.moved_cells += 1;
        } else {
            state.status = VehicleStatus::Stopped;
            state.wait_ms += WAIT_INCREMENT_MS;
        }
    }

    /// Actor loop: move while running, then sleep the speed-scaled tick.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        debug!(vehicle_id = self.id, kind = ?self.kind, "vehicle started");
        while !*shutdown.borrow() {
            if self.controls.is_running() {
                self.attempt_move_once().await;
            }
            if sleep_or_shutdown(self.tick_interval(), &mut shutdown).await {
                break;
            }
        }
        debug!(vehicle_id = self.id, "vehicle stopped");
    }
}

impl std::fmt::Debug for VehicleActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VehicleActor")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("state", &self.state())
            .finish()
    }
}
