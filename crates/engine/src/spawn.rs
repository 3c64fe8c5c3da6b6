//! Per-run shared state and actor spawning.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use actors::{LightRegistry, RunControls, TrafficLightActor, VehicleActor};
use contracts::{now_ms, EventTargets, GridPos, SimulationConfig, VehicleKind};
use events::EventManager;
use occupancy::GridOccupancy;
use parking_lot::Mutex;
use rand::Rng;
use tokio::sync::watch;
use tracing::debug;

/// Attempt budget when searching for a spawn cell that is neither occupied
/// nor blocked.
const SPAWN_SEARCH_BUDGET: usize = 800;

/// Fixed intersection layout; positions outside the grid are skipped.
const LIGHT_POSITIONS: [(i32, i32); 8] = [
    (2, 2),
    (2, 5),
    (2, 7),
    (5, 2),
    (5, 5),
    (7, 2),
    (7, 5),
    (7, 7),
];

/// State shared between the coordinator, the publisher task and all actors
/// of one run. Reconstructed from scratch on every restart so independent
/// runs never interfere.
pub(crate) struct RunShared {
    pub config: SimulationConfig,
    pub started_at_ms: u64,
    pub occupancy: Arc<GridOccupancy>,
    pub lights: Arc<LightRegistry>,
    pub controls: Arc<RunControls>,
    pub events: Arc<EventManager>,
    pub vehicles: Mutex<BTreeMap<u32, Arc<VehicleActor>>>,
    pub shutdown: watch::Sender<bool>,
    id_gen: Arc<AtomicU32>,
}

impl RunShared {
    pub fn new(
        config: SimulationConfig,
        occupancy: Arc<GridOccupancy>,
        events: Arc<EventManager>,
        id_gen: Arc<AtomicU32>,
    ) -> Self {
        let mut lights = LightRegistry::new();
        if config.lights_enabled {
            for (x, y) in LIGHT_POSITIONS {
                let pos = GridPos::new(x, y);
                if !pos.in_bounds(config.grid_size) {
                    continue;
                }
                lights.insert(Arc::new(TrafficLightActor::new(
                    id_gen.fetch_add(1, Ordering::Relaxed),
                    pos,
                    config.light_green_ms,
                    config.light_yellow_ms,
                    config.light_all_red_ms,
                )));
            }
        }

        let controls = Arc::new(RunControls::new(config.sim_speed));
        let (shutdown, _) = watch::channel(false);

        Self {
            started_at_ms: now_ms(),
            occupancy,
            lights: Arc::new(lights),
            controls,
            events,
            vehicles: Mutex::new(BTreeMap::new()),
            shutdown,
            id_gen,
            config,
        }
    }

    /// Start every light's phase loop.
    pub fn start_lights(&self) {
        for light in self.lights.iter() {
            tokio::spawn(Arc::clone(light).run(self.shutdown.subscribe()));
        }
    }

    /// Spawn the initial fleet: priority vehicles first, then random kinds.
    pub fn spawn_initial_vehicles(&self) {
        let mut rng = rand::rng();
        let count = self.config.vehicle_count;
        let ambulances = self.config.ambulance_count.min(count);

        for _ in 0..ambulances {
            self.spawn_vehicle_inner(VehicleKind::Ambulance, &mut rng);
        }
        for _ in 0..count - ambulances {
            let kind = VehicleKind::ALL[rng.random_range(0..VehicleKind::ALL.len())];
            self.spawn_vehicle_inner(kind, &mut rng);
        }
    }

    /// Add one vehicle to the running simulation and start its loop.
    pub fn spawn_vehicle(&self, kind: VehicleKind) {
        let mut rng = rand::rng();
        self.spawn_vehicle_inner(kind, &mut rng);
    }

    fn spawn_vehicle_inner(&self, kind: VehicleKind, rng: &mut impl Rng) {
        let id = self.id_gen.fetch_add(1, Ordering::Relaxed);
        let start = self.random_free_cell(rng);
        let dest = self.random_cell(rng);

        let actor = Arc::new(VehicleActor::new(
            id,
            kind,
            start,
            dest,
            Arc::clone(&self.occupancy),
            Arc::clone(&self.lights),
            Arc::clone(&self.controls),
            self.config.base_step_ms,
        ));
        self.occupancy.occupy(start.key(self.config.grid_size), id);
        self.vehicles.lock().insert(id, Arc::clone(&actor));

        tokio::spawn(actor.run(self.shutdown.subscribe()));
        debug!(vehicle_id = id, kind = ?kind, pos = ?start, "vehicle spawned");
    }

    fn random_cell(&self, rng: &mut impl Rng) -> GridPos {
        let size = self.config.grid_size as i32;
        GridPos::new(rng.random_range(0..size), rng.random_range(0..size))
    }

    /// Bounded random search for a cell that is neither occupied nor under
    /// an active block; falls back to the origin.
    fn random_free_cell(&self, rng: &mut impl Rng) -> GridPos {
        let now = now_ms();
        for _ in 0..SPAWN_SEARCH_BUDGET {
            let pos = self.random_cell(rng);
            let key = pos.key(self.config.grid_size);
            if self.occupancy.blocked().is_blocked(key, now) {
                continue;
            }
            if !self.occupancy.is_occupied(key) {
                return pos;
            }
        }
        GridPos::new(0, 0)
    }

    pub fn vehicle_states(&self) -> Vec<contracts::VehicleState> {
        self.vehicles.lock().values().map(|v| v.state()).collect()
    }

    pub fn vehicle_handles(&self) -> Vec<Arc<VehicleActor>> {
        self.vehicles.lock().values().cloned().collect()
    }
}

/// The coordinator-side view the event manager uses when firing events.
pub(crate) struct RunTargets(pub Arc<RunShared>);

impl EventTargets for RunTargets {
    fn random_vehicle_position(&self) -> Option<GridPos> {
        let vehicles = self.0.vehicles.lock();
        if vehicles.is_empty() {
            return None;
        }
        let index = rand::rng().random_range(0..vehicles.len());
        vehicles.values().nth(index).map(|v| v.state().pos)
    }

    fn spawn_vehicle(&self, kind: VehicleKind) {
        self.0.spawn_vehicle(kind);
    }
}
