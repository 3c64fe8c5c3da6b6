//! The simulation coordinator: lifecycle, triggers and observation.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use contracts::{
    EngineError, EventKind, SessionSink, SimulationConfig, SimulationEvent, SimulationSnapshot,
};
use events::{run_auto_generator, EventManager, EVENT_CHANNEL_CAPACITY};
use occupancy::{BlockedCells, GridOccupancy};
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tracing::{info, instrument};

use crate::publisher::run_publisher;
use crate::session::{summary_if_reportable, LogSessionSink};
use crate::spawn::{RunShared, RunTargets};

/// Owns one simulation at a time and every task it spawns.
///
/// Lifecycle: stopped -> running <-> paused -> stopped; `reset` always
/// returns to stopped. The snapshot slot and the event stream outlive
/// individual runs, so observers survive a restart.
pub struct SimulationCoordinator {
    run: Mutex<Option<Arc<RunShared>>>,
    snapshot_tx: watch::Sender<SimulationSnapshot>,
    events_tx: broadcast::Sender<SimulationEvent>,
    session_sink: Arc<dyn SessionSink>,
    /// Engine-level id source; never reset, so ids stay unique across runs.
    id_gen: Arc<AtomicU32>,
    /// Bumped by `reset` before the empty snapshot goes out. The publisher
    /// rechecks it under the snapshot slot's lock, so a snapshot built for a
    /// finished run can never land after the empty one.
    run_gen: Arc<AtomicU64>,
}

impl SimulationCoordinator {
    pub fn new() -> Self {
        Self::with_session_sink(Arc::new(LogSessionSink))
    }

    pub fn with_session_sink(session_sink: Arc<dyn SessionSink>) -> Self {
        let (snapshot_tx, _) = watch::channel(SimulationSnapshot::empty());
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            run: Mutex::new(None),
            snapshot_tx,
            events_tx,
            session_sink,
            id_gen: Arc::new(AtomicU32::new(1)),
            run_gen: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Tear down any prior run and start a fresh one from `config`.
    ///
    /// All tunables except the grid size are clamped into range; a
    /// non-positive grid size is the one fatal error.
    #[instrument(name = "coordinator_start", skip(self, config), fields(grid_size = config.grid_size))]
    pub fn start(&self, config: SimulationConfig) -> Result<(), EngineError> {
        config.validate()?;
        self.reset();

        let config = config.clamped();
        info!(
            grid_size = config.grid_size,
            vehicles = config.vehicle_count,
            ambulances = config.ambulance_count,
            lights = config.lights_enabled,
            collisions = config.collisions_enabled,
            auto_events = config.auto_events_enabled,
            "simulation starting"
        );

        let blocked = Arc::new(BlockedCells::new());
        let occupancy = Arc::new(GridOccupancy::new(
            config.grid_size,
            config.collisions_enabled,
            Arc::clone(&blocked),
        ));
        let events = Arc::new(EventManager::new(
            config.grid_size,
            blocked,
            self.events_tx.clone(),
        ));

        let shared = Arc::new(RunShared::new(
            config.clone(),
            occupancy,
            Arc::clone(&events),
            Arc::clone(&self.id_gen),
        ));

        shared.start_lights();
        shared.spawn_initial_vehicles();

        if config.auto_events_enabled {
            tokio::spawn(run_auto_generator(
                events,
                Arc::new(RunTargets(Arc::clone(&shared))),
                Arc::clone(&shared.controls),
                config.event_every_ms,
                shared.shutdown.subscribe(),
            ));
        }

        tokio::spawn(run_publisher(
            Arc::clone(&shared),
            self.snapshot_tx.clone(),
            Arc::clone(&self.run_gen),
            self.run_gen.load(Ordering::SeqCst),
            shared.shutdown.subscribe(),
        ));

        *self.run.lock() = Some(shared);
        Ok(())
    }

    /// Actors keep ticking while paused but skip their move attempts.
    pub fn pause(&self) {
        if let Some(shared) = self.current_run() {
            shared.controls.set_running(false);
        }
    }

    pub fn resume(&self) {
        if let Some(shared) = self.current_run() {
            shared.controls.set_running(true);
        }
    }

    /// Runtime speed change, clamped; applies on each actor's next tick.
    pub fn set_speed(&self, multiplier: f64) {
        if let Some(shared) = self.current_run() {
            shared.controls.set_speed(multiplier);
        }
    }

    /// Force pause, then drive exactly one move attempt per live vehicle,
    /// in ascending id order. Deterministic inspection stepping.
    pub async fn step_once(&self) {
        let handles = match self.current_run() {
            Some(shared) => {
                shared.controls.set_running(false);
                shared.vehicle_handles()
            }
            None => return,
        };
        for vehicle in handles {
            vehicle.attempt_move_once().await;
        }
    }

    /// Cancel every task of the current run, clear all shared state and
    /// publish an empty snapshot. Runs past the reporting threshold are
    /// handed to the session sink first.
    #[instrument(name = "coordinator_reset", skip(self))]
    pub fn reset(&self) {
        let previous = self.run.lock().take();
        if let Some(shared) = previous {
            let stats = self.snapshot_tx.borrow().stats.clone();
            if let Some(summary) = summary_if_reportable(&stats) {
                self.session_sink.record(summary);
            }

            shared.controls.set_running(false);
            // Every actor loop, the auto-generator and the publisher watch
            // this channel and exit at their next iteration boundary.
            let _ = shared.shutdown.send(true);
            info!("simulation reset");
        }
        // Invalidate before writing: the publisher may still be mid-build.
        self.run_gen.fetch_add(1, Ordering::SeqCst);
        let _ = self.snapshot_tx.send(SimulationSnapshot::empty());
    }

    /// Alias of [`reset`](Self::reset).
    pub fn stop(&self) {
        self.reset();
    }

    pub fn is_running(&self) -> bool {
        self.current_run()
            .map(|shared| shared.controls.is_running())
            .unwrap_or(false)
    }

    pub fn is_started(&self) -> bool {
        self.run.lock().is_some()
    }

    // ------------------------
    // Manual event triggers
    // ------------------------

    pub fn trigger_accident(&self) {
        self.trigger(EventKind::Accident);
    }

    pub fn trigger_roadworks(&self) {
        self.trigger(EventKind::Roadworks);
    }

    pub fn trigger_congestion(&self) {
        self.trigger(EventKind::Congestion);
    }

    pub fn trigger_emergency(&self) {
        self.trigger(EventKind::Emergency);
    }

    fn trigger(&self, kind: EventKind) {
        if let Some(shared) = self.current_run() {
            shared.events.trigger(kind, &RunTargets(Arc::clone(&shared)));
        }
    }

    // ------------------------
    // Observation
    // ------------------------

    /// Latest-value snapshot channel; republished at ~60 Hz while running.
    pub fn snapshot(&self) -> watch::Receiver<SimulationSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn latest_snapshot(&self) -> SimulationSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Discrete event notifications; lagging subscribers lose the oldest.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SimulationEvent> {
        self.events_tx.subscribe()
    }

    fn current_run(&self) -> Option<Arc<RunShared>> {
        self.run.lock().clone()
    }
}

impl Default for SimulationCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SimulationCoordinator {
    fn drop(&mut self) {
        if let Some(shared) = self.run.lock().take() {
            let _ = shared.shutdown.send(true);
        }
    }
}
