//! Snapshot aggregation and the fixed-cadence publication loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use actors::sleep_or_shutdown;
use contracts::{now_ms, SimulationSnapshot};
use tokio::sync::watch;
use tracing::debug;

use crate::spawn::RunShared;

/// Publication cadence (~60 Hz), independent of simulation speed.
const PUBLISH_INTERVAL_MS: u64 = 16;

/// Build one immutable snapshot of the whole run at `now_ms`.
///
/// Expired events and cell blocks are purged first, so the active set the
/// snapshot reports is already consistent with `now_ms`.
pub(crate) fn build_snapshot(shared: &RunShared, now_ms: u64) -> SimulationSnapshot {
    shared.events.purge_expired(now_ms);

    let vehicles = shared.vehicle_states();
    let lights = shared.lights.views(now_ms);
    let events = shared.events.active_events();

    let sim_time_ms = now_ms.saturating_sub(shared.started_at_ms);
    let stats = SimulationSnapshot::aggregate(
        &vehicles,
        shared.occupancy.collisions_avoided(),
        sim_time_ms,
        events.len(),
    );

    metrics::gauge!("sim_active_vehicles").set(stats.active_vehicles as f64);
    metrics::gauge!("sim_avg_speed_cells_per_sec").set(stats.avg_speed_cells_per_sec);
    metrics::gauge!("sim_active_events").set(stats.active_events as f64);

    SimulationSnapshot {
        grid_size: shared.config.grid_size,
        vehicles,
        lights,
        events,
        stats,
    }
}

/// Publication loop: rebuild and republish the snapshot at a fixed cadence
/// until shutdown.
///
/// `generation` is the run generation this publisher was started for. Reset
/// bumps the shared counter before it writes the empty snapshot, and the
/// recheck below runs under the watch slot's own lock, so a snapshot built
/// for a finished run is dropped instead of overwriting the reset state.
pub(crate) async fn run_publisher(
    shared: Arc<RunShared>,
    snapshot_tx: watch::Sender<SimulationSnapshot>,
    run_gen: Arc<AtomicU64>,
    generation: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!(generation, "snapshot publisher started");
    while !*shutdown.borrow() {
        let snapshot = build_snapshot(&shared, now_ms());
        let delivered = snapshot_tx.send_if_modified(|slot| {
            if run_gen.load(Ordering::SeqCst) != generation {
                return false;
            }
            *slot = snapshot;
            true
        });
        if !delivered {
            break;
        }

        if sleep_or_shutdown(Duration::from_millis(PUBLISH_INTERVAL_MS), &mut shutdown).await {
            break;
        }
    }
    debug!(generation, "snapshot publisher stopped");
}
