//! Background auto-event generator.

use std::sync::Arc;
use std::time::Duration;

use actors::{sleep_or_shutdown, RunControls};
use contracts::{EventKind, EventTargets, AUTO_EVENT_RANGE_MS};
use rand::Rng;
use tokio::sync::watch;
use tracing::debug;

use crate::EventManager;

const KINDS: [EventKind; 4] = [
    EventKind::Accident,
    EventKind::Roadworks,
    EventKind::Congestion,
    EventKind::Emergency,
];

/// Periodically fire a random event while the simulation is running.
///
/// Sleeps `interval_ms` (clamped to the legal range) between attempts;
/// ticks that land while paused are skipped, not deferred.
pub async fn run_auto_generator(
    manager: Arc<EventManager>,
    targets: Arc<dyn EventTargets>,
    controls: Arc<RunControls>,
    interval_ms: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    let interval = interval_ms.clamp(AUTO_EVENT_RANGE_MS.0, AUTO_EVENT_RANGE_MS.1);
    debug!(interval_ms = interval, "auto-event generator started");

    while !*shutdown.borrow() {
        if sleep_or_shutdown(Duration::from_millis(interval), &mut shutdown).await {
            break;
        }
        if !controls.is_running() {
            continue;
        }

        let kind = {
            let mut rng = rand::rng();
            KINDS[rng.random_range(0..KINDS.len())]
        };
        manager.trigger(kind, targets.as_ref());
    }

    debug!("auto-event generator stopped");
}
