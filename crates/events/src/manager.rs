//! Event manager: creates, blocks, broadcasts and expires events.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use contracts::{now_ms, EventKind, EventTargets, GridPos, SimulationEvent, VehicleKind};
use occupancy::BlockedCells;
use parking_lot::Mutex;
use rand::Rng;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Notification channel depth; lagging subscribers lose the oldest entries.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Fixed durations per trigger kind.
const ACCIDENT_BLOCK_MS: u64 = 6_000;
const ROADWORKS_BLOCK_MS: u64 = 15_000;
const CONGESTION_NOTICE_MS: u64 = 8_000;
const EMERGENCY_NOTICE_MS: u64 = 5_000;

/// Vehicles added by one congestion surge.
const CONGESTION_BATCH: usize = 8;

/// Attempt budget when looking for a non-blocked roadworks cell.
const ROADWORKS_SEARCH_BUDGET: usize = 300;

/// Per-run event state: the active set, the blocked-cell registry handle
/// and the notification fan-out.
pub struct EventManager {
    grid_size: usize,
    blocked: Arc<BlockedCells>,
    active: Mutex<HashMap<u64, SimulationEvent>>,
    next_id: AtomicU64,
    notifications: broadcast::Sender<SimulationEvent>,
}

impl EventManager {
    pub fn new(
        grid_size: usize,
        blocked: Arc<BlockedCells>,
        notifications: broadcast::Sender<SimulationEvent>,
    ) -> Self {
        Self {
            grid_size,
            blocked,
            active: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            notifications,
        }
    }

    /// Fire one event of the given kind.
    pub fn trigger(&self, kind: EventKind, targets: &dyn EventTargets) {
        match kind {
            EventKind::Accident => self.trigger_accident(targets),
            EventKind::Roadworks => self.trigger_roadworks(),
            EventKind::Congestion => self.trigger_congestion(targets),
            EventKind::Emergency => self.trigger_emergency(targets),
        }
    }

    /// Accident: blocks the cell under a random vehicle.
    pub fn trigger_accident(&self, targets: &dyn EventTargets) {
        let pos = targets
            .random_vehicle_position()
            .unwrap_or_else(|| self.random_cell());
        let message = format!(
            "Accident at ({}, {}) - street blocked for {}s",
            pos.x,
            pos.y,
            ACCIDENT_BLOCK_MS / 1000
        );
        self.create_blocking(EventKind::Accident, pos, ACCIDENT_BLOCK_MS, message);
    }

    /// Roadworks: blocks a random cell that is not already blocked.
    pub fn trigger_roadworks(&self) {
        let pos = self.random_unblocked_cell();
        let message = format!(
            "Roadworks at ({}, {}) - street closed for {}s",
            pos.x,
            pos.y,
            ROADWORKS_BLOCK_MS / 1000
        );
        self.create_blocking(EventKind::Roadworks, pos, ROADWORKS_BLOCK_MS, message);
    }

    /// Congestion surge: a batch of extra random-kind vehicles, city-wide.
    pub fn trigger_congestion(&self, targets: &dyn EventTargets) {
        let mut rng = rand::rng();
        for _ in 0..CONGESTION_BATCH {
            let kind = VehicleKind::ALL[rng.random_range(0..VehicleKind::ALL.len())];
            targets.spawn_vehicle(kind);
        }
        let message = format!("Congestion: {CONGESTION_BATCH} new vehicles on the road");
        self.create_non_blocking(EventKind::Congestion, None, CONGESTION_NOTICE_MS, message);
    }

    /// Emergency: one priority ambulance, city-wide.
    pub fn trigger_emergency(&self, targets: &dyn EventTargets) {
        targets.spawn_vehicle(VehicleKind::Ambulance);
        let message = "Emergency: ambulance dispatched with priority".to_string();
        self.create_non_blocking(EventKind::Emergency, None, EMERGENCY_NOTICE_MS, message);
    }

    /// Drop every event and cell block whose expiry has passed.
    pub fn purge_expired(&self, now_ms: u64) {
        self.active.lock().retain(|_, event| !event.expired(now_ms));
        self.blocked.purge_expired(now_ms);
    }

    pub fn active_events(&self) -> Vec<SimulationEvent> {
        let mut events: Vec<_> = self.active.lock().values().cloned().collect();
        events.sort_by_key(|e| e.id);
        events
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    fn create_blocking(&self, kind: EventKind, pos: GridPos, duration_ms: u64, message: String) {
        let event = self.register(kind, Some(pos), duration_ms, message);
        self.blocked.block(pos.key(self.grid_size), event.end_ms());
        self.publish(event);
    }

    fn create_non_blocking(
        &self,
        kind: EventKind,
        pos: Option<GridPos>,
        duration_ms: u64,
        message: String,
    ) {
        let event = self.register(kind, pos, duration_ms, message);
        self.publish(event);
    }

    fn register(
        &self,
        kind: EventKind,
        pos: Option<GridPos>,
        duration_ms: u64,
        message: String,
    ) -> SimulationEvent {
        let event = SimulationEvent {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            kind,
            pos,
            start_ms: now_ms(),
            duration_ms,
            message,
        };
        self.active.lock().insert(event.id, event.clone());
        event
    }

    fn publish(&self, event: SimulationEvent) {
        info!(
            event_id = event.id,
            kind = ?event.kind,
            pos = ?event.pos,
            duration_ms = event.duration_ms,
            "event triggered"
        );
        metrics::counter!("sim_events_total", "kind" => format!("{:?}", event.kind))
            .increment(1);
        // No subscribers is fine; notifications are best-effort.
        let _ = self.notifications.send(event);
    }

    fn random_cell(&self) -> GridPos {
        let size = self.grid_size as i32;
        let mut rng = rand::rng();
        GridPos::new(rng.random_range(0..size), rng.random_range(0..size))
    }

    /// Bounded random search for a cell without an active block; falls back
    /// to the origin when the budget runs out.
    fn random_unblocked_cell(&self) -> GridPos {
        let now = now_ms();
        for _ in 0..ROADWORKS_SEARCH_BUDGET {
            let pos = self.random_cell();
            if !self.blocked.is_blocked(pos.key(self.grid_size), now) {
                return pos;
            }
        }
        warn!("no unblocked cell found within budget, falling back to origin");
        GridPos::new(0, 0)
    }
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventManager")
            .field("grid_size", &self.grid_size)
            .field("active", &self.active_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct StubTargets {
        vehicle_pos: Option<GridPos>,
        spawned: Mutex<Vec<VehicleKind>>,
        spawn_count: AtomicUsize,
    }

    impl EventTargets for StubTargets {
        fn random_vehicle_position(&self) -> Option<GridPos> {
            self.vehicle_pos
        }

        fn spawn_vehicle(&self, kind: VehicleKind) {
            self.spawned.lock().push(kind);
            self.spawn_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn manager() -> (EventManager, Arc<BlockedCells>, broadcast::Receiver<SimulationEvent>) {
        let blocked = Arc::new(BlockedCells::new());
        let (tx, rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        (EventManager::new(10, Arc::clone(&blocked), tx), blocked, rx)
    }

    #[test]
    fn test_accident_blocks_vehicle_cell() {
        let (manager, blocked, mut rx) = manager();
        let targets = StubTargets {
            vehicle_pos: Some(GridPos::new(4, 6)),
            ..Default::default()
        };

        manager.trigger_accident(&targets);

        assert!(blocked.is_blocked(GridPos::new(4, 6).key(10), now_ms()));
        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, EventKind::Accident);
        assert_eq!(event.pos, Some(GridPos::new(4, 6)));
        assert_eq!(event.duration_ms, ACCIDENT_BLOCK_MS);
        assert_eq!(event.end_ms(), event.start_ms + ACCIDENT_BLOCK_MS);
    }

    #[test]
    fn test_roadworks_blocks_unblocked_cell() {
        let (manager, blocked, mut rx) = manager();

        manager.trigger_roadworks();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, EventKind::Roadworks);
        assert_eq!(event.duration_ms, ROADWORKS_BLOCK_MS);
        let pos = event.pos.unwrap();
        assert!(pos.in_bounds(10));
        assert!(blocked.is_blocked(pos.key(10), now_ms()));
    }

    #[test]
    fn test_congestion_spawns_batch() {
        let (manager, _blocked, mut rx) = manager();
        let targets = StubTargets::default();

        manager.trigger_congestion(&targets);

        assert_eq!(targets.spawn_count.load(Ordering::Relaxed), CONGESTION_BATCH);
        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, EventKind::Congestion);
        assert_eq!(event.pos, None);
    }

    #[test]
    fn test_emergency_spawns_one_ambulance() {
        let (manager, _blocked, mut rx) = manager();
        let targets = StubTargets::default();

        manager.trigger_emergency(&targets);

        assert_eq!(*targets.spawned.lock(), vec![VehicleKind::Ambulance]);
        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, EventKind::Emergency);
        assert_eq!(event.pos, None);
    }

    #[test]
    fn test_event_ids_monotonic() {
        let (manager, _blocked, _rx) = manager();
        let targets = StubTargets::default();

        manager.trigger_emergency(&targets);
        manager.trigger_emergency(&targets);
        manager.trigger_roadworks();

        let ids: Vec<u64> = manager.active_events().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_purge_expired_removes_events_and_blocks() {
        let (manager, blocked, _rx) = manager();
        let targets = StubTargets {
            vehicle_pos: Some(GridPos::new(1, 1)),
            ..Default::default()
        };

        manager.trigger_accident(&targets);
        assert_eq!(manager.active_count(), 1);

        let far_future = now_ms() + ACCIDENT_BLOCK_MS + 1;
        manager.purge_expired(far_future);
        assert_eq!(manager.active_count(), 0);
        assert!(blocked.is_empty());
    }

    #[test]
    fn test_purge_keeps_live_events() {
        let (manager, _blocked, _rx) = manager();
        manager.trigger_roadworks();

        manager.purge_expired(now_ms());
        assert_eq!(manager.active_count(), 1);
    }

    #[test]
    fn test_roadworks_fallback_when_everything_blocked() {
        let blocked = Arc::new(BlockedCells::new());
        let (tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        // 2x2 grid, all cells blocked far into the future.
        let manager = EventManager::new(2, Arc::clone(&blocked), tx);
        let expiry = now_ms() + 60_000;
        for key in 0..4 {
            blocked.block(key, expiry);
        }

        manager.trigger_roadworks();

        let event = &manager.active_events()[0];
        assert_eq!(event.pos, Some(GridPos::new(0, 0)));
    }
}
