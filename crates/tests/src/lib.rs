//! # Integration Tests
//!
//! End-to-end tests across the workspace crates.
//!
//! Covers:
//! - Config file to running simulation
//! - Event injection and cell blocking
//! - Priority passage at lights
//! - Lifecycle transitions under load

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_default_config_is_valid() {
        let config = contracts::SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.clamped(), config);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{EventKind, GridPos, SimulationConfig, VehicleKind};
    use engine::SimulationCoordinator;
    use events::{EventManager, EVENT_CHANNEL_CAPACITY};
    use occupancy::{BlockedCells, GridOccupancy};
    use tokio::sync::broadcast;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            grid_size: 10,
            vehicle_count: 10,
            ambulance_count: 1,
            auto_events_enabled: false,
            ..Default::default()
        }
    }

    /// Wait for a snapshot matching `predicate`, or panic after `secs`.
    async fn wait_for_snapshot<F>(
        coordinator: &SimulationCoordinator,
        secs: u64,
        mut predicate: F,
    ) -> contracts::SimulationSnapshot
    where
        F: FnMut(&contracts::SimulationSnapshot) -> bool,
    {
        let mut rx = coordinator.snapshot();
        tokio::time::timeout(Duration::from_secs(secs), async {
            loop {
                rx.changed().await.expect("snapshot channel closed");
                let snap = rx.borrow().clone();
                if predicate(&snap) {
                    break snap;
                }
            }
        })
        .await
        .expect("snapshot condition never met")
    }

    /// Full run: configuration in, moving fleet out, clean reset.
    #[tokio::test]
    async fn test_e2e_simulation_runs_and_moves() {
        let coordinator = SimulationCoordinator::new();
        coordinator.start(small_config()).unwrap();

        let snapshot = wait_for_snapshot(&coordinator, 5, |snap| {
            snap.vehicles.iter().map(|v| v.moved_cells).sum::<u32>() > 0
        })
        .await;

        assert_eq!(snapshot.vehicles.len(), 10);
        assert_eq!(snapshot.lights.len(), 8);
        assert!(snapshot.stats.sim_time_ms > 0);

        coordinator.reset();
        assert!(coordinator.latest_snapshot().vehicles.is_empty());
    }

    /// Config file content drives the run.
    #[tokio::test]
    async fn test_e2e_config_to_simulation() {
        let content = r#"
grid_size = 6
vehicle_count = 6
ambulance_count = 0
auto_events_enabled = false
"#;
        let config = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();
        let coordinator = SimulationCoordinator::new();
        coordinator.start(config).unwrap();

        let snapshot = wait_for_snapshot(&coordinator, 5, |snap| !snap.vehicles.is_empty()).await;
        assert_eq!(snapshot.grid_size, 6);
        assert_eq!(snapshot.vehicles.len(), 6);
        // A 6x6 grid keeps only the four light positions inside bounds.
        assert_eq!(snapshot.lights.len(), 4);

        coordinator.reset();
    }

    /// Roadworks close their cell for the whole block duration.
    #[tokio::test]
    async fn test_e2e_roadworks_blocks_target_cell() {
        let blocked = Arc::new(BlockedCells::new());
        let grid = GridOccupancy::new(10, true, Arc::clone(&blocked));
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let manager = EventManager::new(10, blocked, tx);

        manager.trigger_roadworks();

        let events = manager.active_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Roadworks);
        let site = events[0].pos.expect("roadworks must have a position");

        let from = if site.y > 0 {
            GridPos::new(site.x, site.y - 1)
        } else {
            GridPos::new(site.x, site.y + 1)
        };
        grid.occupy(from.key(10), 1);

        let during = events[0].start_ms + 1;
        assert!(!grid.try_move(1, from, site, false, None, during).await);

        let after = events[0].end_ms();
        assert!(grid.try_move(1, from, site, false, None, after).await);
    }

    /// An ambulance held at a red light forces its axis green within one
    /// rotation.
    #[tokio::test]
    async fn test_e2e_ambulance_forces_green() {
        use actors::TrafficLightActor;
        use contracts::IntersectionSignal;
        use tokio::sync::watch;

        let light = Arc::new(TrafficLightActor::new(1, GridPos::new(5, 5), 30, 5, 0));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(Arc::clone(&light).run(shutdown_rx));

        let grid = GridOccupancy::new(10, true, Arc::new(BlockedCells::new()));
        let from = GridPos::new(4, 5);
        let to = GridPos::new(5, 5);
        grid.occupy(from.key(10), 1);

        // Keep attempting the EW crossing as a priority vehicle; the first
        // attempt files the override, a following rotation serves it.
        let crossed = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let signal: &dyn IntersectionSignal = light.as_ref();
                if grid.try_move(1, from, to, true, Some(signal), 0).await {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;

        shutdown_tx.send(true).unwrap();
        assert!(crossed.is_ok(), "priority vehicle never crossed");
        assert_eq!(grid.vehicle_at(to.key(10)), Some(1));
    }

    /// Manual triggers surface on both the event stream and the snapshot.
    #[tokio::test]
    async fn test_e2e_accident_reaches_snapshot_and_stream() {
        let coordinator = SimulationCoordinator::new();
        let mut events = coordinator.subscribe_events();
        coordinator.start(small_config()).unwrap();

        // Wait until the fleet exists so the accident lands on a vehicle.
        wait_for_snapshot(&coordinator, 5, |snap| !snap.vehicles.is_empty()).await;

        coordinator.trigger_accident();

        let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("no event broadcast")
            .unwrap();
        assert_eq!(event.kind, EventKind::Accident);
        assert!(event.pos.is_some());

        let snapshot = wait_for_snapshot(&coordinator, 5, |snap| !snap.events.is_empty()).await;
        assert_eq!(snapshot.events[0].kind, EventKind::Accident);
        assert_eq!(snapshot.stats.active_events, 1);

        coordinator.reset();
    }

    /// Congestion grows the fleet; emergency adds exactly one ambulance.
    #[tokio::test]
    async fn test_e2e_events_grow_fleet() {
        let coordinator = SimulationCoordinator::new();
        coordinator.start(small_config()).unwrap();
        wait_for_snapshot(&coordinator, 5, |snap| snap.vehicles.len() == 10).await;

        coordinator.trigger_congestion();
        wait_for_snapshot(&coordinator, 5, |snap| snap.vehicles.len() == 18).await;

        coordinator.trigger_emergency();
        let snapshot =
            wait_for_snapshot(&coordinator, 5, |snap| snap.vehicles.len() == 19).await;

        let ambulances = snapshot
            .vehicles
            .iter()
            .filter(|v| v.kind == VehicleKind::Ambulance)
            .count();
        assert!(ambulances >= 2);

        coordinator.reset();
    }

    /// Pause halts movement; stepping advances each vehicle at most one cell.
    #[tokio::test]
    async fn test_e2e_pause_and_step() {
        let coordinator = SimulationCoordinator::new();
        coordinator
            .start(SimulationConfig {
                lights_enabled: false,
                ..small_config()
            })
            .unwrap();
        coordinator.pause();
        assert!(!coordinator.is_running());

        coordinator.step_once().await;

        let snapshot = wait_for_snapshot(&coordinator, 5, |snap| {
            snap.vehicles.iter().map(|v| v.moved_cells).sum::<u32>() > 0
        })
        .await;
        let total: u32 = snapshot.vehicles.iter().map(|v| v.moved_cells).sum();
        assert!(total <= 10, "paused fleet moved more than one step");

        coordinator.reset();
    }

    /// The stats aggregator folds the live snapshot stream.
    #[tokio::test]
    async fn test_e2e_metrics_aggregation() {
        let coordinator = SimulationCoordinator::new();
        coordinator.start(small_config()).unwrap();

        let mut rx = coordinator.snapshot();
        let mut aggregator = observability::RunMetricsAggregator::new();
        for _ in 0..5 {
            tokio::time::timeout(Duration::from_secs(2), rx.changed())
                .await
                .expect("publisher stalled")
                .unwrap();
            aggregator.update(&rx.borrow().stats);
        }

        let summary = aggregator.summary();
        assert_eq!(summary.snapshots, 5);
        assert_eq!(summary.final_vehicles, 10);
        assert!(format!("{summary}").contains("Final fleet size: 10"));

        coordinator.reset();
    }

    /// A saturated tiny grid keeps publishing; contention never deadlocks.
    #[tokio::test]
    async fn test_e2e_tiny_grid_contention() {
        let coordinator = SimulationCoordinator::new();
        coordinator
            .start(SimulationConfig {
                grid_size: 3,
                vehicle_count: 5,
                ambulance_count: 0,
                auto_events_enabled: false,
                lights_enabled: false,
                ..Default::default()
            })
            .unwrap();

        tokio::time::sleep(Duration::from_millis(400)).await;

        // The publisher must still be alive and reporting the full fleet.
        let snapshot = wait_for_snapshot(&coordinator, 5, |snap| snap.vehicles.len() == 5).await;
        assert_eq!(snapshot.grid_size, 3);

        coordinator.reset();
    }
}
