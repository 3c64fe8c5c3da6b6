//! Headless Run Demo
//!
//! Starts a simulation, watches the snapshot stream, injects a couple of
//! street events and prints aggregate statistics once per second.
//!
//! Run with: cargo run --bin headless_run [config.toml]

use std::time::Duration;

use config_loader::ConfigLoader;
use contracts::SimulationConfig;
use engine::SimulationCoordinator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting Headless Run Demo");

    let config = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading configuration");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        SimulationConfig {
            vehicle_count: 20,
            auto_events_enabled: false,
            ..Default::default()
        }
    };

    let coordinator = SimulationCoordinator::new();
    let mut events = coordinator.subscribe_events();
    coordinator.start(config)?;

    // Report any event notifications as they arrive.
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::info!(kind = ?event.kind, message = %event.message, "event");
        }
    });

    let mut snapshots = coordinator.snapshot();

    // Let the fleet settle, then stir things up.
    tokio::time::sleep(Duration::from_secs(2)).await;
    coordinator.trigger_roadworks();
    coordinator.trigger_congestion();

    for second in 1..=10u32 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let stats = snapshots.borrow_and_update().stats.clone();
        println!(
            "t={second:>2}s vehicles={:>3} moving={:>3} stopped={:>3} \
             avg_speed={:>5.2} collisions_avoided={:>4} events={}",
            stats.active_vehicles,
            stats.moving,
            stats.stopped,
            stats.avg_speed_cells_per_sec,
            stats.collisions_avoided,
            stats.active_events,
        );
    }

    coordinator.reset();
    tracing::info!("Demo finished");
    Ok(())
}
