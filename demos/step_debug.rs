//! Step Debug Demo
//!
//! Drives the simulation one deterministic step at a time and prints the
//! vehicle grid after each step. Useful for inspecting routing behavior.
//!
//! Run with: cargo run --bin step_debug

use std::time::Duration;

use std::sync::Arc;

use contracts::{NullSessionSink, SessionSink, SimulationConfig, SimulationSnapshot};
use engine::SimulationCoordinator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let config = SimulationConfig {
        grid_size: 8,
        vehicle_count: 6,
        ambulance_count: 1,
        lights_enabled: false,
        auto_events_enabled: false,
        ..Default::default()
    };
    let grid_size = config.grid_size;

    // Debug stepping is short-lived; discard the end-of-run session report.
    let coordinator =
        SimulationCoordinator::with_session_sink(Arc::new(NullSessionSink) as Arc<dyn SessionSink>);
    coordinator.start(config)?;
    coordinator.pause();

    for step in 1..=5u32 {
        coordinator.step_once().await;
        // Give the publisher a beat to pick up the new positions.
        tokio::time::sleep(Duration::from_millis(40)).await;

        println!("--- step {step} ---");
        print_grid(&coordinator.latest_snapshot(), grid_size);
    }

    coordinator.reset();
    Ok(())
}

fn print_grid(snapshot: &SimulationSnapshot, grid_size: usize) {
    let mut rows = vec![vec!['.'; grid_size]; grid_size];
    for vehicle in &snapshot.vehicles {
        let x = vehicle.pos.x as usize;
        let y = vehicle.pos.y as usize;
        if x < grid_size && y < grid_size {
            rows[y][x] = match vehicle.kind {
                contracts::VehicleKind::Ambulance => 'A',
                contracts::VehicleKind::Bus => 'B',
                contracts::VehicleKind::Motorcycle => 'M',
                contracts::VehicleKind::Car => 'c',
            };
        }
    }
    for row in rows {
        println!("{}", row.into_iter().collect::<String>());
    }
    println!(
        "moved={} stopped={}",
        snapshot
            .vehicles
            .iter()
            .map(|v| v.moved_cells)
            .sum::<u32>(),
        snapshot.stats.stopped,
    );
}
