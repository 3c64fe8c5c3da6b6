//! `run` command implementation.

use anyhow::Result;
use engine::SimulationCoordinator;
use observability::RunMetricsAggregator;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::commands::load_config;

/// Execute the `run` command
pub async fn run_simulation(args: &RunArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    // Apply CLI overrides
    if let Some(grid_size) = args.grid_size {
        info!(grid_size, "Overriding grid size from CLI");
        config.grid_size = grid_size;
    }
    if let Some(vehicles) = args.vehicles {
        info!(vehicles, "Overriding vehicle count from CLI");
        config.vehicle_count = vehicles;
    }
    if let Some(speed) = args.speed {
        info!(speed, "Overriding simulation speed from CLI");
        config.sim_speed = speed;
    }

    info!(
        grid_size = config.grid_size,
        vehicles = config.vehicle_count,
        ambulances = config.ambulance_count,
        lights = config.lights_enabled,
        auto_events = config.auto_events_enabled,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        config.validate()?;
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    // Metrics endpoint (tracing is already set up by main)
    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let coordinator = SimulationCoordinator::new();
    coordinator.start(config)?;

    info!("Simulation started");

    let mut snapshots = coordinator.snapshot();
    let mut aggregator = RunMetricsAggregator::new();

    let deadline = async {
        if args.duration > 0 {
            tokio::time::sleep(Duration::from_secs(args.duration)).await;
        } else {
            std::future::pending::<()>().await;
        }
    };
    tokio::pin!(deadline);

    let shutdown_signal = setup_shutdown_signal();
    tokio::pin!(shutdown_signal);

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                warn!("Received shutdown signal, stopping simulation...");
                break;
            }
            _ = &mut deadline => {
                info!(duration_secs = args.duration, "Run duration elapsed, stopping");
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                aggregator.update(&snapshots.borrow().stats);
            }
        }
    }

    coordinator.reset();
    println!("{}", aggregator.summary());

    info!("Traffic Grid finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &contracts::SimulationConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Grid: {0}x{0} cells", config.grid_size);
    println!(
        "Fleet: {} vehicles ({} ambulances)",
        config.vehicle_count, config.ambulance_count
    );
    println!(
        "Tick: {}ms base step at {:.1}x speed",
        config.base_step_ms, config.sim_speed
    );
    println!(
        "Lights: {} (green {}ms / yellow {}ms / all-red {}ms)",
        if config.lights_enabled {
            "enabled"
        } else {
            "disabled"
        },
        config.light_green_ms,
        config.light_yellow_ms,
        config.light_all_red_ms
    );
    println!(
        "Collisions: {}",
        if config.collisions_enabled {
            "checked"
        } else {
            "ignored"
        }
    );
    println!(
        "Auto events: {}",
        if config.auto_events_enabled {
            format!("every {}ms", config.event_every_ms)
        } else {
            "disabled".to_string()
        }
    );
    println!();
}
