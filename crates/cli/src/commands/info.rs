//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::commands::load_config;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    grid: GridInfo,
    fleet: FleetInfo,
    lights: LightsInfo,
    events: EventsInfo,
}

#[derive(Serialize)]
struct GridInfo {
    size: usize,
    cells: usize,
}

#[derive(Serialize)]
struct FleetInfo {
    vehicle_count: u32,
    ambulance_count: u32,
    base_step_ms: u64,
    sim_speed: f64,
    collisions_enabled: bool,
}

#[derive(Serialize)]
struct LightsInfo {
    enabled: bool,
    green_ms: u64,
    yellow_ms: u64,
    all_red_ms: u64,
}

#[derive(Serialize)]
struct EventsInfo {
    auto_enabled: bool,
    every_ms: u64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    if let Some(ref path) = args.config {
        info!(config = %path.display(), "Loading configuration info");
    }

    let config = load_config(args.config.as_deref())?;

    if args.json {
        let info = build_config_info(&config);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else if args.toml {
        let toml = config_loader::ConfigLoader::to_toml(&config)
            .context("Failed to serialize config as TOML")?;
        println!("{}", toml);
    } else {
        print_config_info(&config);
    }

    Ok(())
}

fn build_config_info(config: &contracts::SimulationConfig) -> ConfigInfo {
    ConfigInfo {
        grid: GridInfo {
            size: config.grid_size,
            cells: config.grid_size * config.grid_size,
        },
        fleet: FleetInfo {
            vehicle_count: config.vehicle_count,
            ambulance_count: config.ambulance_count,
            base_step_ms: config.base_step_ms,
            sim_speed: config.sim_speed,
            collisions_enabled: config.collisions_enabled,
        },
        lights: LightsInfo {
            enabled: config.lights_enabled,
            green_ms: config.light_green_ms,
            yellow_ms: config.light_yellow_ms,
            all_red_ms: config.light_all_red_ms,
        },
        events: EventsInfo {
            auto_enabled: config.auto_events_enabled,
            every_ms: config.event_every_ms,
        },
    }
}

fn print_config_info(config: &contracts::SimulationConfig) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Traffic Grid Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🗺  Grid");
    println!("   ├─ Side: {}", config.grid_size);
    println!("   └─ Cells: {}", config.grid_size * config.grid_size);

    println!("\n🚗 Fleet");
    println!("   ├─ Vehicles: {}", config.vehicle_count);
    println!("   ├─ Ambulances: {}", config.ambulance_count);
    println!("   ├─ Base step: {}ms", config.base_step_ms);
    println!("   ├─ Speed: {:.1}x", config.sim_speed);
    println!(
        "   └─ Collisions: {}",
        if config.collisions_enabled {
            "checked"
        } else {
            "ignored"
        }
    );

    println!("\n🚦 Lights");
    if config.lights_enabled {
        println!("   ├─ Green: {}ms", config.light_green_ms);
        println!("   ├─ Yellow: {}ms", config.light_yellow_ms);
        println!("   └─ All-red: {}ms", config.light_all_red_ms);
    } else {
        println!("   └─ Disabled");
    }

    println!("\n⚡ Events");
    if config.auto_events_enabled {
        println!("   └─ Automatic, every {}ms", config.event_every_ms);
    } else {
        println!("   └─ Manual triggers only");
    }

    println!();
}
