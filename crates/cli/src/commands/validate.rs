//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    grid_size: usize,
    vehicle_count: u32,
    ambulance_count: u32,
    lights_enabled: bool,
    auto_events_enabled: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    grid_size: config.grid_size,
                    vehicle_count: config.vehicle_count,
                    ambulance_count: config.ambulance_count,
                    lights_enabled: config.lights_enabled,
                    auto_events_enabled: config.auto_events_enabled,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &contracts::SimulationConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.lights_enabled {
        warnings.push("Traffic lights disabled - intersections are uncontrolled".to_string());
    }

    if !config.collisions_enabled {
        warnings.push("Collision checks disabled - vehicles may share cells".to_string());
    }

    if config.ambulance_count == 0 {
        warnings.push("No ambulances in the fleet - emergency events still add one".to_string());
    }

    if !config.auto_events_enabled {
        warnings.push("Automatic events disabled - only manual triggers fire".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Grid: {0}x{0}", summary.grid_size);
            println!("  Vehicles: {}", summary.vehicle_count);
            println!("  Ambulances: {}", summary.ambulance_count);
            println!("  Lights: {}", summary.lights_enabled);
            println!("  Auto events: {}", summary.auto_events_enabled);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args_for(path: &std::path::Path) -> ValidateArgs {
        ValidateArgs {
            config: path.to_path_buf(),
            json: false,
        }
    }

    #[test]
    fn test_validate_missing_file() {
        let result = validate_config(&args_for(std::path::Path::new("no-such-file.toml")));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }

    #[test]
    fn test_validate_good_config() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "grid_size = 12\nvehicle_count = 20").unwrap();

        let result = validate_config(&args_for(file.path()));
        assert!(result.valid, "{:?}", result.error);
        let summary = result.summary.unwrap();
        assert_eq!(summary.grid_size, 12);
        assert_eq!(summary.vehicle_count, 20);
    }

    #[test]
    fn test_validate_zero_grid_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "grid_size = 0").unwrap();

        let result = validate_config(&args_for(file.path()));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("grid size"));
    }

    #[test]
    fn test_warnings_for_disabled_subsystems() {
        let config = contracts::SimulationConfig {
            lights_enabled: false,
            collisions_enabled: false,
            ..Default::default()
        };
        let warnings = collect_warnings(&config);
        assert_eq!(warnings.len(), 2);
    }
}
