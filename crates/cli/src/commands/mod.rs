//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_simulation;
pub use validate::run_validate;

use anyhow::{Context, Result};
use contracts::SimulationConfig;
use std::path::Path;

/// Load a configuration file, or defaults when no path is given.
fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        None => Ok(SimulationConfig::default()),
    }
}
