//! Simulation configuration.
//!
//! Immutable per run; changing it requires a full restart. Out-of-range
//! values are clamped rather than rejected, except a non-positive grid size
//! which is the one fatal validation error.

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Clamp ranges applied by [`SimulationConfig::clamped`].
pub const VEHICLE_COUNT_RANGE: (u32, u32) = (5, 100);
pub const SIM_SPEED_RANGE: (f64, f64) = (0.5, 5.0);
pub const LIGHT_GREEN_RANGE_MS: (u64, u64) = (3_000, 30_000);
pub const AUTO_EVENT_RANGE_MS: (u64, u64) = (4_000, 60_000);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Grid side length; the world has `grid_size * grid_size` cells.
    pub grid_size: usize,
    /// Total vehicles spawned at start.
    pub vehicle_count: u32,
    /// How many of those are ambulances (spawned first).
    pub ambulance_count: u32,
    /// Base per-tick interval before speed scaling.
    pub base_step_ms: u64,
    /// Global speed multiplier.
    pub sim_speed: f64,

    pub light_green_ms: u64,
    pub light_yellow_ms: u64,
    pub light_all_red_ms: u64,

    pub lights_enabled: bool,
    pub collisions_enabled: bool,

    pub auto_events_enabled: bool,
    /// Interval between automatically generated events.
    pub event_every_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_size: 10,
            vehicle_count: 30,
            ambulance_count: 2,
            base_step_ms: 140,
            sim_speed: 1.0,
            light_green_ms: 8_000,
            light_yellow_ms: 1_500,
            light_all_red_ms: 600,
            lights_enabled: true,
            collisions_enabled: true,
            auto_events_enabled: true,
            event_every_ms: 12_000,
        }
    }
}

impl SimulationConfig {
    /// Check the one fatal precondition: a usable grid.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.grid_size == 0 {
            return Err(EngineError::InvalidGridSize {
                size: self.grid_size as i64,
            });
        }
        Ok(())
    }

    /// Return a copy with every tunable forced into its legal range.
    pub fn clamped(&self) -> Self {
        let vehicle_count = self
            .vehicle_count
            .clamp(VEHICLE_COUNT_RANGE.0, VEHICLE_COUNT_RANGE.1);
        Self {
            vehicle_count,
            ambulance_count: self.ambulance_count.min(vehicle_count),
            sim_speed: self.sim_speed.clamp(SIM_SPEED_RANGE.0, SIM_SPEED_RANGE.1),
            light_green_ms: self
                .light_green_ms
                .clamp(LIGHT_GREEN_RANGE_MS.0, LIGHT_GREEN_RANGE_MS.1),
            event_every_ms: self
                .event_every_ms
                .clamp(AUTO_EVENT_RANGE_MS.0, AUTO_EVENT_RANGE_MS.1),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.grid_size, 10);
        assert_eq!(config.vehicle_count, 30);
        assert_eq!(config.base_step_ms, 140);
        assert!(config.lights_enabled);
    }

    #[test]
    fn test_validate_rejects_zero_grid() {
        let config = SimulationConfig {
            grid_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_clamped_ranges() {
        let config = SimulationConfig {
            vehicle_count: 500,
            ambulance_count: 400,
            sim_speed: 9.0,
            light_green_ms: 100,
            event_every_ms: 1,
            ..Default::default()
        };
        let clamped = config.clamped();
        assert_eq!(clamped.vehicle_count, 100);
        assert_eq!(clamped.ambulance_count, 100);
        assert_eq!(clamped.sim_speed, 5.0);
        assert_eq!(clamped.light_green_ms, 3_000);
        assert_eq!(clamped.event_every_ms, 4_000);
    }

    #[test]
    fn test_clamped_ambulances_bounded_by_vehicles() {
        let config = SimulationConfig {
            vehicle_count: 10,
            ambulance_count: 20,
            ..Default::default()
        };
        assert_eq!(config.clamped().ambulance_count, 10);
    }

    #[test]
    fn test_in_range_values_untouched() {
        let config = SimulationConfig::default();
        assert_eq!(config.clamped(), config);
    }
}
