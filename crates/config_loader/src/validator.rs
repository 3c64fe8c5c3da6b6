//! Configuration validation.
//!
//! Only an unusable grid is fatal. Every other out-of-range tunable is
//! clamped into its legal range, with a log note per adjustment so a
//! surprising effective value can be traced back to its source.

use contracts::{
    EngineError, SimulationConfig, AUTO_EVENT_RANGE_MS, LIGHT_GREEN_RANGE_MS, SIM_SPEED_RANGE,
    VEHICLE_COUNT_RANGE,
};
use tracing::debug;

/// Validate the fatal preconditions of a configuration
pub fn validate(config: &SimulationConfig) -> Result<(), EngineError> {
    config.validate()
}

/// Return the effective configuration, logging every clamped field
pub fn apply_limits(config: &SimulationConfig) -> SimulationConfig {
    let effective = config.clamped();

    if effective.vehicle_count != config.vehicle_count {
        debug!(
            requested = config.vehicle_count,
            effective = effective.vehicle_count,
            range = ?VEHICLE_COUNT_RANGE,
            "vehicle_count clamped"
        );
    }
    if effective.ambulance_count != config.ambulance_count {
        debug!(
            requested = config.ambulance_count,
            effective = effective.ambulance_count,
            "ambulance_count limited to fleet size"
        );
    }
    if effective.sim_speed != config.sim_speed {
        debug!(
            requested = config.sim_speed,
            effective = effective.sim_speed,
            range = ?SIM_SPEED_RANGE,
            "sim_speed clamped"
        );
    }
    if effective.light_green_ms != config.light_green_ms {
        debug!(
            requested = config.light_green_ms,
            effective = effective.light_green_ms,
            range = ?LIGHT_GREEN_RANGE_MS,
            "light_green_ms clamped"
        );
    }
    if effective.event_every_ms != config.event_every_ms {
        debug!(
            requested = config.event_every_ms,
            effective = effective.event_every_ms,
            range = ?AUTO_EVENT_RANGE_MS,
            "event_every_ms clamped"
        );
    }

    effective
}
