//! Published simulation snapshot.

use serde::{Deserialize, Serialize};

use crate::{SimulationEvent, TrafficLightView, VehicleState, VehicleStatus};

/// Aggregate statistics over all live actors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    pub active_vehicles: usize,
    pub moving: usize,
    pub stopped: usize,
    pub arrived: usize,
    /// Cells per second, 0 when no simulated time has elapsed.
    pub avg_speed_cells_per_sec: f64,
    pub total_wait_ms: u64,
    pub collisions_avoided: u64,
    pub sim_time_ms: u64,
    pub active_events: usize,
}

/// Immutable point-in-time aggregate of all simulation state.
///
/// Recomputed wholesale on each publication cycle; never partially mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub grid_size: usize,
    pub vehicles: Vec<VehicleState>,
    pub lights: Vec<TrafficLightView>,
    pub events: Vec<SimulationEvent>,
    pub stats: SimulationStats,
}

impl SimulationSnapshot {
    pub fn empty() -> Self {
        Self {
            grid_size: 10,
            vehicles: Vec::new(),
            lights: Vec::new(),
            events: Vec::new(),
            stats: SimulationStats::default(),
        }
    }

    /// Compute aggregate stats from gathered actor state.
    pub fn aggregate(
        vehicles: &[VehicleState],
        collisions_avoided: u64,
        sim_time_ms: u64,
        active_events: usize,
    ) -> SimulationStats {
        let moving = vehicles
            .iter()
            .filter(|v| v.status == VehicleStatus::Moving)
            .count();
        let stopped = vehicles
            .iter()
            .filter(|v| v.status == VehicleStatus::Stopped)
            .count();
        let arrived = vehicles
            .iter()
            .filter(|v| v.status == VehicleStatus::Arrived)
            .count();

        let total_moved: u64 = vehicles.iter().map(|v| v.moved_cells as u64).sum();
        let total_wait_ms: u64 = vehicles.iter().map(|v| v.wait_ms).sum();

        let avg_speed_cells_per_sec = if sim_time_ms > 0 {
            total_moved as f64 / (sim_time_ms as f64 / 1000.0)
        } else {
            0.0
        };

        SimulationStats {
            active_vehicles: vehicles.len(),
            moving,
            stopped,
            arrived,
            avg_speed_cells_per_sec,
            total_wait_ms,
            collisions_avoided,
            sim_time_ms,
            active_events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GridPos, VehicleKind};

    fn vehicle(id: u32, status: VehicleStatus, moved: u32, wait: u64) -> VehicleState {
        VehicleState {
            id,
            kind: VehicleKind::Car,
            pos: GridPos::new(0, 0),
            dest: GridPos::new(1, 1),
            status,
            color_argb: VehicleKind::Car.color_argb(),
            render_size: VehicleKind::Car.render_size(),
            moved_cells: moved,
            wait_ms: wait,
        }
    }

    #[test]
    fn test_avg_speed_zero_when_no_elapsed_time() {
        let vehicles = vec![vehicle(1, VehicleStatus::Moving, 100, 0)];
        let stats = SimulationSnapshot::aggregate(&vehicles, 0, 0, 0);
        assert_eq!(stats.avg_speed_cells_per_sec, 0.0);
    }

    #[test]
    fn test_avg_speed_is_cells_over_seconds() {
        let vehicles = vec![
            vehicle(1, VehicleStatus::Moving, 30, 0),
            vehicle(2, VehicleStatus::Stopped, 10, 120),
        ];
        let stats = SimulationSnapshot::aggregate(&vehicles, 3, 4_000, 1);
        assert_eq!(stats.avg_speed_cells_per_sec, 10.0);
        assert_eq!(stats.total_wait_ms, 120);
        assert_eq!(stats.collisions_avoided, 3);
        assert_eq!(stats.active_events, 1);
    }

    #[test]
    fn test_status_counts() {
        let vehicles = vec![
            vehicle(1, VehicleStatus::Moving, 0, 0),
            vehicle(2, VehicleStatus::Moving, 0, 0),
            vehicle(3, VehicleStatus::Stopped, 0, 0),
            vehicle(4, VehicleStatus::Arrived, 0, 0),
        ];
        let stats = SimulationSnapshot::aggregate(&vehicles, 0, 1_000, 0);
        assert_eq!(stats.active_vehicles, 4);
        assert_eq!(stats.moving, 2);
        assert_eq!(stats.stopped, 1);
        assert_eq!(stats.arrived, 1);
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = SimulationSnapshot::empty();
        assert!(snap.vehicles.is_empty());
        assert_eq!(snap.stats, SimulationStats::default());
    }
}
