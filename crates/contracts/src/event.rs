//! Transient disruptive events.

use serde::{Deserialize, Serialize};

use crate::{GridPos, VehicleKind};

/// Disruptive event category.
///
/// Accident and roadworks block a cell for their duration; congestion and
/// emergency only spawn vehicles and notify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Accident,
    Roadworks,
    Congestion,
    Emergency,
}

impl EventKind {
    pub fn blocks_cell(&self) -> bool {
        matches!(self, EventKind::Accident | EventKind::Roadworks)
    }
}

/// A live disruptive event. Removed from the active set once
/// `now >= end_ms()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// Monotonically assigned id.
    pub id: u64,
    pub kind: EventKind,
    /// Target cell; `None` for city-wide effects.
    pub pos: Option<GridPos>,
    pub start_ms: u64,
    pub duration_ms: u64,
    /// Human-readable notification text.
    pub message: String,
}

impl SimulationEvent {
    pub fn end_ms(&self) -> u64 {
        self.start_ms + self.duration_ms
    }

    pub fn expired(&self, now_ms: u64) -> bool {
        now_ms >= self.end_ms()
    }
}

/// Callbacks the event manager needs from the coordinator when it fires an
/// event: where vehicles currently are, and the ability to add new ones.
pub trait EventTargets: Send + Sync {
    /// Current position of an arbitrary live vehicle, if any exist.
    fn random_vehicle_position(&self) -> Option<GridPos>;

    /// Spawn one vehicle of the given kind into the running simulation.
    fn spawn_vehicle(&self, kind: VehicleKind);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_time_is_start_plus_duration() {
        let event = SimulationEvent {
            id: 1,
            kind: EventKind::Accident,
            pos: Some(GridPos::new(3, 3)),
            start_ms: 10_000,
            duration_ms: 6_000,
            message: "accident".to_string(),
        };
        assert_eq!(event.end_ms(), 16_000);
        assert!(!event.expired(15_999));
        assert!(event.expired(16_000));
        assert!(event.expired(20_000));
    }

    #[test]
    fn test_blocking_kinds() {
        assert!(EventKind::Accident.blocks_cell());
        assert!(EventKind::Roadworks.blocks_cell());
        assert!(!EventKind::Congestion.blocks_cell());
        assert!(!EventKind::Emergency.blocks_cell());
    }
}
