//! Traffic light domain types.

use serde::{Deserialize, Serialize};

use crate::GridPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightColor {
    Red,
    Yellow,
    Green,
}

/// Travel axis governed by one color pair of an intersection light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// North-South
    Ns,
    /// East-West
    Ew,
}

impl Axis {
    pub fn other(&self) -> Axis {
        match self {
            Axis::Ns => Axis::Ew,
            Axis::Ew => Axis::Ns,
        }
    }

    /// Axis of a move, derived from the coordinate delta: any x change is
    /// East-West, otherwise North-South.
    pub fn of_move(from: GridPos, to: GridPos) -> Axis {
        if to.x != from.x {
            Axis::Ew
        } else {
            Axis::Ns
        }
    }
}

/// Time-bounded forced green window granted to priority vehicles.
pub const PRIORITY_WINDOW_MS: u64 = 2_500;

/// What the occupancy index needs from a traffic light when arbitrating a
/// move into its cell.
pub trait IntersectionSignal: Send + Sync {
    /// Record a forced-green request for `axis`, active for `window_ms`.
    fn request_priority(&self, axis: Axis, window_ms: u64);

    /// Whether the axis of the `from` -> `to` move currently reads green.
    fn is_green_for_move(&self, from: GridPos, to: GridPos) -> bool;
}

/// Observable state of one intersection light.
///
/// Invariant: `ns` and `ew` are never both green.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficLightView {
    pub id: u32,
    pub pos: GridPos,
    pub ns: LightColor,
    pub ew: LightColor,
    /// Time left in the current phase, floored at zero.
    pub remaining_ms: u64,
}
