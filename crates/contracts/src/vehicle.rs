//! Vehicle domain types.

use serde::{Deserialize, Serialize};

use crate::GridPos;

/// Vehicle category. Speed factor scales the tick interval; size and color
/// are display data carried through to the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleKind {
    Car,
    Bus,
    Motorcycle,
    Ambulance,
}

impl VehicleKind {
    /// Every kind, in a fixed order, for uniform random selection.
    pub const ALL: [VehicleKind; 4] = [
        VehicleKind::Car,
        VehicleKind::Bus,
        VehicleKind::Motorcycle,
        VehicleKind::Ambulance,
    ];

    /// Multiplier applied to the global speed when computing tick intervals.
    pub fn speed_factor(&self) -> f64 {
        match self {
            VehicleKind::Car => 1.0,
            VehicleKind::Bus => 0.7,
            VehicleKind::Motorcycle => 1.4,
            VehicleKind::Ambulance => 1.2,
        }
    }

    /// Rendering size in cell units.
    pub fn render_size(&self) -> f32 {
        match self {
            VehicleKind::Car => 0.70,
            VehicleKind::Bus => 1.05,
            VehicleKind::Motorcycle => 0.55,
            VehicleKind::Ambulance => 0.75,
        }
    }

    /// Fixed display color (0xAARRGGBB).
    pub fn color_argb(&self) -> u32 {
        match self {
            VehicleKind::Ambulance => 0xFFFF_69B4,
            VehicleKind::Bus => 0xFFFF_D700,
            VehicleKind::Motorcycle => 0xFFFF_FFFF,
            VehicleKind::Car => 0xFFDC_143C,
        }
    }

    /// Ambulances get the priority-override treatment at traffic lights.
    pub fn is_priority(&self) -> bool {
        matches!(self, VehicleKind::Ambulance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Moving,
    Stopped,
    Arrived,
}

/// Point-in-time state of a single vehicle.
///
/// Owned exclusively by the vehicle's actor task; everyone else sees clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub id: u32,
    pub kind: VehicleKind,
    pub pos: GridPos,
    pub dest: GridPos,
    pub status: VehicleStatus,
    pub color_argb: u32,
    /// Rendering size in cell units, fixed per kind.
    pub render_size: f32,
    /// Cumulative cells traversed since spawn.
    pub moved_cells: u32,
    /// Cumulative wait time accrued from failed move attempts.
    pub wait_ms: u64,
}
