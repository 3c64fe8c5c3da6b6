//! # Actors
//!
//! Per-entity actor runtimes: one repeating task per vehicle and per
//! traffic light, plus the shared run controls they all read.
//!
//! Each actor owns its state exclusively; the publisher reads clones.
//! Shutdown is cooperative, checked at every loop iteration boundary.

mod controls;
mod light;
mod vehicle;

pub use controls::{sleep_or_shutdown, RunControls};
pub use light::{LightRegistry, TrafficLightActor};
pub use vehicle::VehicleActor;
