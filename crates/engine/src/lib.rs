//! # Engine
//!
//! Simulation coordinator: owns configuration and id generation,
//! orchestrates actor lifecycle (start/pause/resume/step/reset), and
//! periodically aggregates all actor state into a published snapshot plus
//! a broadcast event stream.

mod coordinator;
mod publisher;
mod session;
mod spawn;

pub use coordinator::SimulationCoordinator;
pub use session::LogSessionSink;
