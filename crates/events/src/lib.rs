//! # Events
//!
//! Disruptive-event lifecycle: creation, cell blocking, broadcast and
//! expiry, plus the background auto-event generator.

mod auto;
mod manager;

pub use auto::run_auto_generator;
pub use manager::{EventManager, EVENT_CHANNEL_CAPACITY};
