//! # Contracts
//!
//! Frozen interface contracts, defining inter-crate data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are
//! prohibited.
//!
//! ## Time Model
//! - Wall-clock milliseconds (`u64`, epoch-based) are the primary clock
//! - Time-based state machines take an explicit `now_ms` so they stay testable

mod config;
mod error;
mod event;
mod light;
mod position;
mod session;
mod snapshot;
mod time;
mod vehicle;

pub use config::*;
pub use error::*;
pub use event::*;
pub use light::*;
pub use position::GridPos;
pub use session::{NullSessionSink, SessionSink, SessionSummary};
pub use snapshot::*;
pub use time::now_ms;
pub use vehicle::*;
