//! Completed-run reporting seam.
//!
//! History recording and storage live outside the engine; the coordinator
//! only hands a summary to whatever sink was configured.

use serde::{Deserialize, Serialize};

/// Final aggregate stats of one completed simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub duration_ms: u64,
    pub vehicles: usize,
    pub avg_speed_cells_per_sec: f64,
    pub active_events: usize,
}

/// Consumer of completed-run summaries.
pub trait SessionSink: Send + Sync {
    fn record(&self, summary: SessionSummary);
}

/// Sink that discards every summary.
#[derive(Debug, Default)]
pub struct NullSessionSink;

impl SessionSink for NullSessionSink {
    fn record(&self, _summary: SessionSummary) {}
}
