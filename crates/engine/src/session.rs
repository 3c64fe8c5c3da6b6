//! Completed-run reporting.

use contracts::{SessionSink, SessionSummary, SimulationStats};
use tracing::info;

/// Runs shorter than this are considered noise and never reported.
const MIN_SESSION_MS: u64 = 5_000;

/// Summary for the history collaborator, or `None` when the run was too
/// short to be worth recording.
pub(crate) fn summary_if_reportable(stats: &SimulationStats) -> Option<SessionSummary> {
    if stats.sim_time_ms <= MIN_SESSION_MS {
        return None;
    }
    Some(SessionSummary {
        duration_ms: stats.sim_time_ms,
        vehicles: stats.active_vehicles,
        avg_speed_cells_per_sec: stats.avg_speed_cells_per_sec,
        active_events: stats.active_events,
    })
}

/// Session sink that emits each summary as a structured log line.
#[derive(Debug, Default)]
pub struct LogSessionSink;

impl SessionSink for LogSessionSink {
    fn record(&self, summary: SessionSummary) {
        info!(
            duration_ms = summary.duration_ms,
            vehicles = summary.vehicles,
            avg_speed = summary.avg_speed_cells_per_sec,
            active_events = summary.active_events,
            "session completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(sim_time_ms: u64) -> SimulationStats {
        SimulationStats {
            active_vehicles: 30,
            avg_speed_cells_per_sec: 2.5,
            sim_time_ms,
            active_events: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_short_runs_not_reported() {
        assert!(summary_if_reportable(&stats(0)).is_none());
        assert!(summary_if_reportable(&stats(5_000)).is_none());
    }

    #[test]
    fn test_long_runs_reported() {
        let summary = summary_if_reportable(&stats(5_001)).unwrap();
        assert_eq!(summary.duration_ms, 5_001);
        assert_eq!(summary.vehicles, 30);
        assert_eq!(summary.avg_speed_cells_per_sec, 2.5);
        assert_eq!(summary.active_events, 1);
    }
}
