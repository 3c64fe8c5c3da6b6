//! In-memory aggregation of published snapshot statistics.
//!
//! The engine emits gauges and counters directly; this module folds the
//! snapshot stream into a printable end-of-run summary.

use contracts::SimulationStats;

/// Aggregates the statistics of successive snapshots over one run.
///
/// Feed it every published snapshot's stats and ask for a [`RunSummary`]
/// at shutdown.
#[derive(Debug, Clone, Default)]
pub struct RunMetricsAggregator {
    /// Snapshots folded in so far
    pub snapshots: u64,

    /// Fleet size statistics
    pub vehicle_stats: RunningStats,

    /// Average speed statistics (cells per second)
    pub speed_stats: RunningStats,

    /// Stopped-vehicle statistics
    pub stopped_stats: RunningStats,

    /// Highest concurrent event count observed
    pub peak_events: usize,

    /// Final values, taken from the last snapshot seen
    pub last: SimulationStats,
}

impl RunMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one snapshot's statistics into the aggregate
    pub fn update(&mut self, stats: &SimulationStats) {
        self.snapshots += 1;
        self.vehicle_stats.push(stats.active_vehicles as f64);
        self.speed_stats.push(stats.avg_speed_cells_per_sec);
        self.stopped_stats.push(stats.stopped as f64);
        self.peak_events = self.peak_events.max(stats.active_events);
        self.last = stats.clone();
    }

    /// Produce the end-of-run summary report
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            snapshots: self.snapshots,
            sim_time_ms: self.last.sim_time_ms,
            final_vehicles: self.last.active_vehicles,
            collisions_avoided: self.last.collisions_avoided,
            total_wait_ms: self.last.total_wait_ms,
            peak_events: self.peak_events,
            vehicles: StatsSummary::from(&self.vehicle_stats),
            avg_speed: StatsSummary::from(&self.speed_stats),
            stopped: StatsSummary::from(&self.stopped_stats),
        }
    }

    /// Reset the aggregate
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// End-of-run report
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub snapshots: u64,
    pub sim_time_ms: u64,
    pub final_vehicles: usize,
    pub collisions_avoided: u64,
    pub total_wait_ms: u64,
    pub peak_events: usize,
    pub vehicles: StatsSummary,
    pub avg_speed: StatsSummary,
    pub stopped: StatsSummary,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Run Summary ===")?;
        writeln!(f, "Simulated time: {:.1}s", self.sim_time_ms as f64 / 1000.0)?;
        writeln!(f, "Snapshots published: {}", self.snapshots)?;
        writeln!(f, "Final fleet size: {}", self.final_vehicles)?;
        writeln!(f, "Collisions avoided: {}", self.collisions_avoided)?;
        writeln!(
            f,
            "Accumulated wait: {:.1}s",
            self.total_wait_ms as f64 / 1000.0
        )?;
        writeln!(f, "Peak concurrent events: {}", self.peak_events)?;
        writeln!(f, "Fleet size: {}", self.vehicles)?;
        writeln!(f, "Avg speed (cells/s): {}", self.avg_speed)?;
        writeln!(f, "Stopped vehicles: {}", self.stopped)?;
        Ok(())
    }
}

/// Summary of one statistic series
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Fold in a new value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
