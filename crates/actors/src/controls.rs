//! Shared run controls read by every actor loop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use contracts::SIM_SPEED_RANGE;
use tokio::sync::watch;

/// Pause flag and global speed multiplier, shared across all actor tasks.
///
/// Actor loops keep ticking while paused (so speed changes stay responsive)
/// and only skip the move attempt itself.
#[derive(Debug)]
pub struct RunControls {
    running: AtomicBool,
    /// Speed multiplier stored as f64 bits.
    speed_bits: AtomicU64,
}

impl RunControls {
    pub fn new(speed: f64) -> Self {
        Self {
            running: AtomicBool::new(true),
            speed_bits: AtomicU64::new(speed.to_bits()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Relaxed);
    }

    pub fn speed(&self) -> f64 {
        f64::from_bits(self.speed_bits.load(Ordering::Relaxed))
    }

    /// Runtime speed change, clamped to the legal range. Takes effect on
    /// each actor's next tick without a restart.
    pub fn set_speed(&self, multiplier: f64) {
        let clamped = multiplier.clamp(SIM_SPEED_RANGE.0, SIM_SPEED_RANGE.1);
        self.speed_bits.store(clamped.to_bits(), Ordering::Relaxed);
    }
}

/// Sleep for `duration` unless shutdown is signalled first.
///
/// Returns `true` when the caller should stop. The shutdown channel only
/// ever transitions to `true`.
pub async fn sleep_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        changed = shutdown.changed() => match changed {
            Ok(()) => *shutdown.borrow_and_update(),
            // Sender dropped: the run is being torn down.
            Err(_) => true,
        },
    }
}
