//! Traffic light actor: repeating phase-cycling state machine with
//! priority override.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{now_ms, Axis, GridPos, IntersectionSignal, LightColor, TrafficLightView};
use tokio::sync::watch;
use tracing::debug;

use crate::controls::sleep_or_shutdown;

const COLOR_RED: u8 = 0;
const COLOR_YELLOW: u8 = 1;
const COLOR_GREEN: u8 = 2;

const FORCED_NONE: u8 = 0;
const FORCED_NS: u8 = 1;
const FORCED_EW: u8 = 2;

fn decode_color(raw: u8) -> LightColor {
    match raw {
        COLOR_GREEN => LightColor::Green,
        COLOR_YELLOW => LightColor::Yellow,
        _ => LightColor::Red,
    }
}

fn encode_axis(axis: Axis) -> u8 {
    match axis {
        Axis::Ns => FORCED_NS,
        Axis::Ew => FORCED_EW,
    }
}

/// One intersection light.
///
/// Colors live in atomics: phase transitions write both axes together, and
/// readers tolerate a momentarily stale but internally consistent pair.
/// The never-both-green invariant holds because every writer sets the
/// opposite axis red whenever it sets one axis green.
pub struct TrafficLightActor {
    id: u32,
    pos: GridPos,
    green_ms: u64,
    yellow_ms: u64,
    all_red_ms: u64,

    ns: AtomicU8,
    ew: AtomicU8,
    phase_end_ms: AtomicU64,

    forced_axis: AtomicU8,
    force_until_ms: AtomicU64,
}

impl TrafficLightActor {
    pub fn new(id: u32, pos: GridPos, green_ms: u64, yellow_ms: u64, all_red_ms: u64) -> Self {
        Self {
            id,
            pos,
            green_ms,
            yellow_ms,
            all_red_ms,
            ns: AtomicU8::new(COLOR_GREEN),
            ew: AtomicU8::new(COLOR_RED),
            phase_end_ms: AtomicU64::new(0),
            forced_axis: AtomicU8::new(FORCED_NONE),
            force_until_ms: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn pos(&self) -> GridPos {
        self.pos
    }

    /// Observable state for the snapshot; remaining time floored at zero.
    pub fn view(&self, now_ms: u64) -> TrafficLightView {
        TrafficLightView {
            id: self.id,
            pos: self.pos,
            ns: decode_color(self.ns.load(Ordering::Relaxed)),
            ew: decode_color(self.ew.load(Ordering::Relaxed)),
            remaining_ms: self
                .phase_end_ms
                .load(Ordering::Relaxed)
                .saturating_sub(now_ms),
        }
    }

    /// Axis that the next rotation step must serve: the forced axis while
    /// its window is active, the normal rotation axis otherwise. The bool
    /// says whether the override was in effect (alternation freezes then).
    fn effective_axis(&self, rotation: Axis, now_ms: u64) -> (Axis, bool) {
        let forced = match self.forced_axis.load(Ordering::Relaxed) {
            FORCED_NS => Some(Axis::Ns),
            FORCED_EW => Some(Axis::Ew),
            _ => None,
        };
        match forced {
            Some(axis) if now_ms < self.force_until_ms.load(Ordering::Relaxed) => (axis, true),
            _ => (rotation, false),
        }
    }

    fn set_green(&self, axis: Axis, now_ms: u64) {
        self.phase_end_ms
            .store(now_ms + self.green_ms, Ordering::Relaxed);
        match axis {
            Axis::Ns => {
                self.ns.store(COLOR_GREEN, Ordering::Relaxed);
                self.ew.store(COLOR_RED, Ordering::Relaxed);
            }
            Axis::Ew => {
                self.ns.store(COLOR_RED, Ordering::Relaxed);
                self.ew.store(COLOR_GREEN, Ordering::Relaxed);
            }
        }
    }

    fn set_yellow(&self, axis: Axis, now_ms: u64) {
        self.phase_end_ms
            .store(now_ms + self.yellow_ms, Ordering::Relaxed);
        match axis {
            Axis::Ns => {
                self.ns.store(COLOR_YELLOW, Ordering::Relaxed);
                self.ew.store(COLOR_RED, Ordering::Relaxed);
            }
            Axis::Ew => {
                self.ns.store(COLOR_RED, Ordering::Relaxed);
                self.ew.store(COLOR_YELLOW, Ordering::Relaxed);
            }
        }
    }

    fn set_all_red(&self, now_ms: u64) {
        self.phase_end_ms
            .store(now_ms + self.all_red_ms, Ordering::Relaxed);
        self.ns.store(COLOR_RED, Ordering::Relaxed);
        self.ew.store(COLOR_RED, Ordering::Relaxed);
    }

    /// Drive one full rotation step: green, yellow, optional all-red.
    /// Returns the rotation axis for the next step, or `None` on shutdown.
    async fn rotate_once(
        &self,
        rotation: Axis,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<Axis> {
        let (axis, forced) = self.effective_axis(rotation, now_ms());

        self.set_green(axis, now_ms());
        if sleep_or_shutdown(Duration::from_millis(self.green_ms), shutdown).await {
            return None;
        }

        self.set_yellow(axis, now_ms());
        if sleep_or_shutdown(Duration::from_millis(self.yellow_ms), shutdown).await {
            return None;
        }

        if self.all_red_ms > 0 {
            self.set_all_red(now_ms());
            if sleep_or_shutdown(Duration::from_millis(self.all_red_ms), shutdown).await {
                return None;
            }
        }

        // Priority never advances the rotation; alternation resumes from
        // whichever axis was last served normally.
        if forced {
            Some(rotation)
        } else {
            Some(rotation.other())
        }
    }

    /// Actor loop. Terminal only on shutdown.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        debug!(light_id = self.id, pos = ?self.pos, "traffic light started");
        let mut rotation = Axis::Ns;
        while !*shutdown.borrow() {
            match self.rotate_once(rotation, &mut shutdown).await {
                Some(next) => rotation = next,
                None => break,
            }
        }
        debug!(light_id = self.id, "traffic light stopped");
    }
}

impl IntersectionSignal for TrafficLightActor {
    fn request_priority(&self, axis: Axis, window_ms: u64) {
        self.forced_axis.store(encode_axis(axis), Ordering::Relaxed);
        self.force_until_ms
            .store(now_ms() + window_ms, Ordering::Relaxed);
    }

    fn is_green_for_move(&self, from: GridPos, to: GridPos) -> bool {
        match Axis::of_move(from, to) {
            Axis::Ns => self.ns.load(Ordering::Relaxed) == COLOR_GREEN,
            Axis::Ew => self.ew.load(Ordering::Relaxed) == COLOR_GREEN,
        }
    }
}

impl std::fmt::Debug for TrafficLightActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let view = self.view(now_ms());
        f.debug_struct("TrafficLightActor")
            .field("id", &self.id)
            .field("pos", &self.pos)
            .field("ns", &view.ns)
            .field("ew", &view.ew)
            .finish()
    }
}

/// Per-run set of lights with position lookup.
///
/// Built once before actors start; read-only afterwards.
#[derive(Debug, Default)]
pub struct LightRegistry {
    lights: Vec<Arc<TrafficLightActor>>,
    by_pos: HashMap<GridPos, usize>,
}

impl LightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, light: Arc<TrafficLightActor>) {
        self.by_pos.insert(light.pos(), self.lights.len());
        self.lights.push(light);
    }

    pub fn light_at(&self, pos: GridPos) -> Option<&Arc<TrafficLightActor>> {
        self.by_pos.get(&pos).map(|&idx| &self.lights[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TrafficLightActor>> {
        self.lights.iter()
    }

    pub fn views(&self, now_ms: u64) -> Vec<TrafficLightView> {
        self.lights.iter().map(|l| l.view(now_ms)).collect()
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light() -> TrafficLightActor {
        TrafficLightActor::new(1, GridPos::new(5, 5), 8_000, 1_500, 600)
    }

    #[test]
    fn test_initial_phase_is_ns_green() {
        let light = light();
        let view = light.view(0);
        assert_eq!(view.ns, LightColor::Green);
        assert_eq!(view.ew, LightColor::Red);
    }

    #[test]
    fn test_never_both_green_through_all_transitions() {
        let light = light();
        let check = |light: &TrafficLightActor| {
            let view = light.view(0);
            assert!(
                !(view.ns == LightColor::Green && view.ew == LightColor::Green),
                "both axes green: {view:?}"
            );
        };

        for axis in [Axis::Ns, Axis::Ew] {
            light.set_green(axis, 0);
            check(&light);
            light.set_yellow(axis, 0);
            check(&light);
            light.set_all_red(0);
            check(&light);
        }
    }

    #[test]
    fn test_is_green_for_move_per_axis() {
        let light = light();
        let from = GridPos::new(5, 4);
        let ns_move = GridPos::new(5, 5);
        let ew_move_from = GridPos::new(4, 5);

        light.set_green(Axis::Ns, 0);
        assert!(light.is_green_for_move(from, ns_move));
        assert!(!light.is_green_for_move(ew_move_from, GridPos::new(5, 5)));

        light.set_green(Axis::Ew, 0);
        assert!(!light.is_green_for_move(from, ns_move));
        assert!(light.is_green_for_move(ew_move_from, GridPos::new(5, 5)));
    }

    #[test]
    fn test_remaining_time_floored_at_zero() {
        let light = light();
        light.set_green(Axis::Ns, 1_000);
        assert_eq!(light.view(1_000).remaining_ms, 8_000);
        assert_eq!(light.view(5_000).remaining_ms, 4_000);
        assert_eq!(light.view(20_000).remaining_ms, 0);
    }

    #[test]
    fn test_priority_overrides_axis_until_window_lapses() {
        let light = light();

        // No override: rotation axis wins.
        assert_eq!(light.effective_axis(Axis::Ns, 100).0, Axis::Ns);

        light.forced_axis.store(FORCED_EW, Ordering::Relaxed);
        light.force_until_ms.store(2_500, Ordering::Relaxed);

        let (axis, forced) = light.effective_axis(Axis::Ns, 1_000);
        assert_eq!(axis, Axis::Ew);
        assert!(forced);

        // Window lapsed: normal alternation resumes, no re-forcing.
        let (axis, forced) = light.effective_axis(Axis::Ns, 2_500);
        assert_eq!(axis, Axis::Ns);
        assert!(!forced);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotation_alternates_axes() {
        let light = Arc::new(TrafficLightActor::new(1, GridPos::new(2, 2), 50, 10, 5));
        let (_tx, mut rx) = watch::channel(false);

        let next = light.rotate_once(Axis::Ns, &mut rx).await;
        assert_eq!(next, Some(Axis::Ew));
        let next = light.rotate_once(Axis::Ew, &mut rx).await;
        assert_eq!(next, Some(Axis::Ns));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let light = Arc::new(TrafficLightActor::new(1, GridPos::new(2, 2), 10, 5, 0));
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(Arc::clone(&light).run(rx));

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("light task did not stop")
            .unwrap();
    }

    #[test]
    fn test_registry_position_lookup() {
        let mut registry = LightRegistry::new();
        let pos = GridPos::new(2, 5);
        registry.insert(Arc::new(TrafficLightActor::new(7, pos, 8_000, 1_500, 600)));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.light_at(pos).unwrap().id(), 7);
        assert!(registry.light_at(GridPos::new(0, 0)).is_none());
    }
}
