//! Eyelid choreography
//!
//! Both lids sweep between their open trims and a shared closed angle. A
//! full blink staggers the trailing lid a few steps behind the leading one
//! so the pair reads as one natural motion; a wink sweeps a single lid; a
//! double blink chains two full blinks. Everything is a no-op while the head
//! is not armed.

use crate::config::BlinkConfig;
use crate::servo::{ServoId, Servos};
use crate::state::HeadState;
use parking_lot::Mutex;
use rand::Rng;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// One of the two eyelids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eyelid {
    Left,
    Right,
}

impl Eyelid {
    fn servo(self) -> ServoId {
        match self {
            Eyelid::Left => ServoId::LeftLid,
            Eyelid::Right => ServoId::RightLid,
        }
    }
}

/// Progress of a lid at a global sweep step, shifted by its stagger offset
/// and clamped to [0, 1].
fn staggered_progress(step: i64, stagger: i64, range: f32) -> f32 {
    if range <= 0.0 {
        return 1.0;
    }
    let corrected = (step - stagger).max(0) as f32;
    corrected.min(range) / range
}

/// Blink/wink choreographer with the shared blink-timing state.
pub struct Blinker {
    servos: Arc<Servos>,
    state: Arc<HeadState>,
    config: BlinkConfig,
    /// When the lids last reached closed; gates probability blinks so
    /// requests cannot overlap.
    last_closure: Mutex<Option<Instant>>,
}

impl Blinker {
    pub fn new(servos: Arc<Servos>, state: Arc<HeadState>, config: BlinkConfig) -> Self {
        Self {
            servos,
            state,
            config,
            last_closure: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &BlinkConfig {
        &self.config
    }

    /// Time since the lids last closed, if they ever have.
    pub fn since_last_closure(&self) -> Option<Duration> {
        self.last_closure.lock().map(|t| t.elapsed())
    }

    fn mark_closure(&self) {
        *self.last_closure.lock() = Some(Instant::now());
    }

    /// Full staggered blink. With `probability < 1.0` the blink only
    /// sometimes executes, for periodic callers. No-op while unarmed.
    pub fn blink(&self, probability: f64) {
        if !self.state.is_armed() {
            return;
        }
        if probability < 1.0 && !rand::thread_rng().gen_bool(probability.clamp(0.0, 1.0)) {
            return;
        }
        self.sweep_both();
    }

    /// Wink one lid, chosen at random when unspecified. No-op while unarmed.
    pub fn wink(&self, side: Option<Eyelid>) {
        if !self.state.is_armed() {
            return;
        }
        let side = side.unwrap_or_else(|| {
            if rand::thread_rng().gen_bool(0.5) {
                Eyelid::Left
            } else {
                Eyelid::Right
            }
        });
        debug!(?side, "wink");
        self.sweep_single(side);
    }

    /// Two full blinks separated by a fixed pause. No-op while unarmed.
    pub fn double_blink(&self) {
        if !self.state.is_armed() {
            return;
        }
        for _ in 0..2 {
            self.sweep_both();
            thread::sleep(self.config.double_pause);
        }
    }

    fn open_trim(&self, side: Eyelid) -> f32 {
        match side {
            Eyelid::Left => self.config.open_left,
            Eyelid::Right => self.config.open_right,
        }
    }

    fn sweep_both(&self) {
        let closed = self.config.closed_angle;
        let left_range = closed - self.config.open_left;
        let right_range = closed - self.config.open_right;
        let steps_total = left_range.max(right_range).ceil() as i64;
        if steps_total <= 0 {
            return;
        }
        let stagger = self.config.stagger_steps();

        // Closing sweep: left leads, right trails by the stagger.
        for step in 0..=steps_total {
            self.lid_step(step, stagger, left_range, right_range);
            thread::sleep(self.config.step_delay);
        }

        self.mark_closure();
        thread::sleep(self.config.hold);

        // Opening sweep, the same profile in reverse.
        for step in (0..=steps_total).rev() {
            self.lid_step(step, stagger, left_range, right_range);
            thread::sleep(self.config.step_delay);
        }
    }

    fn lid_step(&self, step: i64, stagger: i64, left_range: f32, right_range: f32) {
        let left_progress = staggered_progress(step, 0, left_range);
        let right_progress = staggered_progress(step, stagger, right_range);
        self.servos.set_angle(
            ServoId::LeftLid,
            self.config.open_left + left_progress * left_range,
        );
        self.servos.set_angle(
            ServoId::RightLid,
            self.config.open_right + right_progress * right_range,
        );
    }

    fn sweep_single(&self, side: Eyelid) {
        let open = self.open_trim(side);
        let range = self.config.closed_angle - open;
        let steps = range.ceil() as i64;
        if steps <= 0 {
            return;
        }
        let id = side.servo();

        for step in 0..=steps {
            let progress = staggered_progress(step, 0, range);
            self.servos.set_angle(id, open + progress * range);
            thread::sleep(self.config.step_delay);
        }

        self.mark_closure();
        thread::sleep(self.config.hold);

        for step in (0..=steps).rev() {
            let progress = staggered_progress(step, 0, range);
            self.servos.set_angle(id, open + progress * range);
            thread::sleep(self.config.step_delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServoConfig;
    use crate::hal::ServoBus;

    #[derive(Default)]
    struct RecordingBus {
        writes: parking_lot::Mutex<Vec<(u8, u16)>>,
    }

    impl ServoBus for RecordingBus {
        fn set_duty(&self, channel: u8, duty: u16) {
            self.writes.lock().push((channel, duty));
        }

        fn relax(&self, _channel: u8) {}
    }

    fn fast_config() -> BlinkConfig {
        BlinkConfig {
            step_delay: Duration::ZERO,
            side_delay: Duration::ZERO,
            hold: Duration::ZERO,
            double_pause: Duration::ZERO,
            ..BlinkConfig::default()
        }
    }

    fn blinker(config: BlinkConfig, armed: bool) -> (Arc<RecordingBus>, Blinker) {
        let bus = Arc::new(RecordingBus::default());
        let servos = Arc::new(Servos::new(bus.clone(), ServoConfig::default()));
        let state = Arc::new(HeadState::new());
        state.set_armed(armed);
        (bus, Blinker::new(servos, state, config))
    }

    #[test]
    fn test_stagger_shift_property() {
        // Trailing progress at step s equals leading progress at s - d,
        // clamped at the bounds.
        let range = 40.0;
        let d = 10;
        for s in -5..120 {
            assert_eq!(
                staggered_progress(s, d, range),
                staggered_progress(s - d, 0, range),
                "step {s}"
            );
        }
    }

    #[test]
    fn test_progress_clamped_to_unit_range() {
        for s in 0..200 {
            let p = staggered_progress(s, 3, 52.0);
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_degenerate_range_is_complete() {
        assert_eq!(staggered_progress(5, 0, 0.0), 1.0);
        assert_eq!(staggered_progress(5, 0, -3.0), 1.0);
    }

    #[test]
    fn test_blink_noop_when_unarmed() {
        let (bus, blinker) = blinker(fast_config(), false);
        blinker.blink(1.0);
        blinker.wink(Some(Eyelid::Left));
        blinker.double_blink();
        assert!(bus.writes.lock().is_empty());
    }

    #[test]
    fn test_blink_zero_probability_never_runs() {
        let (bus, blinker) = blinker(fast_config(), true);
        for _ in 0..20 {
            blinker.blink(0.0);
        }
        assert!(bus.writes.lock().is_empty());
    }

    #[test]
    fn test_blink_drives_both_lids_and_marks_closure() {
        let (bus, blinker) = blinker(fast_config(), true);
        assert!(blinker.since_last_closure().is_none());

        blinker.blink(1.0);

        let writes = bus.writes.lock();
        assert!(writes.iter().any(|(ch, _)| *ch == 2));
        assert!(writes.iter().any(|(ch, _)| *ch == 5));
        assert!(blinker.since_last_closure().is_some());
    }

    #[test]
    fn test_wink_touches_single_lid() {
        let (bus, blinker) = blinker(fast_config(), true);
        blinker.wink(Some(Eyelid::Left));

        let writes = bus.writes.lock();
        assert!(writes.iter().all(|(ch, _)| *ch == 2));
        assert!(!writes.is_empty());
    }

    #[test]
    fn test_blink_sweep_ends_at_open_trims() {
        let (bus, blinker) = blinker(fast_config(), true);
        blinker.blink(1.0);

        // Last write per lid channel must equal the duty of its open trim.
        let expect = |angle: f32, mirrored: bool| {
            let angle = if mirrored { 180.0 - angle } else { angle };
            (0.5 + 2.0 * angle / 180.0) / 20.0 * 65535.0
        };
        let writes = bus.writes.lock();
        let last_left = writes.iter().rev().find(|(ch, _)| *ch == 2).unwrap().1;
        let last_right = writes.iter().rev().find(|(ch, _)| *ch == 5).unwrap().1;
        assert_eq!(last_left, expect(-12.0, false) as u16);
        assert_eq!(last_right, expect(0.0, true) as u16);
    }
}
