//! Idle announcements
//!
//! After a configurable span of continuous armed-idle time, the head speaks
//! a randomly chosen pre-authored phrase. The timer restarts on any activity
//! (thinking, speaking) and while the head is asleep or offline.

use crate::config::IdleConfig;
use crate::state::{GazeMode, HeadState};
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

/// Wall-clock idle timer; pure so the reset/fire rules are testable.
#[derive(Debug)]
pub struct IdleTimer {
    last_activity: Instant,
    threshold: Duration,
}

impl IdleTimer {
    pub fn new(now: Instant, threshold: Duration) -> Self {
        Self { last_activity: now, threshold }
    }

    /// Advance the timer. Returns `true` when an announcement should fire:
    /// only from the idle mode, after `threshold` of continuous idle time.
    /// Any other mode restarts the span.
    pub fn tick(&mut self, mode: GazeMode, now: Instant) -> bool {
        if mode != GazeMode::Idle {
            self.last_activity = now;
            return false;
        }
        if now.duration_since(self.last_activity) >= self.threshold {
            self.last_activity = now;
            return true;
        }
        false
    }
}

/// Run the idle-announcement loop until shutdown.
///
/// `speak` hands the chosen phrase to the speech pipeline; it must set the
/// speaking flag itself, which in turn restarts this timer.
pub fn run<F>(state: Arc<HeadState>, config: IdleConfig, speak: F)
where
    F: Fn(&str),
{
    info!("idle announcement loop started");
    let mut timer = IdleTimer::new(Instant::now(), config.threshold);

    while state.is_running() {
        thread::sleep(config.tick);
        if timer.tick(state.gaze_mode(), Instant::now()) {
            if let Some(phrase) = config.phrases.choose(&mut rand::thread_rng()) {
                info!(phrase = %phrase, "idle announcement");
                speak(phrase);
            }
        }
    }
    info!("idle announcement loop stopped");
}
