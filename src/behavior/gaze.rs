//! Gaze idling and auto-blink
//!
//! The eyes wander to random targets with a movement scale, blink odds, and
//! pacing chosen per behavioral mode. Offline and asleep hold the last pose.

use crate::config::{EyeConfig, GazeConfig};
use crate::servo::{move_together, Blinker, PositionTable, ServoId, Servos};
use crate::state::{GazeMode, HeadState};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

/// Pick a random gaze point, scaled around the center of the travel range.
pub fn random_eye_target(eyes: &EyeConfig, scale: f32) -> (f32, f32) {
    let mut rng = rand::thread_rng();
    let x_radius = (eyes.x_limits.1 - eyes.x_limits.0) / 2.0 * scale;
    let y_radius = (eyes.y_limits.1 - eyes.y_limits.0) / 2.0 * scale;
    (
        rng.gen_range(eyes.x_mid() - x_radius..=eyes.x_mid() + x_radius),
        rng.gen_range(eyes.y_mid() - y_radius..=eyes.y_mid() + y_radius),
    )
}

/// Both eyes converge on the same point.
pub fn eye_targets(x: f32, y: f32) -> HashMap<ServoId, f32> {
    HashMap::from([
        (ServoId::LeftX, x),
        (ServoId::LeftY, y),
        (ServoId::RightX, x),
        (ServoId::RightY, y),
    ])
}

/// Run the gaze loop until shutdown.
pub fn run(
    servos: Arc<Servos>,
    table: Arc<PositionTable>,
    blinker: Arc<Blinker>,
    state: Arc<HeadState>,
    eyes: EyeConfig,
    config: GazeConfig,
) {
    info!("gaze loop started");
    let mut rng = rand::thread_rng();
    let mut next_auto_blink = Duration::from_secs_f32(
        rng.gen_range(blinker.config().idle_interval.0..=blinker.config().idle_interval.1),
    );
    let mut idle_clock = std::time::Instant::now();

    while state.is_running() {
        match state.gaze_mode() {
            GazeMode::Offline | GazeMode::Asleep => {
                thread::sleep(config.hold_poll);
            }
            GazeMode::Thinking => {
                for _ in 0..config.thinking_moves {
                    glance(&servos, &table, &eyes, config.thinking_scale);
                    probability_blink(&blinker, config.thinking_blink_prob);
                    thread::sleep(config.thinking_pause);
                }
            }
            GazeMode::Speaking => {
                glance(&servos, &table, &eyes, config.speaking_scale);
                probability_blink(&blinker, config.speaking_blink_prob);
                let pause = rng.gen_range(config.speaking_pause.0..=config.speaking_pause.1);
                thread::sleep(Duration::from_secs_f32(pause));
            }
            GazeMode::Idle => {
                glance(&servos, &table, &eyes, 1.0);

                // Idle blinks run on their own randomized timer, independent
                // of the probability blinks used while thinking or speaking.
                if idle_clock.elapsed() >= next_auto_blink {
                    blinker.blink(1.0);
                    idle_clock = std::time::Instant::now();
                    next_auto_blink = Duration::from_secs_f32(rng.gen_range(
                        blinker.config().idle_interval.0..=blinker.config().idle_interval.1,
                    ));
                }

                let pause = rng.gen_range(config.idle_pause.0..=config.idle_pause.1);
                thread::sleep(Duration::from_secs_f32(pause));
            }
        }
    }
    info!("gaze loop stopped");
}

fn glance(servos: &Servos, table: &PositionTable, eyes: &EyeConfig, scale: f32) {
    let (x, y) = random_eye_target(eyes, scale);
    move_together(servos, table, &eye_targets(x, y), eyes.move_step, eyes.move_delay);
}

/// Blink with the given odds, spaced at least `min_gap` from the last one.
fn probability_blink(blinker: &Blinker, probability: f64) {
    let spaced = blinker
        .since_last_closure()
        .map_or(true, |gap| gap > blinker.config().min_gap);
    if spaced && rand::thread_rng().gen_bool(probability.clamp(0.0, 1.0)) {
        blinker.blink(1.0);
    }
}
