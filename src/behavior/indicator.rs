//! Status indicator light
//!
//! Off while asleep, blinking while busy (thinking or speaking), solid on
//! when ready for input.

use crate::config::IndicatorConfig;
use crate::hal::StatusLight;
use crate::state::HeadState;
use std::sync::Arc;
use std::thread;
use tracing::info;

/// What the light should do right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightPattern {
    Off,
    Blink,
    Solid,
}

pub fn pattern_for(state: &HeadState) -> LightPattern {
    if !state.is_armed() {
        LightPattern::Off
    } else if state.is_thinking() || state.is_speaking() {
        LightPattern::Blink
    } else {
        LightPattern::Solid
    }
}

/// Run the indicator loop until shutdown; the light ends up off.
pub fn run(light: Arc<dyn StatusLight>, state: Arc<HeadState>, config: IndicatorConfig) {
    info!("indicator loop started");
    while state.is_running() {
        match pattern_for(&state) {
            LightPattern::Off => {
                light.set(false);
                thread::sleep(config.poll);
            }
            LightPattern::Blink => {
                light.set(true);
                thread::sleep(config.blink_period);
                light.set(false);
                thread::sleep(config.blink_period);
            }
            LightPattern::Solid => {
                light.set(true);
                thread::sleep(config.poll);
            }
        }
    }
    light.set(false);
    info!("indicator loop stopped");
}
