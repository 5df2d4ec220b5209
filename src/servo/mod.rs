//! Servo bank: angle commands, position tracking, interpolation, blinks.

pub mod blink;
pub mod motion;

pub use blink::{Blinker, Eyelid};
pub use motion::{move_together, PositionTable};

use crate::config::ServoConfig;
use crate::hal::ServoBus;
use std::sync::Arc;

/// The six outputs of the head, by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServoId {
    LeftX,
    LeftY,
    LeftLid,
    RightX,
    RightY,
    RightLid,
}

impl ServoId {
    pub const ALL: [ServoId; 6] = [
        ServoId::LeftX,
        ServoId::LeftY,
        ServoId::LeftLid,
        ServoId::RightX,
        ServoId::RightY,
        ServoId::RightLid,
    ];
}

/// Angle-level interface over the raw duty bus.
///
/// Callers clamp angles to the channel's configured range before commanding
/// it; an out-of-range angle is a programming error, not a runtime failure,
/// so no error is raised here.
pub struct Servos {
    bus: Arc<dyn ServoBus>,
    config: ServoConfig,
}

impl Servos {
    pub fn new(bus: Arc<dyn ServoBus>, config: ServoConfig) -> Self {
        Self { bus, config }
    }

    pub fn config(&self) -> &ServoConfig {
        &self.config
    }

    /// Command a channel to an angle in degrees, applying the mount
    /// direction and the fixed pulse-width mapping.
    pub fn set_angle(&self, id: ServoId, angle: f32) {
        let channel = self.config.channel(id);
        let corrected = if channel.direction < 0 { 180.0 - angle } else { angle };
        self.bus.set_duty(channel.channel, self.duty_for(corrected));
    }

    /// De-energize one channel.
    pub fn set_off(&self, id: ServoId) {
        self.bus.relax(self.config.channel(id).channel);
    }

    /// De-energize every channel (shutdown and sleep paths).
    pub fn relax_all(&self) {
        for id in ServoId::ALL {
            self.set_off(id);
        }
    }

    fn duty_for(&self, angle: f32) -> u16 {
        let pulse_range = self.config.max_pulse_ms - self.config.min_pulse_ms;
        let pulse_ms = self.config.min_pulse_ms + pulse_range * angle / 180.0;
        (pulse_ms / self.config.period_ms * 65535.0) as u16
    }
}
