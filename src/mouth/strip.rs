//! Symmetric mouth illumination
//!
//! A loudness level maps to a count of lit pixels, filled outward from the
//! two center positions of the strip. Colors are raw byte triples in the
//! strip's configured byte order; the engine attaches no semantics to them.

use crate::hal::PixelStrip;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Color triple in the strip's byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const OFF: Rgb = Rgb(0, 0, 0);
}

/// Compute the frame for a [0, 1] level on an `n`-pixel strip.
///
/// `round(level * n)` pixels light up in symmetric pairs around the two
/// center positions (`n/2 - 1` and `n/2` for even `n`).
pub fn frame_for_level(n: usize, level: f32, color: Rgb) -> Vec<Rgb> {
    let level = level.clamp(0.0, 1.0);
    let lit = (level * n as f32).round() as usize;

    let mut frame = vec![Rgb::OFF; n];
    let center_left = n / 2 - 1;
    let center_right = n / 2;

    for i in 0..lit / 2 {
        if i <= center_left {
            frame[center_left - i] = color;
        }
        if center_right + i < n {
            frame[center_right + i] = color;
        }
    }

    frame
}

/// The mouth strip with its pixel count fixed at configuration time.
pub struct Mouth {
    strip: Arc<dyn PixelStrip>,
    pixels: usize,
}

impl Mouth {
    pub fn new(strip: Arc<dyn PixelStrip>, pixels: usize) -> Self {
        Self { strip, pixels }
    }

    /// Light the strip for a loudness level.
    pub fn show_level(&self, level: f32, color: Rgb) {
        self.strip.write(&frame_for_level(self.pixels, level, color));
    }

    /// Turn every pixel off.
    pub fn clear(&self) {
        self.strip.write(&vec![Rgb::OFF; self.pixels]);
    }

    /// Flash the whole strip `pulses` times; used for the offline alert.
    pub fn alert_pulse(&self, color: Rgb, pulses: u32, half_period: Duration) {
        for _ in 0..pulses {
            self.show_level(1.0, color);
            thread::sleep(half_period);
            self.clear();
            thread::sleep(half_period);
        }
    }
}
