//! Hardware abstraction boundary
//!
//! The engine only ever needs "set a channel duty", "write a whole pixel
//! buffer", "set a light", and "read a switch". Wire protocols (PWM register
//! layout, addressable-LED transmission, GPIO) live behind these traits in
//! the integration binary. Byte/color ordering of the strip is a
//! configuration-time constant of the implementation.

use crate::mouth::Rgb;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

/// PWM servo controller: one duty value per channel.
pub trait ServoBus: Send + Sync {
    /// Set the duty cycle of a channel (16-bit resolution).
    fn set_duty(&self, channel: u8, duty: u16);

    /// De-energize a channel so the servo can relax without buzzing.
    fn relax(&self, channel: u8);
}

/// Addressable LED strip written as a whole buffer per update.
pub trait PixelStrip: Send + Sync {
    fn write(&self, pixels: &[Rgb]);
}

/// Single status light.
pub trait StatusLight: Send + Sync {
    fn set(&self, on: bool);
}

/// Debounced, level-based arm switch; sampled every loop iteration.
pub trait ArmSwitch: Send + Sync {
    fn is_on(&self) -> bool;
}

/// No-op servo bus that traces commands; useful on a bench without hardware.
#[derive(Debug, Default)]
pub struct NullServoBus;

impl ServoBus for NullServoBus {
    fn set_duty(&self, channel: u8, duty: u16) {
        trace!(channel, duty, "servo duty");
    }

    fn relax(&self, channel: u8) {
        trace!(channel, "servo relaxed");
    }
}

/// No-op pixel strip.
#[derive(Debug, Default)]
pub struct NullPixelStrip;

impl PixelStrip for NullPixelStrip {
    fn write(&self, pixels: &[Rgb]) {
        trace!(lit = pixels.iter().filter(|p| **p != Rgb::OFF).count(), "strip write");
    }
}

/// No-op status light.
#[derive(Debug, Default)]
pub struct NullStatusLight;

impl StatusLight for NullStatusLight {
    fn set(&self, on: bool) {
        trace!(on, "status light");
    }
}

/// Software arm switch, toggled programmatically.
#[derive(Debug, Default)]
pub struct SoftArmSwitch {
    on: AtomicBool,
}

impl SoftArmSwitch {
    pub fn new(on: bool) -> Self {
        Self { on: AtomicBool::new(on) }
    }

    pub fn set(&self, on: bool) {
        self.on.store(on, Ordering::SeqCst);
    }
}

impl ArmSwitch for SoftArmSwitch {
    fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }
}
