//! Speech amplitude visualization and playback pacing
//!
//! Each playback frame's loudness drives the mouth strip, with the visual
//! update scheduled a fixed lead time ahead of the audible frame. Frame
//! deadlines advance by each frame's exact playback duration, so pacing
//! drift never accumulates.

use crate::audio::{rms, AudioSink};
use crate::config::PlaybackConfig;
use crate::mouth::{Mouth, Rgb};
use crate::speech::AudioClip;
use crate::Result;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Maps frame loudness to a smoothed [0, 1] mouth level.
#[derive(Debug, Clone)]
pub struct MouthVisualizer {
    gain: f32,
    smoothing: f32,
    level: f32,
}

impl MouthVisualizer {
    pub fn new(gain: f32, smoothing: f32) -> Self {
        Self { gain, smoothing, level: 0.0 }
    }

    /// Current smoothed level.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Compress and smooth one frame's loudness.
    ///
    /// Log compression approximates perceived volume; the exponential
    /// smoothing keeps the strip from flickering frame to frame.
    pub fn level_for_frame(&mut self, frame: &[f32]) -> f32 {
        let raw = (1.0 + self.gain * rms(frame)).log10().min(1.0);
        self.level = self.smoothing * self.level + (1.0 - self.smoothing) * raw;
        self.level
    }

    /// Reset between utterances.
    pub fn reset(&mut self) {
        self.level = 0.0;
    }

    #[cfg(test)]
    fn with_level(mut self, level: f32) -> Self {
        self.level = level;
        self
    }
}

/// Per-frame deadline tracker for playback pacing.
///
/// The first deadline is `start + lead`; each subsequent one is the previous
/// deadline plus the frame's playback duration, never "now".
#[derive(Debug)]
pub struct FramePacer {
    deadline: Instant,
}

impl FramePacer {
    pub fn new(start: Instant, lead: Duration) -> Self {
        Self { deadline: start + lead }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Sleep until the current frame's deadline.
    pub fn wait(&self) {
        let now = Instant::now();
        if self.deadline > now {
            thread::sleep(self.deadline - now);
        }
    }

    /// Advance the deadline by a frame's exact playback duration.
    pub fn advance(&mut self, frame_len: usize, sample_rate: u32) {
        self.deadline += Duration::from_secs_f64(frame_len as f64 / sample_rate as f64);
    }
}

/// Play a clip through `sink` while animating `mouth` in `color`.
///
/// Each frame's visual update lands `lead` ahead of its audio write; the
/// strip is cleared when the clip ends.
pub fn play_clip(
    clip: &AudioClip,
    sink: &mut dyn AudioSink,
    mouth: &Mouth,
    visualizer: &mut MouthVisualizer,
    color: Rgb,
    config: &PlaybackConfig,
) -> Result<()> {
    debug!(
        duration_secs = clip.duration_secs(),
        frames = clip.samples.len().div_ceil(config.frame_len),
        "starting paced playback"
    );

    let mut pacer = FramePacer::new(Instant::now(), config.lead);

    for frame in clip.samples.chunks(config.frame_len) {
        let level = visualizer.level_for_frame(frame);
        mouth.show_level(level, color);

        pacer.wait();
        sink.write(frame)?;
        pacer.advance(frame.len(), clip.sample_rate);
    }

    sink.drain();
    mouth.clear();
    visualizer.reset();
    Ok(())
}
