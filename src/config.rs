//! Configuration for the head rig
//!
//! All timing and geometry constants live here so the control loops stay
//! free of magic numbers. Defaults match the shipped hardware trims.

use crate::servo::ServoId;
use crate::{HeadError, Result};
use std::time::Duration;

/// One physical servo output.
///
/// `direction` is +1 or -1 and corrects mirrored mounting; `range` is the
/// valid angular span callers must clamp to before commanding the channel.
#[derive(Clone, Copy, Debug)]
pub struct ServoChannel {
    pub channel: u8,
    pub direction: i8,
    pub range: (f32, f32),
}

/// Servo bank wiring and pulse mapping.
#[derive(Clone, Debug)]
pub struct ServoConfig {
    pub left_x: ServoChannel,
    pub left_y: ServoChannel,
    pub left_lid: ServoChannel,
    pub right_x: ServoChannel,
    pub right_y: ServoChannel,
    pub right_lid: ServoChannel,

    /// Pulse width at 0 degrees, in milliseconds.
    pub min_pulse_ms: f32,
    /// Pulse width at 180 degrees, in milliseconds.
    pub max_pulse_ms: f32,
    /// PWM period in milliseconds (50 Hz servos).
    pub period_ms: f32,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            left_x: ServoChannel { channel: 0, direction: 1, range: (70.0, 110.0) },
            left_y: ServoChannel { channel: 1, direction: 1, range: (70.0, 110.0) },
            left_lid: ServoChannel { channel: 2, direction: 1, range: (0.0, 40.0) },
            right_x: ServoChannel { channel: 3, direction: 1, range: (70.0, 110.0) },
            right_y: ServoChannel { channel: 4, direction: -1, range: (70.0, 110.0) },
            right_lid: ServoChannel { channel: 5, direction: -1, range: (0.0, 40.0) },
            min_pulse_ms: 0.5,
            max_pulse_ms: 2.5,
            period_ms: 20.0,
        }
    }
}

impl ServoConfig {
    pub fn channel(&self, id: ServoId) -> &ServoChannel {
        match id {
            ServoId::LeftX => &self.left_x,
            ServoId::LeftY => &self.left_y,
            ServoId::LeftLid => &self.left_lid,
            ServoId::RightX => &self.right_x,
            ServoId::RightY => &self.right_y,
            ServoId::RightLid => &self.right_lid,
        }
    }
}

/// Eye travel limits and interpolation pacing.
#[derive(Clone, Debug)]
pub struct EyeConfig {
    pub x_limits: (f32, f32),
    pub y_limits: (f32, f32),
    /// Degrees advanced per interpolation iteration.
    pub move_step: f32,
    /// Delay between interpolation iterations.
    pub move_delay: Duration,
}

impl Default for EyeConfig {
    fn default() -> Self {
        Self {
            x_limits: (70.0, 110.0),
            y_limits: (70.0, 110.0),
            move_step: 1.0,
            move_delay: Duration::from_millis(10),
        }
    }
}

impl EyeConfig {
    pub fn x_mid(&self) -> f32 {
        (self.x_limits.0 + self.x_limits.1) / 2.0
    }

    pub fn y_mid(&self) -> f32 {
        (self.y_limits.0 + self.y_limits.1) / 2.0
    }
}

/// Eyelid sweep geometry and timing.
#[derive(Clone, Debug)]
pub struct BlinkConfig {
    /// Fully closed lid angle, shared by both lids.
    pub closed_angle: f32,
    /// Open trim for the left lid.
    pub open_left: f32,
    /// Open trim for the right lid.
    pub open_right: f32,
    /// Time per sweep step.
    pub step_delay: Duration,
    /// Lag of the trailing lid behind the leading one.
    pub side_delay: Duration,
    /// Closed-hold duration at the bottom of a blink.
    pub hold: Duration,
    /// Time the lids get to physically reach closed before the channels are
    /// de-energized for sleep.
    pub settle: Duration,
    /// Pause between the two blinks of a double blink.
    pub double_pause: Duration,
    /// Minimum spacing enforced before probability-based blinks.
    pub min_gap: Duration,
    /// Randomized seconds between auto-blinks while idle.
    pub idle_interval: (f32, f32),
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            closed_angle: 40.0,
            open_left: -12.0,
            open_right: 0.0,
            step_delay: Duration::from_millis(3),
            side_delay: Duration::from_millis(30),
            hold: Duration::from_millis(100),
            settle: Duration::from_millis(300),
            double_pause: Duration::from_millis(300),
            min_gap: Duration::from_millis(200),
            idle_interval: (7.0, 12.0),
        }
    }
}

impl BlinkConfig {
    /// Trailing-lid lag expressed in sweep steps.
    pub fn stagger_steps(&self) -> i64 {
        let step = self.step_delay.as_secs_f64();
        if step <= 0.0 {
            return 0;
        }
        (self.side_delay.as_secs_f64() / step).round() as i64
    }
}

/// Gaze loop movement scales, blink odds, and pacing per mode.
#[derive(Clone, Debug)]
pub struct GazeConfig {
    pub thinking_scale: f32,
    pub thinking_blink_prob: f64,
    pub thinking_moves: u32,
    pub thinking_pause: Duration,
    pub speaking_scale: f32,
    pub speaking_blink_prob: f64,
    /// Randomized seconds between moves while speaking.
    pub speaking_pause: (f32, f32),
    /// Randomized seconds between moves while idle.
    pub idle_pause: (f32, f32),
    /// Poll interval while holding the pose (offline or asleep).
    pub hold_poll: Duration,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            thinking_scale: 0.5,
            thinking_blink_prob: 0.3,
            thinking_moves: 2,
            thinking_pause: Duration::from_secs(1),
            speaking_scale: 0.3,
            speaking_blink_prob: 0.2,
            speaking_pause: (0.8, 1.8),
            idle_pause: (1.0, 3.0),
            hold_poll: Duration::from_millis(100),
        }
    }
}

/// Voice activity capture thresholds.
#[derive(Clone, Debug)]
pub struct CaptureConfig {
    /// Preferred capture sample rate in Hz.
    pub sample_rate: u32,
    /// RMS loudness on the 16-bit sample scale that starts recording.
    pub threshold: f32,
    /// Continuous sub-threshold span that ends recording.
    pub silence: Duration,
    /// Frame-wait timeout; bounds disarm-detection latency.
    pub poll: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            threshold: 2400.0,
            silence: Duration::from_millis(600),
            poll: Duration::from_millis(50),
        }
    }
}

/// Playback pacing and mouth response shaping.
#[derive(Clone, Debug)]
pub struct PlaybackConfig {
    /// Samples per paced playback frame.
    pub frame_len: usize,
    /// How far the visual update leads the audible frame.
    pub lead: Duration,
    /// Gain inside the log compression of RMS loudness.
    pub gain: f32,
    /// Exponential smoothing factor; higher is smoother.
    pub smoothing: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            frame_len: 512,
            lead: Duration::from_millis(70),
            gain: 55.0,
            smoothing: 0.6,
        }
    }
}

/// Mouth strip geometry and fixed colors.
#[derive(Clone, Debug)]
pub struct MouthConfig {
    /// Pixel count of the strip; must be even.
    pub pixels: usize,
    /// Default speaking color, in strip byte order.
    pub speak_color: crate::mouth::Rgb,
    /// Color for startup and idle announcements.
    pub announce_color: crate::mouth::Rgb,
    /// Alert pulse color for the offline state.
    pub alert_color: crate::mouth::Rgb,
    /// Half-period of an alert pulse.
    pub alert_period: Duration,
    /// Pulses rendered per alert.
    pub alert_pulses: u32,
}

impl Default for MouthConfig {
    fn default() -> Self {
        Self {
            pixels: 8,
            speak_color: crate::mouth::Rgb(0, 0, 255),
            announce_color: crate::mouth::Rgb(0, 255, 0),
            alert_color: crate::mouth::Rgb(255, 0, 0),
            alert_period: Duration::from_millis(250),
            alert_pulses: 3,
        }
    }
}

/// Idle announcement timing and phrase table.
#[derive(Clone, Debug)]
pub struct IdleConfig {
    /// Continuous armed-idle span before an announcement fires.
    pub threshold: Duration,
    /// Timer poll interval.
    pub tick: Duration,
    pub phrases: Vec<String>,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            threshold: Duration::from_secs(90),
            tick: Duration::from_secs(1),
            phrases: vec![
                "Ready when you are.".into(),
                "Anything I can help with?".into(),
                "I'm here whenever you need me.".into(),
                "Just say the word.".into(),
                "How can I help?".into(),
            ],
        }
    }
}

/// Status light blink cadence.
#[derive(Clone, Debug)]
pub struct IndicatorConfig {
    /// Half-period of the busy blink.
    pub blink_period: Duration,
    /// Poll interval in the steady states.
    pub poll: Duration,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            blink_period: Duration::from_millis(300),
            poll: Duration::from_millis(100),
        }
    }
}

/// Complete configuration for one head.
#[derive(Clone, Debug, Default)]
pub struct HeadConfig {
    pub servos: ServoConfig,
    pub eyes: EyeConfig,
    pub blink: BlinkConfig,
    pub gaze: GazeConfig,
    pub capture: CaptureConfig,
    pub playback: PlaybackConfig,
    pub mouth: MouthConfig,
    pub idle: IdleConfig,
    pub indicator: IndicatorConfig,
}

impl HeadConfig {
    /// Set the capture silence window.
    pub fn with_silence(mut self, silence: Duration) -> Self {
        self.capture.silence = silence;
        self
    }

    /// Set the speech-onset loudness threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.capture.threshold = threshold;
        self
    }

    /// Set the idle announcement threshold.
    pub fn with_idle_threshold(mut self, threshold: Duration) -> Self {
        self.idle.threshold = threshold;
        self
    }

    /// Validate cross-field invariants.
    pub fn validate(&self) -> Result<()> {
        if self.mouth.pixels < 2 || self.mouth.pixels % 2 != 0 {
            return Err(HeadError::Config(format!(
                "mouth strip needs an even pixel count of at least 2, got {}",
                self.mouth.pixels
            )));
        }
        if self.playback.frame_len == 0 {
            return Err(HeadError::Config("playback frame length must be non-zero".into()));
        }
        if !(0.0..1.0).contains(&self.playback.smoothing) {
            return Err(HeadError::Config(format!(
                "smoothing must be in [0, 1), got {}",
                self.playback.smoothing
            )));
        }
        if self.capture.threshold <= 0.0 {
            return Err(HeadError::Config("capture threshold must be positive".into()));
        }
        if self.eyes.move_step <= 0.0 {
            return Err(HeadError::Config("move step must be positive".into()));
        }
        if self.eyes.x_limits.0 >= self.eyes.x_limits.1
            || self.eyes.y_limits.0 >= self.eyes.y_limits.1
        {
            return Err(HeadError::Config("eye limits must span a non-empty range".into()));
        }
        if self.blink.closed_angle <= self.blink.open_left
            || self.blink.closed_angle <= self.blink.open_right
        {
            return Err(HeadError::Config(
                "closed lid angle must sit above both open trims".into(),
            ));
        }
        if self.idle.phrases.is_empty() {
            return Err(HeadError::Config("idle phrase table is empty".into()));
        }
        Ok(())
    }
}
