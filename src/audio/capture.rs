//! Voice activity capture
//!
//! A session waits for speech onset, accumulates frames while the speaker
//! talks, and ends after a continuous span of silence. The state machine is
//! pure and clock-injected; `run_session` wires it to a live frame channel
//! and the arm switch.

use crate::audio::rms_i16_scale;
use crate::config::CaptureConfig;
use crate::state::HeadState;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::time::Instant;
use tracing::{debug, info};

/// How a capture session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// No capture device is available; nothing was attempted.
    NoDevice,
    /// Speech never started (or the source dried up first).
    Empty,
    /// Disarmed mid-session; captured frames are kept but nothing further
    /// was recorded.
    Cancelled { samples: Vec<f32> },
    /// Silence followed speech; trailing silence is trimmed off.
    Complete { samples: Vec<f32> },
}

#[derive(Debug)]
enum Phase {
    /// Waiting for a frame loud enough to start recording.
    Waiting,
    /// Accumulating frames. `silence` marks when continuous sub-threshold
    /// input began and how long the buffer was at that point; it resets to
    /// `None` the instant loudness recovers, so a short blip never counts
    /// toward the silence window.
    Recording { silence: Option<(Instant, usize)> },
}

/// Pure capture state machine over a stream of mono frames.
#[derive(Debug)]
pub struct CaptureSession {
    config: CaptureConfig,
    phase: Phase,
    samples: Vec<f32>,
}

impl CaptureSession {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            phase: Phase::Waiting,
            samples: Vec::new(),
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.phase, Phase::Recording { .. })
    }

    /// Feed one frame at time `now`. Returns `true` once the silence window
    /// has elapsed and the session should be finished.
    pub fn push(&mut self, frame: &[f32], now: Instant) -> bool {
        let loud = rms_i16_scale(frame) >= self.config.threshold;

        match self.phase {
            Phase::Waiting => {
                if loud {
                    debug!("speech onset");
                    // The triggering frame is the first recorded frame.
                    self.samples.extend_from_slice(frame);
                    self.phase = Phase::Recording { silence: None };
                }
                false
            }
            Phase::Recording { ref mut silence } => {
                if loud {
                    *silence = None;
                    self.samples.extend_from_slice(frame);
                    return false;
                }
                let mark = silence.get_or_insert((now, self.samples.len()));
                self.samples.extend_from_slice(frame);
                now.duration_since(mark.0) >= self.config.silence
            }
        }
    }

    /// End the session after the silence window elapsed. The trailing
    /// continuous silent span is dropped so the buffer holds speech only.
    pub fn finish(self) -> CaptureOutcome {
        let mut samples = self.samples;
        if let Phase::Recording { silence: Some((_, mark)) } = self.phase {
            samples.truncate(mark);
        }
        if samples.is_empty() {
            CaptureOutcome::Empty
        } else {
            CaptureOutcome::Complete { samples }
        }
    }

    /// Abort the session. Already-captured frames are kept; nothing further
    /// is written.
    pub fn cancel(self) -> CaptureOutcome {
        if self.samples.is_empty() {
            CaptureOutcome::Empty
        } else {
            CaptureOutcome::Cancelled { samples: self.samples }
        }
    }
}

/// Run a capture session against a live frame stream.
///
/// The arm switch is observed between frame reads; the receive timeout
/// bounds disarm latency to well under 100 ms. Disarm takes priority over
/// silence detection.
pub fn run_session(
    frames: &Receiver<Vec<f32>>,
    state: &HeadState,
    config: &CaptureConfig,
) -> CaptureOutcome {
    let mut session = CaptureSession::new(config.clone());
    info!("listening for speech");

    loop {
        if !state.is_armed() || !state.is_running() {
            info!("disarmed, cancelling capture");
            return session.cancel();
        }

        match frames.recv_timeout(config.poll) {
            Ok(frame) => {
                if session.push(&frame, Instant::now()) {
                    info!("silence window elapsed, capture complete");
                    return session.finish();
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("frame source closed");
                return session.finish();
            }
        }
    }
}
