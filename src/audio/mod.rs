//! Audio capture, playback, and loudness helpers.

pub mod capture;
#[cfg(feature = "audio-io")]
pub mod input;
pub mod output;
pub mod wav;

pub use capture::{run_session, CaptureOutcome, CaptureSession};
pub use output::{AudioOut, AudioSink};
pub use wav::encode_wav;

#[cfg(feature = "audio-io")]
pub use input::DefaultMicrophone;
#[cfg(feature = "audio-io")]
pub use output::DefaultAudioOut;

use crossbeam_channel::Receiver;

/// Root-mean-square amplitude of a frame of [-1, 1] samples.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|&s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// RMS expressed on the 16-bit sample scale, matching the capture
/// threshold's units.
pub fn rms_i16_scale(samples: &[f32]) -> f32 {
    rms(samples) * 32768.0
}

/// An open microphone stream delivering mono frames.
///
/// Dropping the stream stops capture. Not `Send`: the stream is opened,
/// consumed, and dropped on the thread running the capture session.
pub struct MicStream {
    pub frames: Receiver<Vec<f32>>,
    pub sample_rate: u32,
    /// Keeps the underlying device stream alive.
    #[allow(dead_code)]
    guard: Box<dyn std::any::Any>,
}

impl MicStream {
    pub fn new(
        frames: Receiver<Vec<f32>>,
        sample_rate: u32,
        guard: Box<dyn std::any::Any>,
    ) -> Self {
        Self { frames, sample_rate, guard }
    }
}

/// Source of microphone streams; one stream per capture session.
pub trait Microphone: Send + Sync {
    fn open(&self) -> crate::Result<MicStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms_of_empty_frame_is_zero() {
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn test_rms_of_silence_is_zero() {
        assert_eq!(rms(&[0.0; 256]), 0.0);
    }

    #[test]
    fn test_rms_of_constant_frame() {
        let frame = vec![0.5f32; 1024];
        assert!((rms(&frame) - 0.5).abs() < 1e-6);
        assert!((rms_i16_scale(&frame) - 16384.0).abs() < 0.5);
    }

    #[test]
    fn test_rms_of_sine() {
        let frame: Vec<f32> = (0..4410)
            .map(|i| (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / 44100.0).sin())
            .collect();
        // RMS of a full-scale sine is 1/sqrt(2)
        assert!((rms(&frame) - std::f32::consts::FRAC_1_SQRT_2).abs() < 0.01);
    }
}
