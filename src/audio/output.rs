//! Playback sinks
//!
//! The visualizer paces frame writes itself (lip-sync lead), so a sink only
//! needs to accept frames and drain. The cpal implementation buffers frames
//! and feeds the device callback from the shared buffer.

use crate::Result;

/// Destination for paced playback frames.
///
/// Not `Send`: a sink is opened, written, and dropped on the thread playing
/// the utterance.
pub trait AudioSink {
    /// Queue one frame of mono samples.
    fn write(&mut self, frame: &[f32]) -> Result<()>;

    /// Block until queued audio has been emitted.
    fn drain(&mut self) {}
}

/// Source of playback sinks; one sink per utterance.
pub trait AudioOut: Send + Sync {
    fn open(&self, sample_rate: u32) -> Result<Box<dyn AudioSink>>;
}

#[cfg(feature = "audio-io")]
pub use cpal_out::DefaultAudioOut;

#[cfg(feature = "audio-io")]
mod cpal_out {
    use super::{AudioOut, AudioSink};
    use crate::{HeadError, Result};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;
    use tracing::{error, info, warn};

    /// Opens the host's default output device, one sink per utterance.
    #[derive(Debug, Default)]
    pub struct DefaultAudioOut;

    impl DefaultAudioOut {
        pub fn new() -> Self {
            Self
        }
    }

    impl AudioOut for DefaultAudioOut {
        fn open(&self, sample_rate: u32) -> Result<Box<dyn AudioSink>> {
            let host = cpal::default_host();

            let device = host
                .default_output_device()
                .ok_or_else(|| HeadError::AudioDevice("No output device available".into()))?;

            info!(
                "Using output device: {}",
                device.name().unwrap_or_else(|_| "Unknown".to_string())
            );

            let config: cpal::StreamConfig = device
                .default_output_config()
                .map_err(|e| {
                    HeadError::AudioDevice(format!("Failed to get output config: {e}"))
                })?
                .into();

            if config.sample_rate.0 != sample_rate {
                warn!(
                    device_rate = config.sample_rate.0,
                    clip_rate = sample_rate,
                    "output device rate differs from clip rate; playback speed will drift"
                );
            }

            let channels = config.channels as usize;
            let buffer = Arc::new(Mutex::new(Vec::<f32>::new()));
            let shared = Arc::clone(&buffer);

            let err_fn = |err| {
                error!("Audio output stream error: {err}");
            };

            let stream = device
                .build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        let mut queued = shared.lock();
                        let wanted = data.len() / channels;
                        let available = queued.len().min(wanted);

                        for (i, sample) in queued.drain(..available).enumerate() {
                            for c in 0..channels {
                                data[i * channels + c] = sample;
                            }
                        }
                        data[available * channels..].fill(0.0);
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| {
                    HeadError::AudioDevice(format!("Failed to build output stream: {e}"))
                })?;

            stream.play().map_err(|e| {
                HeadError::AudioDevice(format!("Failed to start output stream: {e}"))
            })?;

            Ok(Box::new(CpalSink { _stream: stream, buffer }))
        }
    }

    struct CpalSink {
        _stream: cpal::Stream,
        buffer: Arc<Mutex<Vec<f32>>>,
    }

    impl AudioSink for CpalSink {
        fn write(&mut self, frame: &[f32]) -> Result<()> {
            self.buffer.lock().extend_from_slice(frame);
            Ok(())
        }

        fn drain(&mut self) {
            while !self.buffer.lock().is_empty() {
                std::thread::sleep(Duration::from_millis(10));
            }
        }
    }
}
