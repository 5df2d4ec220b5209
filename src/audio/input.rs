//! Microphone input via the default cpal device.

use crate::audio::{MicStream, Microphone};
use crate::{HeadError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::bounded;
use tracing::{debug, error, info};

/// Opens the host's default input device, one stream per capture session.
#[derive(Debug, Default)]
pub struct DefaultMicrophone;

impl DefaultMicrophone {
    pub fn new() -> Self {
        Self
    }
}

impl Microphone for DefaultMicrophone {
    fn open(&self) -> Result<MicStream> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| HeadError::AudioDevice("No input device available".into()))?;

        info!(
            "Using input device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config: cpal::StreamConfig = device
            .default_input_config()
            .map_err(|e| HeadError::AudioDevice(format!("Failed to get input config: {e}")))?
            .into();

        let sample_rate = config.sample_rate.0;
        let channels = config.channels as usize;
        let (tx, rx) = bounded(256);

        let err_fn = |err| {
            error!("Audio input stream error: {err}");
        };

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Average interleaved channels down to mono.
                    let frame = if channels == 1 {
                        data.to_vec()
                    } else {
                        data.chunks(channels)
                            .map(|f| f.iter().sum::<f32>() / channels as f32)
                            .collect()
                    };
                    if let Err(e) = tx.try_send(frame) {
                        debug!("Dropping input frame: {e}");
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| HeadError::AudioDevice(format!("Failed to build input stream: {e}")))?;

        stream
            .play()
            .map_err(|e| HeadError::AudioDevice(format!("Failed to start input stream: {e}")))?;

        Ok(MicStream::new(rx, sample_rate, Box::new(stream)))
    }
}
