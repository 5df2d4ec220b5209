//! WAV serialization for finished capture sessions.

use crate::{HeadError, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

/// Encode mono [-1, 1] samples as a 16-bit PCM WAV container in memory.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut cursor, spec)
        .map_err(|e| HeadError::Io(format!("Failed to create WAV writer: {e}")))?;

    for &sample in samples {
        let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(sample_i16)
            .map_err(|e| HeadError::Io(format!("Failed to write sample: {e}")))?;
    }

    writer
        .finalize()
        .map_err(|e| HeadError::Io(format!("Failed to finalize WAV data: {e}")))?;

    Ok(cursor.into_inner())
}
