//! WAV file sink
//!
//! Lets the pipeline run headless: playback is written to a 16-bit mono WAV
//! file instead of a device.

use crate::audio::sink::AudioSink;
use crate::{PatterError, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

/// Sink writing PCM playback to a WAV file
pub struct WavSink {
    writer: Option<WavWriter<BufWriter<File>>>,
    path: String,
}

impl WavSink {
    /// Create a WAV sink at the given path
    pub fn create<P: AsRef<Path>>(path: P, sample_rate: u32) -> Result<Self> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let writer = WavWriter::create(path.as_ref(), spec)
            .map_err(|e| PatterError::IOError(format!("Failed to create WAV writer: {}", e)))?;

        Ok(Self {
            writer: Some(writer),
            path: path.as_ref().display().to_string(),
        })
    }
}

impl AudioSink for WavSink {
    fn write(&mut self, pcm: &[u8]) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| PatterError::IOError("WAV sink already closed".into()))?;

        for bytes in pcm.chunks_exact(2) {
            let sample = i16::from_le_bytes([bytes[0], bytes[1]]);
            writer
                .write_sample(sample)
                .map_err(|e| PatterError::IOError(format!("Failed to write sample: {}", e)))?;
        }

        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer
                .finalize()
                .map_err(|e| PatterError::IOError(format!("Failed to finalize WAV file: {}", e)))?;
            info!("Finalized WAV output: {}", self.path);
        }
        Ok(())
    }
}

impl Drop for WavSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
