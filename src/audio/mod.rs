//! Audio types and output sinks
//!
//! Audio flows through the pipeline as raw 16-bit little-endian mono PCM.
//! Sinks own the output end: a real device (cpal), a WAV file (hound), or an
//! in-memory recorder for tests.

#[cfg(feature = "audio-io")]
pub mod device;
pub mod sink;
pub mod wav;

#[cfg(feature = "audio-io")]
pub use device::DeviceSink;
pub use sink::{AudioSink, MemorySink, MemorySinkLog};
pub use wav::WavSink;

/// Default playback sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// A synthesized audio clip ready for playback
///
/// Raw 16-bit little-endian mono PCM, the format the synthesis providers
/// produce and the sinks consume.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioClip {
    /// PCM bytes (s16le, mono)
    pub pcm: Vec<u8>,

    /// Sample rate of the audio
    pub sample_rate: u32,
}

impl AudioClip {
    /// Create a clip from raw PCM bytes
    pub fn new(pcm: Vec<u8>, sample_rate: u32) -> Self {
        Self { pcm, sample_rate }
    }

    /// Create a clip from f32 samples in the range -1.0 to 1.0
    pub fn from_samples(samples: &[f32], sample_rate: u32) -> Self {
        Self::new(f32_to_pcm16(samples), sample_rate)
    }

    /// Number of samples in this clip
    pub fn sample_count(&self) -> usize {
        self.pcm.len() / 2
    }

    /// Duration of this clip in seconds
    pub fn duration_secs(&self) -> f32 {
        self.sample_count() as f32 / self.sample_rate as f32
    }
}

/// Decode s16le PCM bytes into f32 samples in the range -1.0 to 1.0
pub fn pcm16_to_f32(pcm: &[u8]) -> Vec<f32> {
    pcm.chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / i16::MAX as f32)
        .collect()
}

/// Encode f32 samples as s16le PCM bytes
pub fn f32_to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        pcm.extend_from_slice(&sample_i16.to_le_bytes());
    }
    pcm
}
