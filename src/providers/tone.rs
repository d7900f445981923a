//! Tone synthesizer
//!
//! Deterministic stand-in for a real TTS service: each sentence becomes a
//! sine tone whose duration tracks the sentence length, so the demo binary
//! produces audible, correctly ordered output with no model involved.

use crate::audio::{AudioClip, DEFAULT_SAMPLE_RATE};
use crate::providers::Synthesizer;
use crate::Result;
use std::f32::consts::PI;
use tracing::debug;

/// Synthesizer producing a sine tone per sentence
#[derive(Clone, Debug)]
pub struct ToneSynthesizer {
    sample_rate: u32,

    /// Playback time granted per character of sentence text
    secs_per_char: f32,

    /// Base pitch in Hz; each sentence shifts slightly so clips are
    /// distinguishable by ear
    base_frequency: f32,
}

impl Default for ToneSynthesizer {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            secs_per_char: 0.04,
            base_frequency: 220.0,
        }
    }
}

impl ToneSynthesizer {
    /// Create a tone synthesizer at the given sample rate
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Default::default()
        }
    }

    /// Set the playback time per character
    pub fn with_secs_per_char(mut self, secs_per_char: f32) -> Self {
        self.secs_per_char = secs_per_char;
        self
    }
}

impl Synthesizer for ToneSynthesizer {
    fn synthesize(&self, sentence: &str) -> Result<AudioClip> {
        let chars = sentence.chars().count().max(1);
        let duration = chars as f32 * self.secs_per_char;
        let sample_count = (duration * self.sample_rate as f32) as usize;

        // Vary pitch with the text so consecutive sentences sound different
        let hash: u32 = sentence.bytes().fold(0u32, |acc, b| {
            acc.wrapping_mul(31).wrapping_add(b as u32)
        });
        let frequency = self.base_frequency + (hash % 200) as f32;

        let samples: Vec<f32> = (0..sample_count)
            .map(|i| {
                let t = i as f32 / self.sample_rate as f32;
                // Short fade in/out to avoid clicks at clip edges
                let envelope = (t * 50.0).min(1.0).min((duration - t) * 50.0).max(0.0);
                (2.0 * PI * frequency * t).sin() * 0.3 * envelope
            })
            .collect();

        debug!(chars, frequency, "Synthesized tone clip");
        Ok(AudioClip::from_samples(&samples, self.sample_rate))
    }
}
