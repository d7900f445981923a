//! Configuration for a pipeline session
//!
//! Plain structs with builder methods; constructed once per session and
//! passed down to each component.

use crate::segment::SegmenterConfig;
use crate::synth::DEFAULT_WORKERS;
use crate::{PatterError, Result};

/// Configuration for the whole pipeline
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Sentence boundary rule
    pub segmenter: SegmenterConfig,

    /// Concurrent synthesis workers
    pub synth_workers: usize,

    /// Capacity of the token channel between producer and driver
    pub token_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            segmenter: SegmenterConfig::default(),
            synth_workers: DEFAULT_WORKERS,
            token_buffer: 256,
        }
    }
}

impl PipelineConfig {
    /// Set the segmenter configuration
    pub fn with_segmenter(mut self, segmenter: SegmenterConfig) -> Self {
        self.segmenter = segmenter;
        self
    }

    /// Set the synthesis worker count
    pub fn with_workers(mut self, synth_workers: usize) -> Self {
        self.synth_workers = synth_workers;
        self
    }

    /// Set the token channel capacity
    pub fn with_token_buffer(mut self, token_buffer: usize) -> Self {
        self.token_buffer = token_buffer;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.synth_workers == 0 {
            return Err(PatterError::ConfigError(
                "At least one synthesis worker is required".into(),
            ));
        }
        if self.token_buffer == 0 {
            return Err(PatterError::ConfigError(
                "Token buffer capacity must be non-zero".into(),
            ));
        }
        if self.segmenter.terminators.is_empty() {
            return Err(PatterError::ConfigError(
                "At least one sentence terminator is required".into(),
            ));
        }
        Ok(())
    }
}
