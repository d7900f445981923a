pub mod audio;
pub mod config;
pub mod pipeline;
pub mod providers;
pub mod segment;
pub mod sequence;
pub mod synth;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum PatterError {
    #[error("Transcription error: {0}")]
    TranscriptionError(String),

    #[error("Completion error: {0}")]
    CompletionError(String),

    #[error("Synthesis error: {0}")]
    SynthesisError(String),

    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for PatterError {
    fn from(e: std::io::Error) -> Self {
        PatterError::IOError(e.to_string())
    }
}

impl PatterError {
    /// Check if this error ends the whole session
    ///
    /// A failed synthesis only loses one sentence; the sequencer skips its
    /// index and playback continues. Everything else tears the pipeline down.
    pub fn is_fatal(&self) -> bool {
        match self {
            PatterError::SynthesisError(_) => false,
            PatterError::TranscriptionError(_) => true,
            PatterError::CompletionError(_) => true,
            PatterError::AudioDeviceError(_) => true,
            PatterError::ConfigError(_) => true,
            PatterError::ChannelError(_) => true,
            PatterError::IOError(_) => true,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            PatterError::TranscriptionError(_) => {
                "Speech recognition failed. Please try again.".to_string()
            }
            PatterError::CompletionError(_) => {
                "The response stream was interrupted. Please try again.".to_string()
            }
            PatterError::SynthesisError(_) => {
                "Text-to-speech failed for part of the response.".to_string()
            }
            PatterError::AudioDeviceError(_) => {
                "Audio device error. Please check your speakers.".to_string()
            }
            PatterError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            PatterError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            PatterError::IOError(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PatterError>;
