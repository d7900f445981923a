//! Capability interfaces for the external collaborators
//!
//! The pipeline never talks to a speech or language model service directly;
//! it is handed implementations of these traits. The built-in providers in
//! this module are local stand-ins useful for demos and tests.

pub mod scripted;
pub mod tone;

pub use scripted::{ScriptedTokenSource, StaticTranscriber};
pub use tone::ToneSynthesizer;

use crate::audio::AudioClip;
use crate::Result;
use crossbeam_channel::Sender;
use std::path::Path;

/// An event on the token stream feeding the pipeline
#[derive(Clone, Debug)]
pub enum StreamEvent {
    /// A text fragment arrived
    Token(String),

    /// The stream ended normally
    Done,

    /// The stream broke mid-response; fatal to the session
    Failed(String),
}

/// Converts recorded audio into a text query
///
/// Blocking; fails with `TranscriptionError` on unreadable input or service
/// failure, which ends the session.
pub trait Transcriber: Send {
    /// Transcribe the audio file at `audio` to text
    fn transcribe(&mut self, audio: &Path) -> Result<String>;
}

/// Produces the completion token stream for a prompt
///
/// `stream` runs blocking on a producer thread spawned by the coordinator.
/// Implementations send a [`StreamEvent::Token`] per fragment and then
/// return; the coordinator translates the return value into
/// [`StreamEvent::Done`] or [`StreamEvent::Failed`]. Fragments already sent
/// before a failure are not retracted.
pub trait TokenSource: Send {
    /// Stream completion fragments for `prompt` into `out`
    fn stream(&mut self, prompt: &str, out: &Sender<StreamEvent>) -> Result<()>;
}

/// Converts one sentence into an audio clip
///
/// Blocking and potentially slow; shared across the dispatcher's worker
/// pool, so implementations must be `Sync`. A failure loses only the one
/// sentence.
pub trait Synthesizer: Send + Sync {
    /// Synthesize `sentence` as s16le mono PCM
    fn synthesize(&self, sentence: &str) -> Result<AudioClip>;
}
