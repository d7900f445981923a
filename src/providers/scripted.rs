//! Scripted providers replaying fixed content
//!
//! These drive the pipeline without any model or service behind them: the
//! token source replays a fixed token list at a configurable pace, and the
//! transcriber returns a canned transcript.

use crate::providers::{StreamEvent, Transcriber, TokenSource};
use crate::{PatterError, Result};
use crossbeam_channel::Sender;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Token source replaying a fixed list of fragments
#[derive(Clone, Debug)]
pub struct ScriptedTokenSource {
    tokens: Vec<String>,

    /// Pause between fragments, simulating generation latency
    delay: Option<Duration>,
}

impl ScriptedTokenSource {
    /// Create a source that emits the given tokens back to back
    pub fn new(tokens: Vec<String>) -> Self {
        Self {
            tokens,
            delay: None,
        }
    }

    /// Split `text` into word tokens, keeping sentence-final periods as
    /// their own tokens the way completion APIs tend to emit them
    pub fn from_text(text: &str) -> Self {
        let mut tokens = Vec::new();
        for word in text.split_whitespace() {
            if let Some(stripped) = word.strip_suffix('.') {
                if !stripped.is_empty() {
                    // No trailing space: the boundary rule wants a word char
                    // right before the period
                    tokens.push(stripped.to_string());
                }
                tokens.push(".".to_string());
                tokens.push(" ".to_string());
            } else {
                tokens.push(format!("{} ", word));
            }
        }
        Self::new(tokens)
    }

    /// Pause between fragments
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl TokenSource for ScriptedTokenSource {
    fn stream(&mut self, _prompt: &str, out: &Sender<StreamEvent>) -> Result<()> {
        debug!(tokens = self.tokens.len(), "Replaying scripted token stream");
        for token in &self.tokens {
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            out.send(StreamEvent::Token(token.clone()))
                .map_err(|e| PatterError::ChannelError(format!("Token channel closed: {}", e)))?;
        }
        Ok(())
    }
}

/// Transcriber returning a canned transcript
#[derive(Clone, Debug)]
pub struct StaticTranscriber {
    transcript: String,
}

impl StaticTranscriber {
    /// Create a transcriber that always returns `transcript`
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
        }
    }
}

impl Transcriber for StaticTranscriber {
    fn transcribe(&mut self, audio: &Path) -> Result<String> {
        debug!("Returning canned transcript for {:?}", audio);
        Ok(self.transcript.clone())
    }
}
