//! Pipeline coordinator for an end-to-end voice session
//!
//! Connects all components: token stream -> segmenter -> synthesis pool ->
//! playback sequencer -> audio sink. The driver loop only ever waits on the
//! token channel; synthesis and playback run on their own threads.

use crate::audio::sink::AudioSink;
use crate::config::PipelineConfig;
use crate::providers::{StreamEvent, Synthesizer, TokenSource, Transcriber};
use crate::segment::SentenceSegmenter;
use crate::sequence::{PlaybackReport, PlaybackSequencer};
use crate::synth::SynthesisPool;
use crate::{PatterError, Result};
use crossbeam_channel::{bounded, Sender};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Events emitted over the optional observer channel
#[derive(Clone, Debug)]
pub enum PipelineEvent {
    /// A session started
    SessionStarted {
        /// Session id tagging all further events
        session_id: Uuid,
    },

    /// The spoken query was transcribed
    Transcript {
        /// The transcript text
        text: String,
    },

    /// A sentence completed segmentation and was queued for synthesis
    Sentence {
        /// Sequence index of the sentence
        index: usize,
        /// The sentence text
        text: String,
    },

    /// Synthesis finished for a sentence; audio is buffered for playback
    AudioReady {
        /// Sequence index of the sentence
        index: usize,
        /// Clip duration in seconds
        duration_secs: f32,
    },

    /// A clip finished playing
    Played {
        /// Sequence index of the sentence
        index: usize,
    },

    /// A sentence was skipped because its synthesis failed
    Skipped {
        /// Sequence index of the sentence
        index: usize,
    },

    /// The session finished
    Complete {
        /// Total sentences segmented
        sentences: usize,
    },

    /// The session aborted with a fatal error
    Error {
        /// Error message
        error: String,
    },
}

/// Summary of a finished session
#[derive(Clone, Debug)]
pub struct PipelineReport {
    /// Session id
    pub session_id: Uuid,

    /// Full response text, reassembled from the token stream
    pub full_response: String,

    /// Total sentences segmented and submitted for synthesis
    pub sentences: usize,

    /// Playback outcome
    pub playback: PlaybackReport,
}

/// Coordinator owning one voice session at a time
pub struct VoicePipeline {
    config: PipelineConfig,
    synthesizer: Arc<dyn Synthesizer>,
    events: Option<Sender<PipelineEvent>>,
}

impl VoicePipeline {
    /// Create a pipeline with the given configuration and synthesizer
    pub fn new(config: PipelineConfig, synthesizer: Arc<dyn Synthesizer>) -> Self {
        Self {
            config,
            synthesizer,
            events: None,
        }
    }

    /// Attach an observer channel for progress events
    pub fn with_event_sender(mut self, events: Sender<PipelineEvent>) -> Self {
        self.events = Some(events);
        self
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    /// Transcribe a spoken query, then speak the response to it
    ///
    /// Transcription failure is fatal; the sink is released by its own Drop
    /// on that path since playback never started.
    pub fn run_from_audio(
        &self,
        transcriber: &mut dyn Transcriber,
        audio: &Path,
        token_source: Box<dyn TokenSource>,
        sink: Box<dyn AudioSink>,
    ) -> Result<PipelineReport> {
        info!("Transcribing query audio: {:?}", audio);
        let transcript = transcriber.transcribe(audio)?;
        info!(chars = transcript.chars().count(), "Transcription complete");
        self.emit(PipelineEvent::Transcript {
            text: transcript.clone(),
        });
        self.run(token_source, sink, &transcript)
    }

    /// Run one session: stream tokens for `prompt`, segment, synthesize,
    /// and play back in order
    ///
    /// Returns once every sentence has played or been skipped. The sink is
    /// closed on every exit path, including failure.
    pub fn run(
        &self,
        mut token_source: Box<dyn TokenSource>,
        sink: Box<dyn AudioSink>,
        prompt: &str,
    ) -> Result<PipelineReport> {
        self.config.validate()?;

        let session_id = Uuid::new_v4();
        info!(%session_id, "Starting voice session");
        self.emit(PipelineEvent::SessionStarted { session_id });

        let sequencer = PlaybackSequencer::start(sink, self.events.clone());
        let pool = SynthesisPool::start(
            Arc::clone(&self.synthesizer),
            self.config.synth_workers,
            sequencer.handle(),
        );

        // Token producer runs concurrently with segmentation
        let (token_tx, token_rx) = bounded(self.config.token_buffer);
        let prompt = prompt.to_string();
        let producer = thread::spawn(move || {
            let final_event = match token_source.stream(&prompt, &token_tx) {
                Ok(()) => StreamEvent::Done,
                Err(e) => StreamEvent::Failed(e.to_string()),
            };
            let _ = token_tx.send(final_event);
        });

        // Driver loop: the only thing it ever blocks on is the next token
        let mut segmenter = SentenceSegmenter::new(self.config.segmenter.clone());
        let mut full_response = String::new();
        let mut submitted = 0usize;
        let mut fatal: Option<PatterError> = None;

        loop {
            match token_rx.recv() {
                Ok(StreamEvent::Token(token)) => {
                    full_response.push_str(token.trim_end_matches('\n'));
                    if let Some(sentence) = segmenter.feed(&token) {
                        self.emit(PipelineEvent::Sentence {
                            index: sentence.index,
                            text: sentence.text.clone(),
                        });
                        if let Err(e) = pool.submit(sentence) {
                            fatal = Some(e);
                            break;
                        }
                        submitted += 1;
                    }
                }
                Ok(StreamEvent::Done) => {
                    if let Some(sentence) = segmenter.finish() {
                        self.emit(PipelineEvent::Sentence {
                            index: sentence.index,
                            text: sentence.text.clone(),
                        });
                        match pool.submit(sentence) {
                            Ok(()) => submitted += 1,
                            Err(e) => fatal = Some(e),
                        }
                    }
                    break;
                }
                Ok(StreamEvent::Failed(message)) => {
                    fatal = Some(PatterError::CompletionError(message));
                    break;
                }
                Err(_) => {
                    fatal = Some(PatterError::ChannelError(
                        "Token producer hung up without finishing".into(),
                    ));
                    break;
                }
            }
        }

        // Unblock the producer if it is still sending
        drop(token_rx);

        if let Some(error) = fatal {
            error!(%session_id, error = %error, "Session failed; tearing down");
            sequencer.abort();
            pool.shutdown();
            let _ = producer.join();
            if let Err(e) = sequencer.wait() {
                warn!(error = %e, "Playback teardown also failed");
            }
            self.emit(PipelineEvent::Error {
                error: error.to_string(),
            });
            return Err(error);
        }

        debug!(%session_id, sentences = submitted, "Token stream finished");
        sequencer.set_total(submitted);
        pool.shutdown();
        let _ = producer.join();
        let playback = sequencer.wait()?;

        info!(
            %session_id,
            sentences = submitted,
            played = playback.played,
            skipped = playback.skipped.len(),
            "Session complete"
        );
        self.emit(PipelineEvent::Complete {
            sentences: submitted,
        });

        Ok(PipelineReport {
            session_id,
            full_response,
            sentences: submitted,
            playback,
        })
    }
}
