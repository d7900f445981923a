//! Playback sequencer enforcing in-order output
//!
//! Synthesis completes out of order across the worker pool; this module
//! reconciles deliveries into strict sentence order. Shared state is a map
//! of pending results plus a single monotonic cursor, guarded by one mutex.
//! A dedicated playback thread owns the sink, so only one clip ever plays
//! at a time and deliveries never block on audio I/O.

use crate::audio::sink::AudioSink;
use crate::audio::AudioClip;
use crate::pipeline::PipelineEvent;
use crate::{PatterError, Result};
use crossbeam_channel::Sender;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Outcome of one sentence's synthesis
pub type SynthesisResult = std::result::Result<AudioClip, PatterError>;

/// Summary of a completed playback session
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Number of clips actually played
    pub played: usize,

    /// Indices whose synthesis failed and were skipped
    pub skipped: Vec<usize>,

    /// Deliveries discarded for violating the sequencing protocol
    pub defects: usize,
}

struct SequencerState {
    /// Resolved results not yet playable, keyed by sequence index
    pending: HashMap<usize, SynthesisResult>,

    /// Index of the next sentence to play
    next_to_play: usize,

    /// Total sentence count, known once segmentation finishes
    expected_total: Option<usize>,

    /// Session is tearing down; stop accepting and playing
    aborted: bool,

    /// Protocol violations observed so far
    defects: usize,
}

struct Shared {
    state: Mutex<SequencerState>,
    available: Condvar,
    events: Option<Sender<PipelineEvent>>,
}

impl Shared {
    fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

/// Clonable delivery endpoint handed to synthesis workers
#[derive(Clone)]
pub struct SequencerHandle {
    shared: Arc<Shared>,
}

impl SequencerHandle {
    /// Deliver one sentence's result, from any worker, in any order
    ///
    /// An index below the cursor or already pending is a sequencing defect:
    /// logged, counted, and discarded. It never crashes the sequencer.
    pub fn deliver(&self, index: usize, result: SynthesisResult) {
        let mut state = self.shared.state.lock();
        if state.aborted {
            debug!(index, "Dropping delivery during teardown");
            return;
        }

        if index < state.next_to_play || state.pending.contains_key(&index) {
            state.defects += 1;
            warn!(
                index,
                cursor = state.next_to_play,
                "Discarding delivery that violates the sequencing protocol"
            );
            return;
        }

        if let Ok(clip) = &result {
            self.shared.emit(PipelineEvent::AudioReady {
                index,
                duration_secs: clip.duration_secs(),
            });
        }

        debug!(index, ok = result.is_ok(), "Synthesis result delivered");
        state.pending.insert(index, result);
        self.shared.available.notify_all();
    }

    /// Arm completion: the session has exactly `total` sentences
    pub fn set_total(&self, total: usize) {
        let mut state = self.shared.state.lock();
        state.expected_total = Some(total);
        self.shared.available.notify_all();
    }

    /// Tear the sequencer down without waiting for remaining sentences
    pub fn abort(&self) {
        let mut state = self.shared.state.lock();
        state.aborted = true;
        state.pending.clear();
        self.shared.available.notify_all();
    }
}

/// Owns the playback thread and the audio sink for one session
pub struct PlaybackSequencer {
    handle: SequencerHandle,
    thread: JoinHandle<Result<PlaybackReport>>,
}

impl PlaybackSequencer {
    /// Start the sequencer; the sink moves to the playback thread and is
    /// closed there on every exit path
    pub fn start(mut sink: Box<dyn AudioSink>, events: Option<Sender<PipelineEvent>>) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(SequencerState {
                pending: HashMap::new(),
                next_to_play: 0,
                expected_total: None,
                aborted: false,
                defects: 0,
            }),
            available: Condvar::new(),
            events,
        });

        let handle = SequencerHandle {
            shared: Arc::clone(&shared),
        };

        let thread = thread::spawn(move || {
            let mut report = PlaybackReport::default();
            let outcome = playback_loop(&shared, sink.as_mut(), &mut report);
            let close_outcome = sink.close();
            report.defects = shared.state.lock().defects;

            outcome?;
            close_outcome?;
            Ok(report)
        });

        Self { handle, thread }
    }

    /// Get a delivery handle for the worker pool
    pub fn handle(&self) -> SequencerHandle {
        self.handle.clone()
    }

    /// Arm completion with the final sentence count
    pub fn set_total(&self, total: usize) {
        self.handle.set_total(total);
    }

    /// Abort the session
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Wait for all sentences to play or be skipped
    pub fn wait(self) -> Result<PlaybackReport> {
        self.thread
            .join()
            .map_err(|_| PatterError::ChannelError("Playback thread panicked".into()))?
    }
}

fn playback_loop(
    shared: &Shared,
    sink: &mut dyn AudioSink,
    report: &mut PlaybackReport,
) -> Result<()> {
    loop {
        // Single critical section: check the cursor, take its result or wait
        let (index, entry) = {
            let mut state = shared.state.lock();
            loop {
                if state.aborted {
                    info!(played = report.played, "Playback aborted");
                    return Ok(());
                }
                if let Some(total) = state.expected_total {
                    if state.next_to_play >= total {
                        info!(
                            played = report.played,
                            skipped = report.skipped.len(),
                            "Playback complete"
                        );
                        return Ok(());
                    }
                }
                let cursor = state.next_to_play;
                if let Some(entry) = state.pending.remove(&cursor) {
                    break (cursor, entry);
                }
                shared.available.wait(&mut state);
            }
        };

        // Play outside the lock so deliveries keep landing while audio runs
        match entry {
            Ok(clip) => {
                debug!(index, secs = clip.duration_secs(), "Playing clip");
                if let Err(e) = sink.write(&clip.pcm) {
                    shared.state.lock().aborted = true;
                    return Err(e);
                }
                report.played += 1;
                shared.emit(PipelineEvent::Played { index });
            }
            Err(e) => {
                warn!(index, error = %e, "Skipping sentence whose synthesis failed");
                report.skipped.push(index);
                shared.emit(PipelineEvent::Skipped { index });
            }
        }

        let mut state = shared.state.lock();
        state.next_to_play += 1;
    }
}
