//! Synthesis dispatcher
//!
//! A fixed pool of worker threads runs the blocking synthesis call so a
//! slow sentence never stalls segmentation. Admission is FIFO over a shared
//! job channel; results go straight to the playback sequencer, which owns
//! all ordering concerns.

use crate::providers::Synthesizer;
use crate::segment::Sentence;
use crate::sequence::SequencerHandle;
use crate::{PatterError, Result};
use crossbeam_channel::{unbounded, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info};

/// Default number of concurrent synthesis workers
pub const DEFAULT_WORKERS: usize = 16;

/// Worker pool dispatching sentences to speech synthesis
pub struct SynthesisPool {
    job_tx: Sender<Sentence>,
    workers: Vec<JoinHandle<()>>,
}

impl SynthesisPool {
    /// Start `worker_count` workers sharing one synthesizer
    ///
    /// Each completed (or failed) job is delivered to `sequencer` tagged
    /// with its sentence index; completion order is unconstrained.
    pub fn start(
        synthesizer: Arc<dyn Synthesizer>,
        worker_count: usize,
        sequencer: SequencerHandle,
    ) -> Self {
        let (job_tx, job_rx) = unbounded::<Sentence>();

        let workers = (0..worker_count)
            .map(|worker| {
                let job_rx = job_rx.clone();
                let synthesizer = Arc::clone(&synthesizer);
                let sequencer = sequencer.clone();

                thread::spawn(move || {
                    while let Ok(sentence) = job_rx.recv() {
                        debug!(
                            worker,
                            index = sentence.index,
                            chars = sentence.text.chars().count(),
                            "Synthesizing sentence"
                        );
                        let result = synthesizer.synthesize(&sentence.text);
                        sequencer.deliver(sentence.index, result);
                    }
                })
            })
            .collect();

        info!(worker_count, "Synthesis pool started");
        Self { job_tx, workers }
    }

    /// Enqueue a sentence; returns immediately
    pub fn submit(&self, sentence: Sentence) -> Result<()> {
        self.job_tx
            .send(sentence)
            .map_err(|e| PatterError::ChannelError(format!("Synthesis queue closed: {}", e)))
    }

    /// Stop accepting work and wait for outstanding jobs to resolve
    pub fn shutdown(self) {
        drop(self.job_tx);
        for worker in self.workers {
            let _ = worker.join();
        }
        debug!("Synthesis pool stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioClip, MemorySink};
    use crate::sequence::PlaybackSequencer;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Encodes the sentence text as the "audio" so tests can see what played
    struct EchoSynthesizer {
        /// Per-call sleep schedule, indexed by admission order
        delays_ms: Vec<u64>,
        calls: AtomicUsize,
    }

    impl EchoSynthesizer {
        fn new(delays_ms: Vec<u64>) -> Self {
            Self {
                delays_ms,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Synthesizer for EchoSynthesizer {
        fn synthesize(&self, sentence: &str) -> Result<AudioClip> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(&ms) = self.delays_ms.get(call) {
                std::thread::sleep(Duration::from_millis(ms));
            }
            if sentence.contains("fail") {
                return Err(PatterError::SynthesisError("refused".into()));
            }
            Ok(AudioClip::new(sentence.as_bytes().to_vec(), 24_000))
        }
    }

    fn played_text(writes: Vec<Vec<u8>>) -> Vec<String> {
        writes
            .into_iter()
            .map(|w| String::from_utf8(w).unwrap())
            .collect()
    }

    #[test]
    fn test_out_of_order_completion_plays_in_order() {
        let sink = MemorySink::new();
        let log = sink.log();
        let sequencer = PlaybackSequencer::start(Box::new(sink), None);

        // First-admitted sentence finishes last
        let synth = Arc::new(EchoSynthesizer::new(vec![150, 75, 0]));
        let pool = SynthesisPool::start(synth, 3, sequencer.handle());

        pool.submit(Sentence::new("first.".into(), 0)).unwrap();
        pool.submit(Sentence::new("second.".into(), 1)).unwrap();
        pool.submit(Sentence::new("third.".into(), 2)).unwrap();
        sequencer.set_total(3);

        pool.shutdown();
        let report = sequencer.wait().unwrap();
        assert_eq!(report.played, 3);
        assert_eq!(played_text(log.writes()), vec!["first.", "second.", "third."]);
    }

    #[test]
    fn test_failed_job_delivers_error() {
        let sink = MemorySink::new();
        let log = sink.log();
        let sequencer = PlaybackSequencer::start(Box::new(sink), None);

        let synth = Arc::new(EchoSynthesizer::new(Vec::new()));
        let pool = SynthesisPool::start(synth, 2, sequencer.handle());

        pool.submit(Sentence::new("good one.".into(), 0)).unwrap();
        pool.submit(Sentence::new("this will fail.".into(), 1)).unwrap();
        pool.submit(Sentence::new("another good one.".into(), 2)).unwrap();
        sequencer.set_total(3);

        pool.shutdown();
        let report = sequencer.wait().unwrap();
        assert_eq!(report.played, 2);
        assert_eq!(report.skipped, vec![1]);
        assert_eq!(
            played_text(log.writes()),
            vec!["good one.", "another good one."]
        );
    }

    #[test]
    fn test_single_worker_is_fifo() {
        let sink = MemorySink::new();
        let log = sink.log();
        let sequencer = PlaybackSequencer::start(Box::new(sink), None);

        let synth = Arc::new(EchoSynthesizer::new(Vec::new()));
        let pool = SynthesisPool::start(synth, 1, sequencer.handle());

        for (i, text) in ["a.", "b.", "c.", "d."].iter().enumerate() {
            pool.submit(Sentence::new(text.to_string(), i)).unwrap();
        }
        sequencer.set_total(4);

        pool.shutdown();
        sequencer.wait().unwrap();
        assert_eq!(played_text(log.writes()), vec!["a.", "b.", "c.", "d."]);
    }
}
