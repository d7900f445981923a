//! Output sink capability interface
//!
//! A sink is acquired for the lifetime of one session and must be released
//! on every exit path, including failure. `close` is idempotent; `Drop`
//! implementations call it as a backstop.

use crate::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Destination for played-back PCM audio
///
/// `write` blocks while the sink consumes the clip, so playback proceeds at
/// the sink's real-time rate for device sinks.
pub trait AudioSink: Send {
    /// Write one clip of s16le PCM bytes, blocking until consumed
    fn write(&mut self, pcm: &[u8]) -> Result<()>;

    /// Release the sink; safe to call more than once
    fn close(&mut self) -> Result<()>;
}

/// Recorded state of a [`MemorySink`]
#[derive(Clone, Debug, Default)]
pub struct MemorySinkLog {
    inner: Arc<Mutex<MemoryLogState>>,
}

#[derive(Debug, Default)]
struct MemoryLogState {
    writes: Vec<Vec<u8>>,
    close_count: usize,
}

impl MemorySinkLog {
    /// All writes in the order they happened
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.inner.lock().writes.clone()
    }

    /// Number of writes so far
    pub fn write_count(&self) -> usize {
        self.inner.lock().writes.len()
    }

    /// Whether the sink has been closed at least once
    pub fn is_closed(&self) -> bool {
        self.inner.lock().close_count > 0
    }

    /// How many times close was called
    pub fn close_count(&self) -> usize {
        self.inner.lock().close_count
    }
}

/// Sink that records writes in memory
///
/// Used by the test suite to assert on playback order; also handy for
/// dry-running a pipeline without touching an audio device.
#[derive(Debug, Default)]
pub struct MemorySink {
    log: MemorySinkLog,
}

impl MemorySink {
    /// Create a new in-memory sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a handle to the recorded state, usable after the sink is moved
    pub fn log(&self) -> MemorySinkLog {
        self.log.clone()
    }
}

impl AudioSink for MemorySink {
    fn write(&mut self, pcm: &[u8]) -> Result<()> {
        self.log.inner.lock().writes.push(pcm.to_vec());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.log.inner.lock().close_count += 1;
        Ok(())
    }
}

impl Drop for MemorySink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_writes() {
        let mut sink = MemorySink::new();
        let log = sink.log();

        sink.write(&[1, 2]).unwrap();
        sink.write(&[3, 4]).unwrap();

        assert_eq!(log.writes(), vec![vec![1, 2], vec![3, 4]]);
        assert!(!log.is_closed());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut sink = MemorySink::new();
        let log = sink.log();

        sink.close().unwrap();
        sink.close().unwrap();
        assert!(log.is_closed());
    }

    #[test]
    fn test_drop_closes() {
        let log = {
            let sink = MemorySink::new();
            sink.log()
        };
        assert!(log.is_closed());
    }
}
