//! Real audio device sink over cpal
//!
//! `cpal::Stream` cannot leave the thread it was created on, so the sink
//! spawns a thread that owns the device and stream and feeds it over a
//! channel. Mono PCM is fanned out to however many channels the device
//! exposes. `write` blocks until the device has drained the clip, so the
//! caller runs at real-time playback rate.

use crate::audio::pcm16_to_f32;
use crate::audio::sink::AudioSink;
use crate::{PatterError, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

enum DeviceCommand {
    /// Play samples and acknowledge once the device has drained them
    Play(Vec<f32>),
    Close,
}

/// Sink playing PCM through the default output device
pub struct DeviceSink {
    command_tx: Option<Sender<DeviceCommand>>,
    ack_rx: Receiver<Result<()>>,
    thread: Option<JoinHandle<()>>,
}

impl DeviceSink {
    /// Open the default output device at the given sample rate
    pub fn open(sample_rate: u32) -> Result<Self> {
        let (command_tx, command_rx) = bounded(1);
        let (ack_tx, ack_rx) = bounded(1);

        let thread = thread::spawn(move || {
            device_thread(sample_rate, command_rx, ack_tx);
        });

        let sink = Self {
            command_tx: Some(command_tx),
            ack_rx,
            thread: Some(thread),
        };

        // First ack reports whether the stream came up
        match sink.ack_rx.recv() {
            Ok(Ok(())) => Ok(sink),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(PatterError::AudioDeviceError(
                "Audio thread exited before opening the device".into(),
            )),
        }
    }
}

impl AudioSink for DeviceSink {
    fn write(&mut self, pcm: &[u8]) -> Result<()> {
        let command_tx = self.command_tx.as_ref().ok_or_else(|| {
            PatterError::AudioDeviceError("Device sink already closed".into())
        })?;

        command_tx
            .send(DeviceCommand::Play(pcm16_to_f32(pcm)))
            .map_err(|_| PatterError::AudioDeviceError("Audio thread is gone".into()))?;

        // Blocks at the device's real-time rate
        self.ack_rx
            .recv()
            .map_err(|_| PatterError::AudioDeviceError("Audio thread is gone".into()))?
    }

    fn close(&mut self) -> Result<()> {
        if let Some(command_tx) = self.command_tx.take() {
            let _ = command_tx.send(DeviceCommand::Close);
            if let Some(thread) = self.thread.take() {
                let _ = thread.join();
            }
            info!("Stopped audio playback");
        }
        Ok(())
    }
}

impl Drop for DeviceSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Owns the cpal device and stream for the sink's whole lifetime
fn device_thread(
    sample_rate: u32,
    command_rx: Receiver<DeviceCommand>,
    ack_tx: Sender<Result<()>>,
) {
    use cpal::traits::StreamTrait;

    let buffer: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::new()));

    let stream = match open_stream(sample_rate, Arc::clone(&buffer)) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ack_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ack_tx.send(Err(PatterError::AudioDeviceError(format!(
            "Failed to start output stream: {}",
            e
        ))));
        return;
    }

    let _ = ack_tx.send(Ok(()));

    while let Ok(command) = command_rx.recv() {
        match command {
            DeviceCommand::Play(samples) => {
                buffer.lock().extend(samples);
                // The stream callback consumes the buffer at the device rate
                while !buffer.lock().is_empty() {
                    thread::sleep(Duration::from_millis(10));
                }
                let _ = ack_tx.send(Ok(()));
            }
            DeviceCommand::Close => break,
        }
    }

    drop(stream);
    debug!("Audio device thread stopped");
}

fn open_stream(sample_rate: u32, buffer: Arc<Mutex<Vec<f32>>>) -> Result<cpal::Stream> {
    use cpal::traits::{DeviceTrait, HostTrait};
    use cpal::{SampleRate, StreamConfig};

    let host = cpal::default_host();

    let device = host
        .default_output_device()
        .ok_or_else(|| PatterError::AudioDeviceError("No output device available".into()))?;

    info!(
        "Using output device: {}",
        device.name().unwrap_or_else(|_| "Unknown".to_string())
    );

    let channels = device
        .default_output_config()
        .map_err(|e| PatterError::AudioDeviceError(format!("Failed to get output config: {}", e)))?
        .channels() as usize;

    let config = StreamConfig {
        channels: channels as u16,
        sample_rate: SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let err_fn = |err| {
        error!("Audio output stream error: {}", err);
    };

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut buf = buffer.lock();
                let samples_needed = data.len() / channels;
                let samples_available = buf.len().min(samples_needed);

                for i in 0..samples_available {
                    let sample = buf[i];
                    for c in 0..channels {
                        data[i * channels + c] = sample;
                    }
                }
                buf.drain(0..samples_available);

                // Fill the rest with silence
                for value in data.iter_mut().skip(samples_available * channels) {
                    *value = 0.0;
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| {
            PatterError::AudioDeviceError(format!("Failed to build output stream: {}", e))
        })?;

    debug!(sample_rate, channels, "Audio output stream built");
    Ok(stream)
}
