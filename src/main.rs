use anyhow::Result;
use patter::audio::{AudioSink, WavSink, DEFAULT_SAMPLE_RATE};
use patter::config::PipelineConfig;
use patter::pipeline::VoicePipeline;
use patter::providers::{ScriptedTokenSource, ToneSynthesizer};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_RESPONSE: &str = "Here is a short answer. And now a noticeably longer \
follow-up sentence that keeps going until the growing length threshold lets the \
segmenter cut it loose for synthesis. A final fragment trails off";

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "patter=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Patter voice pipeline demo");

    let prompt: String = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let prompt = if prompt.is_empty() {
        "tell me something interesting".to_string()
    } else {
        prompt
    };

    // A scripted stream and tone synthesizer stand in for the model services
    let source = ScriptedTokenSource::from_text(DEMO_RESPONSE)
        .with_delay(Duration::from_millis(20));
    let synthesizer = Arc::new(ToneSynthesizer::new(DEFAULT_SAMPLE_RATE));

    let pipeline = VoicePipeline::new(PipelineConfig::default(), synthesizer);
    let report = pipeline.run(Box::new(source), open_sink()?, &prompt)?;

    info!(
        sentences = report.sentences,
        played = report.playback.played,
        skipped = report.playback.skipped.len(),
        "Demo session finished"
    );
    Ok(())
}

#[cfg(feature = "audio-io")]
fn open_sink() -> Result<Box<dyn AudioSink>> {
    use patter::audio::DeviceSink;
    use tracing::warn;

    match DeviceSink::open(DEFAULT_SAMPLE_RATE) {
        Ok(sink) => Ok(Box::new(sink)),
        Err(e) => {
            warn!(error = %e, "No audio device; writing playback to patter-session.wav");
            Ok(Box::new(WavSink::create(
                "patter-session.wav",
                DEFAULT_SAMPLE_RATE,
            )?))
        }
    }
}

#[cfg(not(feature = "audio-io"))]
fn open_sink() -> Result<Box<dyn AudioSink>> {
    info!("Audio output disabled; writing playback to patter-session.wav");
    Ok(Box::new(WavSink::create(
        "patter-session.wav",
        DEFAULT_SAMPLE_RATE,
    )?))
}
