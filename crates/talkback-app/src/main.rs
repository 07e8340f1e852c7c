//! Talkback - interactive text-to-speech with camera text capture.

use anyhow::{Context, Result};
use clap::Parser;
use talkback_core::{AppConfig, EspeakSynthesizer, PlaybackSession, RodioPlayer, SpeechSynthesizer};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod commands;

use app::App;
use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so the status label on stdout stays readable
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("Invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = AppConfig::load_or_default(args.config.as_deref())?;
    args.apply_overrides(&mut config);
    config.validate()?;
    info!("Starting talkback {}", talkback_core::VERSION);

    let mut synthesizer = EspeakSynthesizer::with_program(&config.speech.engine);
    synthesizer.set_properties(config.speech.properties())?;
    let player = RodioPlayer::new().context("No audio output available")?;

    let session = PlaybackSession::new(synthesizer, player, config.playback.temp_audio());
    let app = App::new(
        session,
        config.capture.clone(),
        config.playback.poll_interval(),
        std::io::stdout(),
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    app.run(stdin).await
}
