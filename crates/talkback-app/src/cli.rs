//! Command line arguments.

use clap::Parser;
use std::path::PathBuf;
use talkback_core::AppConfig;

/// Talkback - type or capture text and hear it spoken
#[derive(Parser, Debug)]
#[command(
    name = "talkback",
    author,
    version,
    about = "Talkback - type or capture text and hear it spoken",
    long_about = "Interactive text-to-speech with camera text capture.\n\n\
                  Type commands on standard input (try `help`). Speech is \n\
                  synthesized with espeak-ng, text is captured with tesseract."
)]
pub struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Speaking rate in words per minute
    #[arg(long)]
    pub rate: Option<u32>,

    /// Volume between 0.0 and 1.0
    #[arg(long)]
    pub volume: Option<f32>,

    /// Engine voice name
    #[arg(long)]
    pub voice: Option<String>,

    /// Scratch audio file each utterance is written to
    #[arg(long)]
    pub temp_file: Option<PathBuf>,

    /// Completion poll period in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Args {
    /// Apply flags on top of file configuration
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(rate) = self.rate {
            config.speech.rate = rate;
        }
        if let Some(volume) = self.volume {
            config.speech.volume = volume;
        }
        if let Some(voice) = &self.voice {
            config.speech.voice = Some(voice.clone());
        }
        if let Some(path) = &self.temp_file {
            config.playback.temp_file = Some(path.clone());
        }
        if let Some(interval) = self.poll_interval_ms {
            config.playback.poll_interval_ms = interval;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags_keeps_config() {
        let args = Args::try_parse_from(["talkback"]).unwrap();
        let mut config = AppConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config, AppConfig::default());
        assert_eq!(args.log_level, "warn");
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "talkback",
            "--rate",
            "180",
            "--volume",
            "0.4",
            "--voice",
            "en-gb",
            "--temp-file",
            "/tmp/x.wav",
            "--poll-interval-ms",
            "50",
        ])
        .unwrap();
        let mut config = AppConfig::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.speech.rate, 180);
        assert!((config.speech.volume - 0.4).abs() < f32::EPSILON);
        assert_eq!(config.speech.voice.as_deref(), Some("en-gb"));
        assert_eq!(config.playback.temp_file, Some(PathBuf::from("/tmp/x.wav")));
        assert_eq!(config.playback.poll_interval_ms, 50);
    }

    #[test]
    fn test_invalid_override_caught_by_validation() {
        let args = Args::try_parse_from(["talkback", "--volume", "4"]).unwrap();
        let mut config = AppConfig::default();
        args.apply_overrides(&mut config);
        assert!(config.validate().is_err());
    }
}
