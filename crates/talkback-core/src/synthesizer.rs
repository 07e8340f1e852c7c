//! Speech synthesizer seam and the espeak-ng backend.
//!
//! The session never synthesizes audio itself: it hands text to a
//! [`SpeechSynthesizer`], which writes an audio file at the requested path
//! and blocks until the file is complete.

use crate::error::{TalkbackError, TalkbackResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Lowest accepted speech rate in words per minute
pub const MIN_RATE: u32 = 80;

/// Highest accepted speech rate in words per minute
pub const MAX_RATE: u32 = 450;

/// Speech properties applied to every synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechProperties {
    /// Speaking rate in words per minute
    pub rate: u32,
    /// Volume level (0.0 to 1.0)
    pub volume: f32,
    /// Engine voice name (None for the engine default)
    pub voice: Option<String>,
}

impl Default for SpeechProperties {
    fn default() -> Self {
        Self {
            rate: crate::DEFAULT_RATE,
            volume: crate::DEFAULT_VOLUME,
            voice: None,
        }
    }
}

impl SpeechProperties {
    /// Set the speaking rate
    ///
    /// # Errors
    ///
    /// Returns an error if rate is outside `MIN_RATE..=MAX_RATE`
    pub fn with_rate(mut self, rate: u32) -> TalkbackResult<Self> {
        if !(MIN_RATE..=MAX_RATE).contains(&rate) {
            return Err(TalkbackError::invalid_input(format!(
                "Rate must be between {MIN_RATE} and {MAX_RATE} words per minute, got {rate}"
            )));
        }
        self.rate = rate;
        Ok(self)
    }

    /// Set the volume level
    ///
    /// # Errors
    ///
    /// Returns an error if volume is not in valid range (0.0 to 1.0)
    pub fn with_volume(mut self, volume: f32) -> TalkbackResult<Self> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(TalkbackError::invalid_input(format!(
                "Volume must be between 0.0 and 1.0, got {volume}"
            )));
        }
        self.volume = volume;
        Ok(self)
    }

    /// Set the engine voice
    #[must_use]
    pub fn with_voice<S: Into<String>>(mut self, voice: S) -> Self {
        self.voice = Some(voice.into());
        self
    }

    /// Validate speech properties
    ///
    /// # Errors
    ///
    /// Returns an error if rate or volume is out of range
    pub fn validate(&self) -> TalkbackResult<()> {
        self.clone().with_rate(self.rate)?.with_volume(self.volume)?;
        Ok(())
    }

    /// espeak-ng amplitude (0 to 100 for volumes 0.0 to 1.0)
    #[must_use]
    pub fn amplitude(&self) -> u32 {
        // Clamped to 0.0..=1.0, so the product fits in 0..=100
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let amplitude = (self.volume.clamp(0.0, 1.0) * 100.0).round() as u32;
        amplitude
    }
}

/// Text-to-speech engine that renders an utterance into an audio file
#[cfg_attr(test, mockall::automock)]
pub trait SpeechSynthesizer: Send {
    /// Synthesize `text` into an audio file at `path`, blocking until done
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails or produces no output
    fn synthesize_to_file(&mut self, text: &str, path: &Path) -> TalkbackResult<()>;

    /// Replace the speech properties used for subsequent syntheses
    ///
    /// # Errors
    ///
    /// Returns an error if the properties are out of range
    fn set_properties(&mut self, properties: SpeechProperties) -> TalkbackResult<()>;

    /// Current speech properties
    fn properties(&self) -> SpeechProperties;
}

/// Synthesizer backed by the `espeak-ng` command line program
#[derive(Debug, Clone)]
pub struct EspeakSynthesizer {
    program: PathBuf,
    properties: SpeechProperties,
}

impl EspeakSynthesizer {
    /// Default engine executable name
    pub const DEFAULT_PROGRAM: &'static str = "espeak-ng";

    /// Create a synthesizer using `espeak-ng` from `PATH`
    #[must_use]
    pub fn new() -> Self {
        Self::with_program(Self::DEFAULT_PROGRAM)
    }

    /// Create a synthesizer using a specific engine executable
    #[must_use]
    pub fn with_program<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
            properties: SpeechProperties::default(),
        }
    }

    /// Engine executable
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Build the engine command line for one utterance
    #[must_use]
    pub fn command_args(&self, text: &str, path: &Path) -> Vec<String> {
        let mut args = vec![
            "-s".to_string(),
            self.properties.rate.to_string(),
            "-a".to_string(),
            self.properties.amplitude().to_string(),
        ];
        if let Some(voice) = &self.properties.voice {
            args.push("-v".to_string());
            args.push(voice.clone());
        }
        args.push("-w".to_string());
        args.push(path.display().to_string());
        // Text after "--" so a leading dash is not read as an option
        args.push("--".to_string());
        args.push(text.to_string());
        args
    }
}

impl Default for EspeakSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechSynthesizer for EspeakSynthesizer {
    fn synthesize_to_file(&mut self, text: &str, path: &Path) -> TalkbackResult<()> {
        if text.trim().is_empty() {
            return Err(TalkbackError::invalid_input("Text cannot be empty"));
        }

        debug!("Synthesizing {} characters to {:?}", text.chars().count(), path);

        let output = Command::new(&self.program)
            .args(self.command_args(text, path))
            .output()
            .map_err(|e| {
                TalkbackError::synthesis(format!(
                    "Failed to run {}: {e}",
                    self.program.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TalkbackError::synthesis(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        if !path.exists() {
            return Err(TalkbackError::synthesis(format!(
                "{} produced no audio at {}",
                self.program.display(),
                path.display()
            )));
        }

        info!("Synthesized speech to {:?}", path);
        Ok(())
    }

    fn set_properties(&mut self, properties: SpeechProperties) -> TalkbackResult<()> {
        properties.validate()?;
        debug!("Speech properties set to {:?}", properties);
        self.properties = properties;
        Ok(())
    }

    fn properties(&self) -> SpeechProperties {
        self.properties.clone()
    }
}
