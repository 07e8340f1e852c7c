//! Application configuration loaded from a TOML file.
//!
//! Every field has a default, so an absent file or an empty table is valid:
//!
//! ```toml
//! [speech]
//! rate = 150
//! volume = 1.0
//! voice = "en-us"
//! engine = "espeak-ng"
//!
//! [playback]
//! poll_interval_ms = 100
//! temp_file = "/tmp/talkback_speech.wav"
//!
//! [capture]
//! command = "fswebcam"
//! args = ["-r", "1280x720", "--no-banner", "{output}"]
//! recognizer = "tesseract"
//! language = "eng"
//! speak_after_capture = false
//! ```

use crate::error::{TalkbackError, TalkbackResult};
use crate::synthesizer::{SpeechProperties, MAX_RATE, MIN_RATE};
use crate::temp_audio::TempAudioFile;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Speech engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Words per minute
    pub rate: u32,
    /// Volume (0.0 to 1.0)
    pub volume: f32,
    /// Engine voice name
    pub voice: Option<String>,
    /// Engine executable
    pub engine: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            rate: crate::DEFAULT_RATE,
            volume: crate::DEFAULT_VOLUME,
            voice: None,
            engine: crate::synthesizer::EspeakSynthesizer::DEFAULT_PROGRAM.to_string(),
        }
    }
}

impl SpeechConfig {
    /// Speech properties described by this section
    #[must_use]
    pub fn properties(&self) -> SpeechProperties {
        SpeechProperties {
            rate: self.rate,
            volume: self.volume,
            voice: self.voice.clone(),
        }
    }
}

/// Playback settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Completion poll period in milliseconds
    pub poll_interval_ms: u64,
    /// Audio scratch file (None for the system temp directory)
    pub temp_file: Option<PathBuf>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: crate::DEFAULT_POLL_INTERVAL_MS,
            temp_file: None,
        }
    }
}

impl PlaybackConfig {
    /// Poll period
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Scratch file described by this section
    #[must_use]
    pub fn temp_audio(&self) -> TempAudioFile {
        self.temp_file
            .as_ref()
            .map_or_else(TempAudioFile::default_location, TempAudioFile::new)
    }
}

/// Camera and OCR settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera program (None disables camera capture)
    pub command: Option<String>,
    /// Camera program arguments, containing `{output}`
    pub args: Vec<String>,
    /// OCR executable
    pub recognizer: String,
    /// OCR language
    pub language: String,
    /// Speak recognized text immediately
    pub speak_after_capture: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: vec![crate::capture::OUTPUT_PLACEHOLDER.to_string()],
            recognizer: crate::ocr::TesseractRecognizer::DEFAULT_PROGRAM.to_string(),
            language: crate::ocr::TesseractRecognizer::DEFAULT_LANGUAGE.to_string(),
            speak_after_capture: false,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `[speech]`
    pub speech: SpeechConfig,
    /// `[playback]`
    pub playback: PlaybackConfig,
    /// `[capture]`
    pub capture: CaptureConfig,
}

impl AppConfig {
    /// Default config file location (`<config dir>/talkback/config.toml`)
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "Talkback", "talkback")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the text is malformed or invalid
    pub fn from_toml_str(text: &str) -> TalkbackResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid
    pub fn load(path: &Path) -> TalkbackResult<Self> {
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            TalkbackError::configuration(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Load from `path` if given, else from the default location
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is invalid
    pub fn load_or_default(path: Option<&Path>) -> TalkbackResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) => Self::load(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Validate all sections
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first invalid value
    pub fn validate(&self) -> TalkbackResult<()> {
        if !(MIN_RATE..=MAX_RATE).contains(&self.speech.rate) {
            return Err(TalkbackError::configuration(format!(
                "speech.rate must be between {MIN_RATE} and {MAX_RATE}, got {}",
                self.speech.rate
            )));
        }
        if !(0.0..=1.0).contains(&self.speech.volume) {
            return Err(TalkbackError::configuration(format!(
                "speech.volume must be between 0.0 and 1.0, got {}",
                self.speech.volume
            )));
        }
        if self.speech.engine.trim().is_empty() {
            return Err(TalkbackError::configuration("speech.engine cannot be empty"));
        }
        if self.playback.poll_interval_ms == 0 {
            return Err(TalkbackError::configuration(
                "playback.poll_interval_ms must be greater than 0",
            ));
        }
        Ok(())
    }
}
