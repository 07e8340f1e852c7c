//! # Talkback Core
//!
//! Playback session for a text-to-speech app with camera text capture.
//!
//! ## Features
//!
//! - Idle / Speaking / Paused session controller with user-visible status
//! - Speech synthesis through an external engine (espeak-ng)
//! - Audio playback through a rodio mixer sink
//! - Background synthesis where the newest request supersedes older ones
//! - Camera capture and OCR (tesseract) feeding the text field
//!
//! ## Example
//!
//! ```rust,no_run
//! use talkback_core::{EspeakSynthesizer, PlaybackSession, RodioPlayer, TempAudioFile};
//!
//! fn main() -> anyhow::Result<()> {
//!     let player = RodioPlayer::new()?;
//!     let mut session =
//!         PlaybackSession::new(EspeakSynthesizer::new(), player, TempAudioFile::default());
//!
//!     session.set_text("Hello, world!");
//!     session.speak();
//!     println!("{}", session.status_message());
//!
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
// Generated mocks carry no docs
#![cfg_attr(test, allow(missing_docs))]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod capture;
pub mod config;
pub mod error;
pub mod ocr;
pub mod player;
pub mod session;
pub mod synthesizer;
pub mod temp_audio;
pub mod text_input;
pub mod worker;

// Re-export main types for convenience
pub use capture::{CommandFrameSource, FrameSource, ImageFileSource};
pub use config::{AppConfig, CaptureConfig, PlaybackConfig, SpeechConfig};
pub use error::{TalkbackError, TalkbackResult};
pub use ocr::{capture_text, TesseractRecognizer, TextRecognizer};
pub use player::{AudioPlayer, PlaybackState, RodioPlayer};
pub use session::{PlaybackSession, PlaybackStatus, SharedSynthesizer, SpeakTicket};
pub use synthesizer::{EspeakSynthesizer, SpeechProperties, SpeechSynthesizer};
pub use temp_audio::TempAudioFile;
pub use text_input::TextField;
pub use worker::{SynthesisOutcome, SynthesisWorker};

/// Version information for the talkback-core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum number of characters accepted into the text field
pub const MAX_TEXT_LENGTH: usize = 5_000;

/// Default speaking rate in words per minute
pub const DEFAULT_RATE: u32 = 150;

/// Default volume level
pub const DEFAULT_VOLUME: f32 = 1.0;

/// Default completion poll period in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
