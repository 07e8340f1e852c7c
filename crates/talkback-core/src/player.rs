//! Audio player seam and the rodio mixer backend.

use crate::error::{TalkbackError, TalkbackResult};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Playback state enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing loaded, or playback was stopped
    Stopped,
    /// Audio is currently playing
    Playing,
    /// Audio is paused
    Paused,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stopped => write!(f, "Stopped"),
            Self::Playing => write!(f, "Playing"),
            Self::Paused => write!(f, "Paused"),
        }
    }
}

/// Mixer that plays one audio file at a time.
///
/// All commands are non-blocking. Completion is observed by polling
/// [`AudioPlayer::is_busy`].
#[cfg_attr(test, mockall::automock)]
pub trait AudioPlayer {
    /// Load an audio file, replacing whatever was loaded before
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or decoded
    fn load(&mut self, path: &Path) -> TalkbackResult<()>;

    /// Start playing the loaded file
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is loaded
    fn play(&mut self) -> TalkbackResult<()>;

    /// Pause playback
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is loaded
    fn pause(&mut self) -> TalkbackResult<()>;

    /// Resume paused playback
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is loaded
    fn resume(&mut self) -> TalkbackResult<()>;

    /// Stop playback and release the loaded file
    ///
    /// # Errors
    ///
    /// Returns an error if the mixer rejects the command
    fn stop(&mut self) -> TalkbackResult<()>;

    /// Whether the player still holds unfinished audio (playing or paused)
    fn is_busy(&self) -> bool;
}

/// Player backed by a rodio output stream and sink
pub struct RodioPlayer {
    // Dropping the stream silences every sink created from it
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
    current_file: Option<PathBuf>,
}

impl RodioPlayer {
    /// Open the default output device
    ///
    /// # Errors
    ///
    /// Returns an error if no output device is available
    pub fn new() -> TalkbackResult<Self> {
        let (stream, handle) = OutputStream::try_default().map_err(|e| {
            TalkbackError::playback(format!("Failed to create audio output stream: {e}"))
        })?;
        info!("Opened default audio output stream");

        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
            current_file: None,
        })
    }

    /// Current playback state
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        match &self.sink {
            None => PlaybackState::Stopped,
            Some(sink) if sink.empty() => PlaybackState::Stopped,
            Some(sink) if sink.is_paused() => PlaybackState::Paused,
            Some(_) => PlaybackState::Playing,
        }
    }

    fn loaded_sink(&self) -> TalkbackResult<&Sink> {
        self.sink
            .as_ref()
            .ok_or_else(|| TalkbackError::playback("No audio loaded"))
    }
}

impl std::fmt::Debug for RodioPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioPlayer")
            .field("state", &self.state())
            .field("current_file", &self.current_file)
            .finish_non_exhaustive()
    }
}

impl AudioPlayer for RodioPlayer {
    fn load(&mut self, path: &Path) -> TalkbackResult<()> {
        self.stop()?;

        let file = File::open(path).map_err(|e| {
            TalkbackError::playback(format!("Failed to open audio file {}: {e}", path.display()))
        })?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| TalkbackError::playback(format!("Failed to decode audio file: {e}")))?;

        let sink = Sink::try_new(&self.handle)
            .map_err(|e| TalkbackError::playback(format!("Failed to create audio sink: {e}")))?;
        // Loaded but silent until play()
        sink.pause();
        sink.append(source);

        debug!("Loaded {:?}", path);
        self.sink = Some(sink);
        self.current_file = Some(path.to_path_buf());
        Ok(())
    }

    fn play(&mut self) -> TalkbackResult<()> {
        self.loaded_sink()?.play();
        info!("Playback started");
        Ok(())
    }

    fn pause(&mut self) -> TalkbackResult<()> {
        self.loaded_sink()?.pause();
        info!("Playback paused");
        Ok(())
    }

    fn resume(&mut self) -> TalkbackResult<()> {
        self.loaded_sink()?.play();
        info!("Playback resumed");
        Ok(())
    }

    fn stop(&mut self) -> TalkbackResult<()> {
        if let Some(sink) = self.sink.take() {
            sink.stop();
            info!("Playback stopped");
        }
        self.current_file = None;
        Ok(())
    }

    fn is_busy(&self) -> bool {
        self.sink.as_ref().is_some_and(|sink| !sink.empty())
    }
}
