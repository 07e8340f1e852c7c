//! The single fixed-path audio file each utterance is synthesized into.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name used under the system temp directory
pub const DEFAULT_FILE_NAME: &str = "talkback_speech.wav";

/// Fixed-path scratch file rewritten for every utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempAudioFile {
    path: PathBuf,
}

impl TempAudioFile {
    /// Use a specific path
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// `talkback_speech.wav` in the system temp directory
    #[must_use]
    pub fn default_location() -> Self {
        Self::new(std::env::temp_dir().join(DEFAULT_FILE_NAME))
    }

    /// Path the synthesizer writes to
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file currently exists
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Delete the file if present.
    ///
    /// Failures are logged and swallowed. Returns whether a file was removed.
    pub fn clear(&self) -> bool {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Removed previous audio file {:?}", self.path);
                true
            }
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                warn!("Failed to remove audio file {:?}: {}", self.path, e);
                false
            }
        }
    }
}

impl Default for TempAudioFile {
    fn default() -> Self {
        Self::default_location()
    }
}
