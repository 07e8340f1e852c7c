//! Error types for the Talkback playback session.


/// Result type alias for Talkback operations
pub type TalkbackResult<T> = Result<T, TalkbackError>;

/// Main error type for Talkback operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TalkbackError {
    /// Speech synthesis failed
    #[error("Speech synthesis failed: {message}")]
    SynthesisError {
        /// Error message describing the failure
        message: String,
    },

    /// Audio playback error
    #[error("Audio playback error: {message}")]
    PlaybackError {
        /// Error message describing the playback issue
        message: String,
    },

    /// File I/O error
    #[error("File I/O error: {message}")]
    FileError {
        /// Error message describing the file operation failure
        message: String,
    },

    /// Invalid input error
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Error message describing the invalid input
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Camera or frame capture error
    #[error("Capture error: {message}")]
    CaptureError {
        /// Error message describing the capture failure
        message: String,
    },

    /// Text recognition (OCR) error
    #[error("Text recognition failed: {message}")]
    RecognitionError {
        /// Error message describing the recognition failure
        message: String,
    },

    /// Worker or channel error
    #[error("Concurrency error: {message}")]
    ConcurrencyError {
        /// Error message describing the concurrency issue
        message: String,
    },
}

impl TalkbackError {
    /// Create a new synthesis error
    #[must_use]
    pub fn synthesis<S: Into<String>>(message: S) -> Self {
        Self::SynthesisError {
            message: message.into(),
        }
    }

    /// Create a new playback error
    #[must_use]
    pub fn playback<S: Into<String>>(message: S) -> Self {
        Self::PlaybackError {
            message: message.into(),
        }
    }

    /// Create a new file error
    #[must_use]
    pub fn file<S: Into<String>>(message: S) -> Self {
        Self::FileError {
            message: message.into(),
        }
    }

    /// Create a new invalid input error
    #[must_use]
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    #[must_use]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Create a new capture error
    #[must_use]
    pub fn capture<S: Into<String>>(message: S) -> Self {
        Self::CaptureError {
            message: message.into(),
        }
    }

    /// Create a new recognition error
    #[must_use]
    pub fn recognition<S: Into<String>>(message: S) -> Self {
        Self::RecognitionError {
            message: message.into(),
        }
    }

    /// Create a new concurrency error
    #[must_use]
    pub fn concurrency<S: Into<String>>(message: S) -> Self {
        Self::ConcurrencyError {
            message: message.into(),
        }
    }

    /// Check if this error is due to invalid user input
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. } | Self::ConfigurationError { .. }
        )
    }

    /// Check if this error came from one of the external services
    /// (engine, mixer, camera or OCR program)
    #[must_use]
    pub const fn is_external(&self) -> bool {
        matches!(
            self,
            Self::SynthesisError { .. }
                | Self::PlaybackError { .. }
                | Self::CaptureError { .. }
                | Self::RecognitionError { .. }
        )
    }

    /// Get the error category for logging
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::SynthesisError { .. } => "synthesis",
            Self::PlaybackError { .. } => "playback",
            Self::FileError { .. } => "file",
            Self::InvalidInput { .. } => "input",
            Self::ConfigurationError { .. } => "configuration",
            Self::CaptureError { .. } => "capture",
            Self::RecognitionError { .. } => "recognition",
            Self::ConcurrencyError { .. } => "concurrency",
        }
    }
}

// Convert from common error types
impl From<std::io::Error> for TalkbackError {
    fn from(err: std::io::Error) -> Self {
        Self::file(err.to_string())
    }
}

impl From<toml::de::Error> for TalkbackError {
    fn from(err: toml::de::Error) -> Self {
        Self::configuration(format!("Invalid config file: {err}"))
    }
}

impl From<image::ImageError> for TalkbackError {
    fn from(err: image::ImageError) -> Self {
        Self::capture(format!("Image error: {err}"))
    }
}

impl From<tokio::task::JoinError> for TalkbackError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::concurrency(format!("Synthesis task failed: {err}"))
    }
}
