//! Text recognition on captured frames via the `tesseract` program.

use crate::capture::FrameSource;
use crate::error::{TalkbackError, TalkbackResult};
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Extracts text from an image
pub trait TextRecognizer {
    /// Recognize the text in `image`
    ///
    /// # Errors
    ///
    /// Returns a recognition error if the OCR engine fails
    fn recognize(&self, image: &DynamicImage) -> TalkbackResult<String>;
}

/// Recognizer backed by the `tesseract` command line program
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    program: PathBuf,
    language: String,
}

impl TesseractRecognizer {
    /// Default OCR executable name
    pub const DEFAULT_PROGRAM: &'static str = "tesseract";

    /// Default recognition language
    pub const DEFAULT_LANGUAGE: &'static str = "eng";

    /// Create a recognizer using `tesseract` from `PATH`
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: PathBuf::from(Self::DEFAULT_PROGRAM),
            language: Self::DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Use a specific executable
    #[must_use]
    pub fn with_program<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.program = program.into();
        self
    }

    /// Use a specific language pack (e.g. `eng`, `deu`)
    #[must_use]
    pub fn with_language<S: Into<String>>(mut self, language: S) -> Self {
        self.language = language.into();
        self
    }

    /// Recognition language
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    fn run(&self, input: &Path) -> TalkbackResult<String> {
        let output = Command::new(&self.program)
            .arg(input)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|e| {
                TalkbackError::recognition(format!(
                    "OCR unavailable ({}): {e}",
                    self.program.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TalkbackError::recognition(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &DynamicImage) -> TalkbackResult<String> {
        let scratch = tempfile::Builder::new()
            .prefix("talkback_ocr_")
            .suffix(".png")
            .tempfile()?;
        image
            .save_with_format(scratch.path(), ImageFormat::Png)
            .map_err(|e| TalkbackError::recognition(format!("Failed to encode frame: {e}")))?;

        debug!("Running OCR on {:?}", scratch.path());
        let text = normalize_text(&self.run(scratch.path())?);
        info!("Recognized {} characters", text.chars().count());
        Ok(text)
    }
}

/// Trim recognized text and collapse runs of blank lines to one.
///
/// Trailing spaces and form feeds that OCR engines emit are dropped.
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = true;
    for line in raw.lines() {
        let line = line.trim_end_matches(|c: char| c.is_whitespace() || c == '\u{c}');
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        lines.push(if blank { "" } else { line });
        previous_blank = blank;
    }
    lines.join("\n").trim().to_string()
}

/// Capture one frame and return the text found in it
///
/// # Errors
///
/// Returns the capture or recognition error; nothing is retried
pub fn capture_text<F, R>(source: &mut F, recognizer: &R) -> TalkbackResult<String>
where
    F: FrameSource + ?Sized,
    R: TextRecognizer + ?Sized,
{
    let frame = source.capture_frame()?;
    recognizer.recognize(&frame)
}
