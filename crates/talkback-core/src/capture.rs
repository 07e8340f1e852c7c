//! One-shot frame capture for the OCR path.

use crate::error::{TalkbackError, TalkbackResult};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Placeholder replaced with the output path in capture command arguments
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Suffix of the scratch file handed to capture programs
const SCRATCH_SUFFIX: &str = ".jpg";

/// Decode an image, detecting the format from its contents
fn decode_frame(path: &Path) -> image::ImageResult<DynamicImage> {
    image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
}

/// Source of a single still frame
pub trait FrameSource {
    /// Grab one frame
    ///
    /// # Errors
    ///
    /// Returns a capture error if no frame could be produced
    fn capture_frame(&mut self) -> TalkbackResult<DynamicImage>;
}

/// Frame source that reads an existing image file
#[derive(Debug, Clone)]
pub struct ImageFileSource {
    path: PathBuf,
}

impl ImageFileSource {
    /// Read frames from `path`
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Image path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for ImageFileSource {
    fn capture_frame(&mut self) -> TalkbackResult<DynamicImage> {
        debug!("Loading frame from {:?}", self.path);
        decode_frame(&self.path).map_err(|e| {
            TalkbackError::capture(format!("Failed to load {}: {e}", self.path.display()))
        })
    }
}

/// Frame source that runs an external camera program.
///
/// The program must write one image to the path substituted for
/// [`OUTPUT_PLACEHOLDER`] in its arguments, e.g.
/// `fswebcam -r 1280x720 --no-banner {output}`.
#[derive(Debug, Clone)]
pub struct CommandFrameSource {
    program: String,
    args: Vec<String>,
}

impl CommandFrameSource {
    /// Create a source for `program` with argument template `args`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the program is empty or no argument
    /// contains the output placeholder
    pub fn new<S: Into<String>>(program: S, args: Vec<String>) -> TalkbackResult<Self> {
        let program = program.into();
        if program.trim().is_empty() {
            return Err(TalkbackError::configuration("Capture command cannot be empty"));
        }
        if !args.iter().any(|arg| arg.contains(OUTPUT_PLACEHOLDER)) {
            return Err(TalkbackError::configuration(format!(
                "Capture arguments must contain {OUTPUT_PLACEHOLDER}"
            )));
        }
        Ok(Self { program, args })
    }

    /// Arguments with the placeholder replaced by `output`
    #[must_use]
    pub fn resolved_args(&self, output: &Path) -> Vec<String> {
        let output = output.display().to_string();
        self.args
            .iter()
            .map(|arg| arg.replace(OUTPUT_PLACEHOLDER, &output))
            .collect()
    }
}

impl FrameSource for CommandFrameSource {
    fn capture_frame(&mut self) -> TalkbackResult<DynamicImage> {
        let scratch = tempfile::Builder::new()
            .prefix("talkback_frame_")
            .suffix(SCRATCH_SUFFIX)
            .tempfile()?;
        let output_path = scratch.path().to_path_buf();

        let output = Command::new(&self.program)
            .args(self.resolved_args(&output_path))
            .output()
            .map_err(|e| TalkbackError::capture(format!("Camera unavailable ({}): {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TalkbackError::capture(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let frame = decode_frame(&output_path).map_err(|e| {
            TalkbackError::capture(format!("{} produced no readable frame: {e}", self.program))
        })?;
        info!("Captured {}x{} frame", frame.width(), frame.height());
        Ok(frame)
    }
}
