//! Interactive command parsing.
//!
//! Each input line is one button press.

use std::path::PathBuf;

/// Help text printed for `help` and unknown commands
pub const HELP: &str = "\
Commands:
  text <words>      put <words> in the text field
  speak [words]     speak the text field (or <words>)
  pause             pause speech
  unpause           resume paused speech
  toggle            pause or resume
  stop              stop speech
  capture [image]   read text from the camera (or an image file)
  status            show the current status
  help              show this help
  quit              exit";

/// One user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replace the text field contents
    Text(String),
    /// Speak, optionally replacing the text field first
    Speak(Option<String>),
    /// Pause speech
    Pause,
    /// Resume speech
    Unpause,
    /// Pause or resume
    Toggle,
    /// Stop speech
    Stop,
    /// Capture text from the camera or an image file
    Capture(Option<PathBuf>),
    /// Print the status label
    Status,
    /// Print help
    Help,
    /// Exit the app
    Quit,
}

/// Parse one input line. Blank lines yield `None`.
///
/// # Errors
///
/// Returns the offending word when the command is unknown
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let argument = (!rest.is_empty()).then(|| rest.to_string());

    let command = match word.to_ascii_lowercase().as_str() {
        "text" => Command::Text(rest.to_string()),
        "speak" | "say" => Command::Speak(argument),
        "pause" => Command::Pause,
        "unpause" | "resume" => Command::Unpause,
        "toggle" => Command::Toggle,
        "stop" => Command::Stop,
        "capture" | "camera" => Command::Capture(argument.map(PathBuf::from)),
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => return Err(word.to_string()),
    };
    Ok(Some(command))
}
