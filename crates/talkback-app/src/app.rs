//! Event loop: stdin commands, poll ticks and synthesis outcomes.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use talkback_core::{
    capture_text, AudioPlayer, CaptureConfig, CommandFrameSource, FrameSource, ImageFileSource,
    PlaybackSession, PlaybackStatus, SpeechSynthesizer, SynthesisOutcome, SynthesisWorker,
    TalkbackError, TalkbackResult, TesseractRecognizer,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::commands::{self, Command, HELP};

/// Whether the loop keeps running after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading commands
    Continue,
    /// Exit
    Quit,
}

/// Interactive front end around one playback session
pub struct App<S, P, W> {
    session: PlaybackSession<S, P>,
    worker: SynthesisWorker,
    outcomes: mpsc::UnboundedReceiver<SynthesisOutcome>,
    capture: CaptureConfig,
    poll_interval: Duration,
    out: W,
}

impl<S, P, W> App<S, P, W>
where
    S: SpeechSynthesizer + 'static,
    P: AudioPlayer,
    W: Write,
{
    /// Wire a session to a freshly spawned synthesis worker
    pub fn new(
        session: PlaybackSession<S, P>,
        capture: CaptureConfig,
        poll_interval: Duration,
        out: W,
    ) -> Self {
        let (worker, outcomes) = SynthesisWorker::spawn(session.synthesizer());
        Self {
            session,
            worker,
            outcomes,
            capture,
            poll_interval,
            out,
        }
    }

    /// Run until `quit` or end of input, then tear everything down
    ///
    /// # Errors
    ///
    /// Returns an error if reading input or writing output fails
    pub async fn run<R>(mut self, input: R) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        writeln!(self.out, "Talkback ready. Type `help` for commands.")?;
        self.print_status()?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("End of input");
                        break;
                    };
                    if self.handle_line(&line).await? == Flow::Quit {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.on_tick()?;
                }
                Some(outcome) = self.outcomes.recv() => {
                    self.on_outcome(outcome)?;
                }
            }
        }

        info!("Quitting from state {}", self.status());
        // The worker must be idle before the temp file is cleared
        self.worker.shutdown().await;
        self.session.shutdown();
        writeln!(self.out, "Bye.")?;
        Ok(())
    }

    /// Handle one input line
    ///
    /// # Errors
    ///
    /// Returns an error if writing output fails
    pub async fn handle_line(&mut self, line: &str) -> std::io::Result<Flow> {
        match commands::parse(line) {
            Ok(Some(command)) => self.handle_command(command).await,
            Ok(None) => Ok(Flow::Continue),
            Err(word) => {
                writeln!(self.out, "Unknown command `{word}`.\n{HELP}")?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn handle_command(&mut self, command: Command) -> std::io::Result<Flow> {
        debug!("Command {:?}", command);
        match command {
            Command::Text(text) => {
                self.session.set_text(&text);
                writeln!(
                    self.out,
                    "Text set ({} characters).",
                    self.session.text_field().text().chars().count()
                )?;
            }
            Command::Speak(text) => {
                if let Some(text) = text {
                    self.session.set_text(&text);
                }
                self.speak()?;
            }
            Command::Pause => {
                self.session.pause();
                self.print_status()?;
            }
            Command::Unpause => {
                self.session.unpause();
                self.print_status()?;
            }
            Command::Toggle => {
                self.session.toggle_pause();
                self.print_status()?;
            }
            Command::Stop => {
                self.session.stop();
                self.print_status()?;
            }
            Command::Capture(path) => self.capture(path).await?,
            Command::Status => self.print_status()?,
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn speak(&mut self) -> std::io::Result<()> {
        if let Some(ticket) = self.session.begin_speak() {
            if let Err(e) = self.worker.submit(ticket.clone()) {
                self.session.complete_speak(&ticket, Err(e));
            }
        }
        self.print_status()
    }

    async fn capture(&mut self, path: Option<PathBuf>) -> std::io::Result<()> {
        let mut source: Box<dyn FrameSource + Send> = match self.frame_source(path) {
            Ok(source) => source,
            Err(e) => {
                writeln!(self.out, "Capture failed: {e}")?;
                return Ok(());
            }
        };
        let recognizer = TesseractRecognizer::new()
            .with_program(&self.capture.recognizer)
            .with_language(&self.capture.language);

        writeln!(self.out, "Capturing...")?;
        let result = tokio::task::spawn_blocking(move || capture_text(source.as_mut(), &recognizer))
            .await
            .unwrap_or_else(|e| Err(TalkbackError::from(e)));

        match result {
            Ok(text) if text.is_empty() => writeln!(self.out, "No text found in the image.")?,
            Ok(text) => {
                self.session.set_text(&text);
                info!("Captured {} characters of text", text.chars().count());
                writeln!(self.out, "Captured text:\n{}", self.session.text_field().text())?;
                if self.capture.speak_after_capture {
                    self.speak()?;
                }
            }
            Err(e) => {
                warn!("Capture failed: {}", e);
                writeln!(self.out, "Capture failed: {e}")?;
            }
        }
        Ok(())
    }

    fn frame_source(&self, path: Option<PathBuf>) -> TalkbackResult<Box<dyn FrameSource + Send>> {
        if let Some(path) = path {
            return Ok(Box::new(ImageFileSource::new(path)));
        }
        let Some(command) = &self.capture.command else {
            return Err(TalkbackError::capture(
                "No camera configured; set capture.command or pass an image path",
            ));
        };
        let source = CommandFrameSource::new(command.clone(), self.capture.args.clone())?;
        Ok(Box::new(source))
    }

    /// Poll tick: print the status when playback finishes
    ///
    /// # Errors
    ///
    /// Returns an error if writing output fails
    pub fn on_tick(&mut self) -> std::io::Result<()> {
        let before = self.session.status();
        if self.session.poll() != before {
            self.print_status()?;
        }
        Ok(())
    }

    /// Hand a worker result to the session
    ///
    /// # Errors
    ///
    /// Returns an error if writing output fails
    pub fn on_outcome(&mut self, outcome: SynthesisOutcome) -> std::io::Result<()> {
        let pending = self.session.is_pending();
        self.session.complete_speak(&outcome.ticket, outcome.result);
        if pending && !self.session.is_pending() {
            self.print_status()?;
        }
        Ok(())
    }

    fn print_status(&mut self) -> std::io::Result<()> {
        writeln!(
            self.out,
            "[{}] {}",
            self.session.status(),
            self.session.status_message()
        )
    }

    /// Current session status
    #[must_use]
    pub fn status(&self) -> PlaybackStatus {
        self.session.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use talkback_core::{SpeechProperties, TempAudioFile};
    use tempfile::TempDir;

    #[derive(Default)]
    struct EchoSynth(SpeechProperties);

    impl SpeechSynthesizer for EchoSynth {
        fn synthesize_to_file(&mut self, text: &str, path: &Path) -> TalkbackResult<()> {
            if text.contains("fail") {
                return Err(TalkbackError::synthesis("engine refused"));
            }
            std::fs::write(path, text)?;
            Ok(())
        }

        fn set_properties(&mut self, properties: SpeechProperties) -> TalkbackResult<()> {
            self.0 = properties;
            Ok(())
        }

        fn properties(&self) -> SpeechProperties {
            self.0.clone()
        }
    }

    #[derive(Clone, Default)]
    struct FlagPlayer(Arc<AtomicBool>);

    impl AudioPlayer for FlagPlayer {
        fn load(&mut self, _path: &Path) -> TalkbackResult<()> {
            Ok(())
        }
        fn play(&mut self) -> TalkbackResult<()> {
            self.0.store(true, Ordering::SeqCst);
            Ok(())
        }
        fn pause(&mut self) -> TalkbackResult<()> {
            Ok(())
        }
        fn resume(&mut self) -> TalkbackResult<()> {
            Ok(())
        }
        fn stop(&mut self) -> TalkbackResult<()> {
            self.0.store(false, Ordering::SeqCst);
            Ok(())
        }
        fn is_busy(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn app_with_output<W: Write>(
        dir: &TempDir,
        player: FlagPlayer,
        out: W,
    ) -> App<EchoSynth, FlagPlayer, W> {
        let session = PlaybackSession::new(
            EchoSynth::default(),
            player,
            TempAudioFile::new(dir.path().join("speech.wav")),
        );
        App::new(
            session,
            CaptureConfig::default(),
            Duration::from_millis(100),
            out,
        )
    }

    fn app(dir: &TempDir, player: FlagPlayer) -> App<EchoSynth, FlagPlayer, Vec<u8>> {
        app_with_output(dir, player, Vec::new())
    }

    fn output(app: &App<EchoSynth, FlagPlayer, Vec<u8>>) -> String {
        String::from_utf8_lossy(&app.out).into_owned()
    }

    #[tokio::test]
    async fn test_speak_through_worker_then_finish() {
        let dir = TempDir::new().unwrap();
        let player = FlagPlayer::default();
        let mut app = app(&dir, player.clone());

        assert_eq!(app.handle_line("speak hello").await.unwrap(), Flow::Continue);
        assert!(output(&app).contains("Synthesizing speech..."));

        let outcome = app.outcomes.recv().await.unwrap();
        app.on_outcome(outcome).unwrap();
        assert_eq!(app.status(), PlaybackStatus::Speaking);
        assert!(output(&app).contains("[Speaking] Playing speech..."));

        player.0.store(false, Ordering::SeqCst);
        app.on_tick().unwrap();
        assert_eq!(app.status(), PlaybackStatus::Idle);
        assert!(output(&app).contains("[Idle] Click the button to hear the text"));
    }

    #[tokio::test]
    async fn test_engine_error_is_printed() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, FlagPlayer::default());

        app.handle_line("speak please fail").await.unwrap();
        let outcome = app.outcomes.recv().await.unwrap();
        app.on_outcome(outcome).unwrap();

        assert_eq!(app.status(), PlaybackStatus::Idle);
        assert!(output(&app).contains("Error: Speech synthesis failed: engine refused"));
    }

    #[tokio::test]
    async fn test_blank_speak_and_unknown_command() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, FlagPlayer::default());

        app.handle_line("speak").await.unwrap();
        assert!(output(&app).contains("Please enter some text!"));

        app.handle_line("dance").await.unwrap();
        assert!(output(&app).contains("Unknown command `dance`"));
        assert_eq!(app.handle_line("quit").await.unwrap(), Flow::Quit);
    }

    #[tokio::test]
    async fn test_capture_without_camera_reports_failure() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, FlagPlayer::default());

        app.handle_line("capture").await.unwrap();
        assert!(output(&app).contains("Capture failed: Capture error: No camera configured"));
        assert_eq!(app.status(), PlaybackStatus::Idle);
    }

    #[tokio::test]
    async fn test_run_until_end_of_input() {
        let dir = TempDir::new().unwrap();
        let input: &[u8] = b"text hello\nstatus\n";

        let mut buffer = Vec::new();
        let app = app_with_output(&dir, FlagPlayer::default(), &mut buffer);
        app.run(input).await.unwrap();

        let printed = String::from_utf8(buffer).unwrap();
        assert!(printed.starts_with("Talkback ready."));
        assert!(printed.contains("Text set (5 characters)."));
        assert!(printed.trim_end().ends_with("Bye."));
        assert!(!dir.path().join("speech.wav").exists());
    }

    #[tokio::test]
    async fn test_quit_during_synthesis_leaves_no_audio_file() {
        let dir = TempDir::new().unwrap();
        let input: &[u8] = b"speak hello
quit
";

        let mut buffer = Vec::new();
        let app = app_with_output(&dir, FlagPlayer::default(), &mut buffer);
        app.run(input).await.unwrap();

        let printed = String::from_utf8(buffer).unwrap();
        assert!(printed.contains("Synthesizing speech..."));
        assert!(printed.trim_end().ends_with("Bye."));
        assert!(!dir.path().join("speech.wav").exists());
    }
}
