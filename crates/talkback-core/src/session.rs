//! Playback session controller.
//!
//! Translates button presses into synthesizer and player calls and keeps the
//! user-visible status label in step with the result:
//!
//! ```text
//!            speak (text)              poll: not busy / stop
//!   Idle ────────────────────▶ Speaking ──────────────────────▶ Idle
//!                               │    ▲
//!                         pause │    │ unpause
//!                               ▼    │
//!                               Paused ─── stop ──▶ Idle
//! ```
//!
//! Every failure from the synthesizer or the player is caught here, turned
//! into an `Error: ...` status and leaves the session Idle.

use crate::error::{TalkbackError, TalkbackResult};
use crate::player::AudioPlayer;
use crate::synthesizer::{SpeechProperties, SpeechSynthesizer};
use crate::temp_audio::TempAudioFile;
use crate::text_input::TextField;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Status shown while nothing is playing
pub const IDLE_MESSAGE: &str = "Click the button to hear the text";
/// Status shown when speak is pressed with a blank field
pub const EMPTY_INPUT_MESSAGE: &str = "Please enter some text!";
/// Status shown while an utterance is being synthesized
pub const SYNTHESIZING_MESSAGE: &str = "Synthesizing speech...";
/// Status shown while an utterance is playing
pub const PLAYING_MESSAGE: &str = "Playing speech...";
/// Status shown after pause
pub const PAUSED_MESSAGE: &str = "Paused";
/// Status shown after unpause
pub const RESUMED_MESSAGE: &str = "Resumed";
/// Status shown after an explicit stop
pub const STOPPED_MESSAGE: &str = "Stopped";

/// Synthesizer handle shared between the session and the synthesis worker
pub type SharedSynthesizer<S> = Arc<Mutex<S>>;

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// Nothing playing
    Idle,
    /// The current utterance is playing
    Speaking,
    /// The current utterance is paused
    Paused,
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Speaking => write!(f, "Speaking"),
            Self::Paused => write!(f, "Paused"),
        }
    }
}

/// One accepted utterance request.
///
/// Only the ticket with the newest generation may start playback; results
/// for older tickets are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakTicket {
    generation: u64,
    text: String,
    path: PathBuf,
}

impl SpeakTicket {
    /// Request generation, increasing with every accepted speak
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Trimmed text to synthesize
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Audio file the synthesizer must write
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Owns the engine handles and the state machine for one running app
pub struct PlaybackSession<S, P> {
    synthesizer: SharedSynthesizer<S>,
    player: P,
    temp_audio: TempAudioFile,
    text_field: TextField,
    status: PlaybackStatus,
    message: String,
    generation: u64,
    pending: Option<u64>,
}

impl<S: SpeechSynthesizer, P: AudioPlayer> PlaybackSession<S, P> {
    /// Create an idle session
    pub fn new(synthesizer: S, player: P, temp_audio: TempAudioFile) -> Self {
        info!("Creating playback session, audio file {:?}", temp_audio.path());
        Self {
            synthesizer: Arc::new(Mutex::new(synthesizer)),
            player,
            temp_audio,
            text_field: TextField::new(),
            status: PlaybackStatus::Idle,
            message: IDLE_MESSAGE.to_string(),
            generation: 0,
            pending: None,
        }
    }

    /// Current state
    #[must_use]
    pub const fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// Current status label
    #[must_use]
    pub fn status_message(&self) -> &str {
        &self.message
    }

    /// Whether a synthesis request is waiting for its result
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Text entry
    #[must_use]
    pub const fn text_field(&self) -> &TextField {
        &self.text_field
    }

    /// Replace the text entry contents (truncated at entry)
    pub fn set_text(&mut self, text: &str) {
        self.text_field.set_text(text);
    }

    /// Scratch audio file
    #[must_use]
    pub const fn temp_audio(&self) -> &TempAudioFile {
        &self.temp_audio
    }

    /// Synthesizer handle for a worker
    #[must_use]
    pub fn synthesizer(&self) -> SharedSynthesizer<S> {
        Arc::clone(&self.synthesizer)
    }

    /// Player
    #[must_use]
    pub const fn player(&self) -> &P {
        &self.player
    }

    /// Apply new speech properties to the synthesizer
    ///
    /// # Errors
    ///
    /// Returns an error if the properties are out of range
    pub fn set_speech_properties(&self, properties: SpeechProperties) -> TalkbackResult<()> {
        self.synthesizer.lock().set_properties(properties)
    }

    /// Speak the text field contents, synthesizing on the calling thread
    pub fn speak(&mut self) -> PlaybackStatus {
        let Some(ticket) = self.begin_speak() else {
            return self.status;
        };
        let result = self
            .synthesizer
            .lock()
            .synthesize_to_file(ticket.text(), ticket.path());
        self.complete_speak(&ticket, result)
    }

    /// Accept a speak request without synthesizing it.
    ///
    /// Returns `None` when the field is blank. Otherwise tears down any
    /// current playback, deletes the previous audio file and returns the
    /// ticket the synthesis result must be reported against.
    pub fn begin_speak(&mut self) -> Option<SpeakTicket> {
        let text = self.text_field.trimmed();
        if text.is_empty() {
            debug!("Speak ignored: no text entered");
            self.message = EMPTY_INPUT_MESSAGE.to_string();
            return None;
        }
        let text = text.to_string();

        if let Err(e) = self.player.stop() {
            warn!("Failed to stop previous playback: {}", e);
        }
        self.temp_audio.clear();
        self.status = PlaybackStatus::Idle;

        self.generation += 1;
        self.pending = Some(self.generation);
        self.message = SYNTHESIZING_MESSAGE.to_string();
        info!(
            "Speak request {} accepted ({} characters)",
            self.generation,
            text.chars().count()
        );

        Some(SpeakTicket {
            generation: self.generation,
            text,
            path: self.temp_audio.path().to_path_buf(),
        })
    }

    /// Report the synthesis result for a ticket and start playback on success
    pub fn complete_speak(
        &mut self,
        ticket: &SpeakTicket,
        result: TalkbackResult<()>,
    ) -> PlaybackStatus {
        if self.pending != Some(ticket.generation) {
            debug!(
                "Discarding result for superseded speak request {}",
                ticket.generation
            );
            return self.status;
        }
        self.pending = None;

        match result.and_then(|()| self.start_playback(ticket.path())) {
            Ok(()) => {
                info!("Speaking request {}", ticket.generation);
                self.status = PlaybackStatus::Speaking;
                self.message = PLAYING_MESSAGE.to_string();
            }
            Err(e) => self.fail(&e),
        }
        self.status
    }

    /// Pause the current utterance
    pub fn pause(&mut self) -> PlaybackStatus {
        if self.status != PlaybackStatus::Speaking {
            debug!("Pause ignored in state {}", self.status);
            return self.status;
        }
        match self.player.pause() {
            Ok(()) => {
                self.status = PlaybackStatus::Paused;
                self.message = PAUSED_MESSAGE.to_string();
            }
            Err(e) => self.fail(&e),
        }
        self.status
    }

    /// Resume a paused utterance
    pub fn unpause(&mut self) -> PlaybackStatus {
        if self.status != PlaybackStatus::Paused {
            debug!("Unpause ignored in state {}", self.status);
            return self.status;
        }
        match self.player.resume() {
            Ok(()) => {
                self.status = PlaybackStatus::Speaking;
                self.message = RESUMED_MESSAGE.to_string();
            }
            Err(e) => self.fail(&e),
        }
        self.status
    }

    /// Pause when speaking, unpause when paused
    pub fn toggle_pause(&mut self) -> PlaybackStatus {
        match self.status {
            PlaybackStatus::Speaking => self.pause(),
            PlaybackStatus::Paused => self.unpause(),
            PlaybackStatus::Idle => {
                debug!("Toggle pause ignored while idle");
                self.status
            }
        }
    }

    /// Stop playback and drop any pending request
    pub fn stop(&mut self) -> PlaybackStatus {
        if self.status == PlaybackStatus::Idle && self.pending.is_none() {
            debug!("Stop ignored while idle");
            return self.status;
        }
        self.pending = None;
        let result = self.player.stop();
        self.status = PlaybackStatus::Idle;
        match result {
            Ok(()) => self.message = STOPPED_MESSAGE.to_string(),
            Err(e) => {
                error!("Failed to stop playback: {}", e);
                self.message = format!("Error: {e}");
            }
        }
        self.status
    }

    /// Timer tick: return to Idle once the player has finished
    pub fn poll(&mut self) -> PlaybackStatus {
        if self.status == PlaybackStatus::Speaking && !self.player.is_busy() {
            info!("Playback finished");
            self.status = PlaybackStatus::Idle;
            self.message = IDLE_MESSAGE.to_string();
        }
        self.status
    }

    /// Quit: stop everything and remove the audio file
    pub fn shutdown(&mut self) {
        info!("Shutting down playback session");
        self.pending = None;
        if let Err(e) = self.player.stop() {
            warn!("Failed to stop playback on shutdown: {}", e);
        }
        self.temp_audio.clear();
        self.status = PlaybackStatus::Idle;
    }

    fn start_playback(&mut self, path: &Path) -> TalkbackResult<()> {
        self.player.load(path)?;
        self.player.play()
    }

    fn fail(&mut self, err: &TalkbackError) {
        error!("{} failure: {}", err.category(), err);
        if let Err(e) = self.player.stop() {
            warn!("Failed to stop playback after error: {}", e);
        }
        self.status = PlaybackStatus::Idle;
        self.message = format!("Error: {err}");
    }
}

impl<S, P: std::fmt::Debug> std::fmt::Debug for PlaybackSession<S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("player", &self.player)
            .field("temp_audio", &self.temp_audio)
            .field("status", &self.status)
            .field("message", &self.message)
            .field("generation", &self.generation)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::MockAudioPlayer;
    use crate::synthesizer::MockSpeechSynthesizer;
    use mockall::Sequence;
    use tempfile::TempDir;
    use test_log::test;

    fn temp_audio(dir: &TempDir) -> TempAudioFile {
        TempAudioFile::new(dir.path().join("speech.wav"))
    }

    fn writing_synth() -> MockSpeechSynthesizer {
        let mut synth = MockSpeechSynthesizer::new();
        synth
            .expect_synthesize_to_file()
            .returning(|_, path| {
                std::fs::write(path, b"RIFF")?;
                Ok(())
            });
        synth
    }

    fn permissive_player(busy: bool) -> MockAudioPlayer {
        let mut player = MockAudioPlayer::new();
        player.expect_stop().returning(|| Ok(()));
        player.expect_load().returning(|_| Ok(()));
        player.expect_play().returning(|| Ok(()));
        player.expect_pause().returning(|| Ok(()));
        player.expect_resume().returning(|| Ok(()));
        player.expect_is_busy().return_const(busy);
        player
    }

    #[test]
    fn test_new_session_is_idle() {
        let dir = TempDir::new().unwrap();
        let session = PlaybackSession::new(
            MockSpeechSynthesizer::new(),
            MockAudioPlayer::new(),
            temp_audio(&dir),
        );
        assert_eq!(session.status(), PlaybackStatus::Idle);
        assert_eq!(session.status_message(), IDLE_MESSAGE);
        assert!(!session.is_pending());
    }

    #[test]
    fn test_blank_speak_does_not_synthesize() {
        let dir = TempDir::new().unwrap();
        let mut synth = MockSpeechSynthesizer::new();
        synth.expect_synthesize_to_file().never();
        let mut player = MockAudioPlayer::new();
        player.expect_stop().never();

        let mut session = PlaybackSession::new(synth, player, temp_audio(&dir));
        session.set_text("   \t ");
        assert_eq!(session.speak(), PlaybackStatus::Idle);
        assert_eq!(session.status_message(), EMPTY_INPUT_MESSAGE);
    }

    #[test]
    fn test_speak_synthesizes_trimmed_text_then_plays() {
        let dir = TempDir::new().unwrap();
        let audio = temp_audio(&dir);
        let audio_path = audio.path().to_path_buf();
        let mut seq = Sequence::new();

        let mut synth = MockSpeechSynthesizer::new();
        let mut player = MockAudioPlayer::new();
        player
            .expect_stop()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        synth
            .expect_synthesize_to_file()
            .withf(move |text, path| text == "hello there" && path == audio_path)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        player
            .expect_load()
            .withf(|path| path.ends_with("speech.wav"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        player
            .expect_play()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));

        let mut session = PlaybackSession::new(synth, player, audio);
        session.set_text("  hello there  ");
        assert_eq!(session.speak(), PlaybackStatus::Speaking);
        assert_eq!(session.status_message(), PLAYING_MESSAGE);
        assert!(!session.is_pending());
    }

    #[test]
    fn test_poll_returns_to_idle_when_player_done() {
        let dir = TempDir::new().unwrap();
        let mut player = MockAudioPlayer::new();
        player.expect_stop().returning(|| Ok(()));
        player.expect_load().returning(|_| Ok(()));
        player.expect_play().returning(|| Ok(()));
        let mut seq = Sequence::new();
        player
            .expect_is_busy()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(true);
        player
            .expect_is_busy()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(false);

        let mut session = PlaybackSession::new(writing_synth(), player, temp_audio(&dir));
        session.set_text("hello");
        session.speak();

        assert_eq!(session.poll(), PlaybackStatus::Speaking);
        assert_eq!(session.status_message(), PLAYING_MESSAGE);
        assert_eq!(session.poll(), PlaybackStatus::Idle);
        assert_eq!(session.status_message(), IDLE_MESSAGE);
    }

    #[test]
    fn test_pause_and_unpause() {
        let dir = TempDir::new().unwrap();
        let mut session =
            PlaybackSession::new(writing_synth(), permissive_player(true), temp_audio(&dir));
        session.set_text("hello");
        session.speak();

        assert_eq!(session.pause(), PlaybackStatus::Paused);
        assert_eq!(session.status_message(), PAUSED_MESSAGE);

        // Polling never ends a paused utterance
        assert_eq!(session.poll(), PlaybackStatus::Paused);

        assert_eq!(session.unpause(), PlaybackStatus::Speaking);
        assert_eq!(session.status_message(), RESUMED_MESSAGE);
    }

    #[test]
    fn test_toggle_pause() {
        let dir = TempDir::new().unwrap();
        let mut session =
            PlaybackSession::new(writing_synth(), permissive_player(true), temp_audio(&dir));
        assert_eq!(session.toggle_pause(), PlaybackStatus::Idle);

        session.set_text("hello");
        session.speak();
        assert_eq!(session.toggle_pause(), PlaybackStatus::Paused);
        assert_eq!(session.toggle_pause(), PlaybackStatus::Speaking);
    }

    #[test]
    fn test_pause_and_unpause_ignored_outside_source_state() {
        let dir = TempDir::new().unwrap();
        let mut player = MockAudioPlayer::new();
        player.expect_pause().never();
        player.expect_resume().never();
        let mut session =
            PlaybackSession::new(MockSpeechSynthesizer::new(), player, temp_audio(&dir));

        assert_eq!(session.pause(), PlaybackStatus::Idle);
        assert_eq!(session.unpause(), PlaybackStatus::Idle);
        assert_eq!(session.status_message(), IDLE_MESSAGE);
    }

    #[test]
    fn test_stop_from_speaking_and_paused() {
        let dir = TempDir::new().unwrap();
        let mut session =
            PlaybackSession::new(writing_synth(), permissive_player(true), temp_audio(&dir));
        session.set_text("hello");

        session.speak();
        assert_eq!(session.stop(), PlaybackStatus::Idle);
        assert_eq!(session.status_message(), STOPPED_MESSAGE);

        session.speak();
        session.pause();
        assert_eq!(session.stop(), PlaybackStatus::Idle);
        assert_eq!(session.status_message(), STOPPED_MESSAGE);
    }

    #[test]
    fn test_synthesis_failure_reports_error_and_stays_idle() {
        let dir = TempDir::new().unwrap();
        let mut synth = MockSpeechSynthesizer::new();
        synth
            .expect_synthesize_to_file()
            .returning(|_, _| Err(TalkbackError::synthesis("engine crashed")));
        let mut player = MockAudioPlayer::new();
        player.expect_stop().returning(|| Ok(()));
        player.expect_load().never();
        player.expect_play().never();

        let mut session = PlaybackSession::new(synth, player, temp_audio(&dir));
        session.set_text("hello");
        assert_eq!(session.speak(), PlaybackStatus::Idle);
        assert!(session.status_message().starts_with("Error: "));
        assert!(session.status_message().contains("engine crashed"));
        assert!(!session.is_pending());
    }

    #[test]
    fn test_player_failure_reports_error_and_stays_idle() {
        let dir = TempDir::new().unwrap();
        let mut player = MockAudioPlayer::new();
        player.expect_stop().returning(|| Ok(()));
        player
            .expect_load()
            .returning(|_| Err(TalkbackError::playback("unsupported format")));
        player.expect_play().never();

        let mut session = PlaybackSession::new(writing_synth(), player, temp_audio(&dir));
        session.set_text("hello");
        assert_eq!(session.speak(), PlaybackStatus::Idle);
        assert!(session.status_message().contains("unsupported format"));
    }

    #[test]
    fn test_pause_failure_resets_to_idle() {
        let dir = TempDir::new().unwrap();
        let mut player = MockAudioPlayer::new();
        player.expect_stop().returning(|| Ok(()));
        player.expect_load().returning(|_| Ok(()));
        player.expect_play().returning(|| Ok(()));
        player
            .expect_pause()
            .returning(|| Err(TalkbackError::playback("mixer gone")));

        let mut session = PlaybackSession::new(writing_synth(), player, temp_audio(&dir));
        session.set_text("hello");
        session.speak();
        assert_eq!(session.pause(), PlaybackStatus::Idle);
        assert!(session.status_message().contains("mixer gone"));
    }

    #[test]
    fn test_second_speak_tears_down_first() {
        let dir = TempDir::new().unwrap();
        let mut synth = MockSpeechSynthesizer::new();
        synth
            .expect_synthesize_to_file()
            .times(2)
            .returning(|_, path| {
                // The previous utterance's file is gone before we write
                assert!(!path.exists());
                std::fs::write(path, b"RIFF")?;
                Ok(())
            });

        let mut player = MockAudioPlayer::new();
        let mut seq = Sequence::new();
        for _ in 0..2 {
            player
                .expect_stop()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|| Ok(()));
            player
                .expect_load()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(()));
            player
                .expect_play()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|| Ok(()));
        }

        let mut session = PlaybackSession::new(synth, player, temp_audio(&dir));
        session.set_text("first");
        assert_eq!(session.speak(), PlaybackStatus::Speaking);
        session.set_text("second");
        assert_eq!(session.speak(), PlaybackStatus::Speaking);

        let files = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, 1);
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let dir = TempDir::new().unwrap();
        let mut player = MockAudioPlayer::new();
        player.expect_stop().returning(|| Ok(()));
        player.expect_load().times(1).returning(|_| Ok(()));
        player.expect_play().times(1).returning(|| Ok(()));

        let mut session =
            PlaybackSession::new(MockSpeechSynthesizer::new(), player, temp_audio(&dir));
        session.set_text("first");
        let first = session.begin_speak().unwrap();
        session.set_text("second");
        let second = session.begin_speak().unwrap();
        assert!(second.generation() > first.generation());
        assert_eq!(session.status_message(), SYNTHESIZING_MESSAGE);

        assert_eq!(session.complete_speak(&first, Ok(())), PlaybackStatus::Idle);
        assert!(session.is_pending());
        assert_eq!(session.complete_speak(&second, Ok(())), PlaybackStatus::Speaking);
        assert_eq!(second.text(), "second");
    }

    #[test]
    fn test_stop_cancels_pending_request() {
        let dir = TempDir::new().unwrap();
        let mut player = MockAudioPlayer::new();
        player.expect_stop().returning(|| Ok(()));
        player.expect_load().never();

        let mut session =
            PlaybackSession::new(MockSpeechSynthesizer::new(), player, temp_audio(&dir));
        session.set_text("hello");
        let ticket = session.begin_speak().unwrap();
        assert_eq!(session.stop(), PlaybackStatus::Idle);
        assert_eq!(session.complete_speak(&ticket, Ok(())), PlaybackStatus::Idle);
        assert_eq!(session.status_message(), STOPPED_MESSAGE);
    }

    #[test]
    fn test_shutdown_removes_audio_file() {
        let dir = TempDir::new().unwrap();
        let mut session =
            PlaybackSession::new(writing_synth(), permissive_player(true), temp_audio(&dir));
        session.set_text("hello");
        session.speak();
        assert!(session.temp_audio().exists());

        session.shutdown();
        assert_eq!(session.status(), PlaybackStatus::Idle);
        assert!(!session.temp_audio().exists());
    }

    #[test]
    fn test_undeletable_audio_file_does_not_block_speak() {
        let dir = TempDir::new().unwrap();
        let blocked = dir.path().join("speech.wav");
        std::fs::create_dir(&blocked).unwrap();
        std::fs::write(blocked.join("keep"), b"x").unwrap();

        let mut synth = MockSpeechSynthesizer::new();
        synth
            .expect_synthesize_to_file()
            .times(1)
            .returning(|_, _| Ok(()));
        let mut session = PlaybackSession::new(
            synth,
            permissive_player(true),
            TempAudioFile::new(blocked.clone()),
        );

        session.set_text("hello");
        assert_eq!(session.speak(), PlaybackStatus::Speaking);
        assert_eq!(session.status_message(), PLAYING_MESSAGE);
        assert!(session.player().is_busy());
        assert!(blocked.is_dir());
    }

    #[test]
    fn test_set_speech_properties_forwards_to_synthesizer() {
        let dir = TempDir::new().unwrap();
        let mut synth = MockSpeechSynthesizer::new();
        synth
            .expect_set_properties()
            .withf(|props| props.rate == 200)
            .times(1)
            .returning(|_| Ok(()));
        let session = PlaybackSession::new(synth, MockAudioPlayer::new(), temp_audio(&dir));

        let props = SpeechProperties::default().with_rate(200).unwrap();
        assert!(session.set_speech_properties(props).is_ok());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(PlaybackStatus::Idle.to_string(), "Idle");
        assert_eq!(PlaybackStatus::Speaking.to_string(), "Speaking");
        assert_eq!(PlaybackStatus::Paused.to_string(), "Paused");
    }
}
