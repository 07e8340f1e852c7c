//! Background synthesis so the event loop never blocks on the engine.
//!
//! Jobs run one at a time on tokio's blocking pool. When several requests
//! queue up while the engine is busy, only the newest is synthesized.

use crate::error::{TalkbackError, TalkbackResult};
use crate::session::{SharedSynthesizer, SpeakTicket};
use crate::synthesizer::SpeechSynthesizer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Result of one synthesis job, to be handed to
/// [`PlaybackSession::complete_speak`](crate::session::PlaybackSession::complete_speak)
#[derive(Debug)]
pub struct SynthesisOutcome {
    /// Ticket the job was submitted with
    pub ticket: SpeakTicket,
    /// Engine result
    pub result: TalkbackResult<()>,
}

/// Handle to the running synthesis task
#[derive(Debug)]
pub struct SynthesisWorker {
    jobs: mpsc::UnboundedSender<SpeakTicket>,
    closing: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl SynthesisWorker {
    /// Start the worker on the current tokio runtime.
    ///
    /// Returns the worker and the receiver its outcomes arrive on.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime
    pub fn spawn<S>(synthesizer: SharedSynthesizer<S>) -> (Self, mpsc::UnboundedReceiver<SynthesisOutcome>)
    where
        S: SpeechSynthesizer + 'static,
    {
        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let closing = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(run(synthesizer, job_rx, outcome_tx, Arc::clone(&closing)));
        info!("Synthesis worker started");

        (
            Self {
                jobs: job_tx,
                closing,
                task,
            },
            outcome_rx,
        )
    }

    /// Queue a ticket for synthesis
    ///
    /// # Errors
    ///
    /// Returns an error if the worker has exited
    pub fn submit(&self, ticket: SpeakTicket) -> TalkbackResult<()> {
        debug!("Submitting speak request {}", ticket.generation());
        self.jobs
            .send(ticket)
            .map_err(|_| TalkbackError::concurrency("Synthesis worker is not running"))
    }

    /// Stop accepting jobs and wait for the current one to finish.
    ///
    /// Jobs still queued are discarded without reaching the engine.
    pub async fn shutdown(self) {
        self.closing.store(true, Ordering::SeqCst);
        drop(self.jobs);
        if let Err(e) = self.task.await {
            warn!("Synthesis worker ended abnormally: {}", e);
        }
        info!("Synthesis worker stopped");
    }
}

async fn run<S>(
    synthesizer: SharedSynthesizer<S>,
    mut jobs: mpsc::UnboundedReceiver<SpeakTicket>,
    outcomes: mpsc::UnboundedSender<SynthesisOutcome>,
    closing: Arc<AtomicBool>,
) where
    S: SpeechSynthesizer + 'static,
{
    while let Some(mut ticket) = jobs.recv().await {
        while let Ok(newer) = jobs.try_recv() {
            debug!(
                "Speak request {} superseded by {}",
                ticket.generation(),
                newer.generation()
            );
            ticket = newer;
        }
        if closing.load(Ordering::SeqCst) {
            debug!("Discarding speak request {} on shutdown", ticket.generation());
            break;
        }

        let engine = Arc::clone(&synthesizer);
        let job = ticket.clone();
        let result = tokio::task::spawn_blocking(move || {
            engine.lock().synthesize_to_file(job.text(), job.path())
        })
        .await
        .unwrap_or_else(|e| Err(TalkbackError::from(e)));

        if outcomes.send(SynthesisOutcome { ticket, result }).is_err() {
            debug!("Outcome receiver dropped, stopping synthesis worker");
            break;
        }
    }
}
