use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::model::AttemptOutcome;
use crate::progress::ProgressSample;

/// Messages from the supervisor to whatever draws the status line.
#[derive(Debug)]
pub enum SupervisorEvent {
    /// Transcoding is about to start.
    Started {
        title: String,
        destination: PathBuf,
        total_seconds: u64,
    },
    Progress(ProgressSample),
    /// A non-progress transcoder line.
    Diagnostic(String),
    /// The transcoder finished and the file is in place.
    Finished {
        sample: ProgressSample,
        size_bytes: u64,
        wall_clock: Duration,
    },
    /// The transcoder failed and its partial output was removed.
    Aborted { reason: String },
    /// Terminal result of an episode.
    Outcome {
        title: String,
        outcome: AttemptOutcome,
    },
    /// Answered once every earlier event has been handled.
    Flush(oneshot::Sender<()>),
}

pub type EventSender = mpsc::UnboundedSender<SupervisorEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SupervisorEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Waits until the consumer has drained every event sent so far.
///
/// Returns immediately if the consumer is gone.
pub async fn flush(events: &EventSender) {
    let (tx, rx) = oneshot::channel();
    if events.send(SupervisorEvent::Flush(tx)).is_ok() {
        let _ = rx.await;
    }
}
