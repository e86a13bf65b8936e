//! Single-slot cancellable speech channel

use crate::engines::SpeechEngine;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How an utterance ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// Spoken to the end
    Completed,
    /// Superseded by a newer utterance or cancelled explicitly
    Cancelled,
    /// Nothing was spoken: speech unavailable or empty text
    Skipped,
    /// The engine failed part way
    Failed(String),
}

impl SpeechOutcome {
    /// True when the flow may proceed as if the cue had been heard
    pub fn is_resolved(&self) -> bool {
        !matches!(self, SpeechOutcome::Cancelled)
    }
}

/// Completion handle for one utterance; resolves exactly once
pub struct Utterance {
    id: u64,
    outcome: oneshot::Receiver<SpeechOutcome>,
}

impl Utterance {
    fn ready(id: u64, outcome: SpeechOutcome) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(outcome);
        Self { id, outcome: rx }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Future for Utterance {
    type Output = SpeechOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.outcome).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            // task aborted before reporting
            Poll::Ready(Err(_)) => Poll::Ready(SpeechOutcome::Cancelled),
            Poll::Pending => Poll::Pending,
        }
    }
}

struct ActiveUtterance {
    id: u64,
    task: JoinHandle<()>,
}

/// The one channel every spoken cue goes through
///
/// At most one utterance is outstanding. `say` cancels the pending utterance
/// before starting the new one, so cues never overlap.
pub struct SpeechChannel {
    engine: Arc<dyn SpeechEngine>,
    active: Mutex<Option<ActiveUtterance>>,
    next_id: AtomicU64,
}

impl SpeechChannel {
    pub fn new(engine: Arc<dyn SpeechEngine>) -> Self {
        Self {
            engine,
            active: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Speak one text
    pub fn say(&self, text: impl Into<String>) -> Utterance {
        self.say_all(vec![text.into()])
    }

    /// Speak several texts back to back as a single utterance
    pub fn say_all(&self, texts: Vec<String>) -> Utterance {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut active = self.active.lock();
        if let Some(previous) = active.take() {
            debug!("Utterance {} superseded by {}", previous.id, id);
            previous.task.abort();
        }

        let texts: Vec<String> = texts
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if texts.is_empty() || !self.engine.is_available() {
            return Utterance::ready(id, SpeechOutcome::Skipped);
        }

        let (tx, rx) = oneshot::channel();
        let engine = self.engine.clone();
        let task = tokio::spawn(async move {
            for text in &texts {
                if let Err(e) = engine.speak(text).await {
                    warn!("Speech failed for '{}': {}", text, e);
                    let _ = tx.send(SpeechOutcome::Failed(e.to_string()));
                    return;
                }
            }
            let _ = tx.send(SpeechOutcome::Completed);
        });
        *active = Some(ActiveUtterance { id, task });

        Utterance { id, outcome: rx }
    }

    /// Cancel the pending utterance, if any
    pub fn cancel(&self) {
        if let Some(previous) = self.active.lock().take() {
            debug!("Utterance {} cancelled", previous.id);
            previous.task.abort();
        }
    }

    /// Whether an utterance is still being spoken
    pub fn is_speaking(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .map(|a| !a.task.is_finished())
            .unwrap_or(false)
    }

    pub fn is_available(&self) -> bool {
        self.engine.is_available()
    }
}

impl Drop for SpeechChannel {
    fn drop(&mut self) {
        self.cancel();
    }
}
