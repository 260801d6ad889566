//! Deferred auto-advance timers.
//!
//! After a correct answer the learner sees the success message for a moment
//! before the next question appears. Each pending advance is a tokio task
//! keyed by [`SessionId`]; when it fires it sends [`AdvanceDue`] on the
//! channel returned by [`AdvanceScheduler::new`]. The receiver decides
//! whether that session is still the live one.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::session::SessionId;

/// A scheduled advance has come due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceDue {
    pub session_id: SessionId,
}

/// Owns the pending auto-advance timers. Dropping it cancels them all.
pub struct AdvanceScheduler {
    tx: mpsc::UnboundedSender<AdvanceDue>,
    pending: HashMap<SessionId, JoinHandle<()>>,
}

impl AdvanceScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AdvanceDue>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                pending: HashMap::new(),
            },
            rx,
        )
    }

    /// Fire [`AdvanceDue`] for `session_id` after `delay`, replacing any
    /// timer already pending for that session.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, session_id: SessionId, delay: Duration) {
        self.pending.retain(|_, handle| !handle.is_finished());

        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // receiver gone means the shell shut down
            let _ = tx.send(AdvanceDue { session_id });
        });

        if let Some(previous) = self.pending.insert(session_id, handle) {
            previous.abort();
        }
        tracing::debug!(session = %session_id, delay_ms = delay.as_millis() as u64, "advance scheduled");
    }

    /// Cancel the pending timer for `session_id`. Returns whether one was
    /// still waiting.
    pub fn cancel(&mut self, session_id: SessionId) -> bool {
        match self.pending.remove(&session_id) {
            Some(handle) => {
                let was_waiting = !handle.is_finished();
                handle.abort();
                if was_waiting {
                    tracing::debug!(session = %session_id, "advance cancelled");
                }
                was_waiting
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }

    pub fn is_pending(&self, session_id: SessionId) -> bool {
        self.pending
            .get(&session_id)
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for AdvanceScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
