use hotspot_core::{ResumeScheduler, TimerToken};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Auto-resume timers as tokio sleep tasks. A fired timer posts its token on
/// the driver's channel. At most one timer is outstanding.
///
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct TokioResumeScheduler {
    fired: mpsc::UnboundedSender<TimerToken>,
    pending: Option<(TimerToken, JoinHandle<()>)>,
}

impl TokioResumeScheduler {
    pub fn new(fired: mpsc::UnboundedSender<TimerToken>) -> Self {
        Self {
            fired,
            pending: None,
        }
    }

    pub fn outstanding(&self) -> Option<TimerToken> {
        self.pending
            .as_ref()
            .filter(|(_, task)| !task.is_finished())
            .map(|(token, _)| *token)
    }

    fn abort_pending(&mut self) {
        if let Some((token, task)) = self.pending.take() {
            debug!(token = token.0, "aborting resume timer");
            task.abort();
        }
    }
}

impl ResumeScheduler for TokioResumeScheduler {
    fn schedule(&mut self, token: TimerToken, delay: Duration) {
        self.abort_pending();
        let fired = self.fired.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The driver may already be gone.
            let _ = fired.send(token);
        });
        self.pending = Some((token, task));
    }

    fn cancel(&mut self, token: TimerToken) {
        if matches!(self.pending, Some((pending, _)) if pending == token) {
            self.abort_pending();
        }
    }
}

impl Drop for TokioResumeScheduler {
    fn drop(&mut self) {
        self.abort_pending();
    }
}
