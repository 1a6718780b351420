//! Per-fill state and the follow-up work a fill schedules.
//!
//! Delayed continuations (overlay follow-ups, staggered group members) run as tasks on a
//! [`JoinSet`] owned by the session. Every task races the session's cancellation token, so a
//! superseded fill stops touching the page as soon as it is cancelled.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use fastfill_core_types::FillSessionId;
use page_dom::PageDom;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::FillError;
use crate::patterns::PatternRegistry;
use crate::policy::FillPolicy;

/// Number of fields a follow-up confirmed beyond those already reported.
pub type FollowUpResult = Result<u32, FillError>;

/// Resolves once a scheduled task has finished.
#[derive(Debug)]
pub struct Completion(oneshot::Receiver<bool>);

impl Completion {
    /// Whether the task succeeded. An aborted task counts as failed.
    pub async fn wait(self) -> bool {
        self.0.await.unwrap_or(false)
    }
}

/// Tally of the follow-up work of one session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub confirmed: u32,
}

#[derive(Debug)]
pub struct FillSession {
    id: FillSessionId,
    started: Instant,
    cancel: CancellationToken,
    tasks: Mutex<JoinSet<FollowUpResult>>,
}

impl Default for FillSession {
    fn default() -> Self {
        Self::new()
    }
}

impl FillSession {
    pub fn new() -> Self {
        Self {
            id: FillSessionId::new(),
            started: Instant::now(),
            cancel: CancellationToken::new(),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    pub fn id(&self) -> &FillSessionId {
        &self.id
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            debug!(session = %self.id, "cancelling follow-ups");
            self.cancel.cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Tasks scheduled and not yet collected by [`FillSession::join`].
    pub fn pending(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Runs `work` after `delay` unless the session is cancelled first.
    pub fn spawn_after<F>(&self, delay: Duration, label: &'static str, work: F) -> Completion
    where
        F: Future<Output = FollowUpResult> + Send + 'static,
    {
        let token = self.cancel.clone();
        let session = self.id.clone();
        let (done, completion) = oneshot::channel();
        self.tasks.lock().spawn(async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => Err(FillError::Cancelled),
                outcome = async {
                    sleep(delay).await;
                    work.await
                } => outcome,
            };
            match &outcome {
                Ok(confirmed) => debug!(%session, label, confirmed, "follow-up finished"),
                Err(FillError::Cancelled) => debug!(%session, label, "follow-up cancelled"),
                Err(err) => debug!(%session, label, error = %err, "follow-up failed"),
            }
            let _ = done.send(outcome.is_ok());
            outcome
        });
        Completion(completion)
    }

    /// Waits for every scheduled task, including tasks scheduled while waiting.
    pub async fn join(&self) -> SessionReport {
        let mut report = SessionReport::default();
        loop {
            let mut batch = std::mem::take(&mut *self.tasks.lock());
            if batch.is_empty() {
                return report;
            }
            while let Some(joined) = batch.join_next().await {
                match joined {
                    Ok(Ok(confirmed)) => {
                        report.completed += 1;
                        report.confirmed += confirmed;
                    }
                    Ok(Err(FillError::Cancelled)) => report.cancelled += 1,
                    Ok(Err(_)) => report.failed += 1,
                    Err(err) => {
                        warn!(session = %self.id, error = %err, "follow-up task aborted");
                        report.failed += 1;
                    }
                }
            }
        }
    }
}

/// Everything a field fill needs. Cheap to clone into scheduled tasks.
#[derive(Clone)]
pub struct FillContext {
    pub page: Arc<dyn PageDom>,
    pub patterns: Arc<PatternRegistry>,
    pub policy: Arc<FillPolicy>,
    pub session: Arc<FillSession>,
}

impl FillContext {
    pub fn new(
        page: Arc<dyn PageDom>,
        patterns: Arc<PatternRegistry>,
        policy: Arc<FillPolicy>,
    ) -> Self {
        Self {
            page,
            patterns,
            policy,
            session: Arc::new(FillSession::new()),
        }
    }

    pub fn page(&self) -> &dyn PageDom {
        self.page.as_ref()
    }
}
