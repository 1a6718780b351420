//! Message-passing entry points.
//!
//! The triggering host talks to the engine through a channel: every request carries a
//! responder and always receives exactly one [`FillResponse`]. A request sent after the
//! service has stopped fails with [`FillError::Messaging`].

use std::sync::Arc;

use fastfill_core_types::{FillRequest, FillResponse};
use page_dom::PageDom;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::api::{FillEngine, FormFiller};
use crate::errors::FillError;
use crate::policy::FillPolicy;
use crate::session::{FillSession, SessionReport};

const QUEUE_DEPTH: usize = 16;

struct Envelope {
    request: FillRequest,
    reply: oneshot::Sender<FillResponse>,
}

type CurrentSession = Arc<Mutex<Option<Arc<FillSession>>>>;

pub struct FillService;

impl FillService {
    /// Starts a service over `page` with the builtin pattern tables.
    pub fn spawn(page: Arc<dyn PageDom>, policy: FillPolicy) -> FillServiceHandle {
        Self::with_engine(FillEngine::builder(page).with_policy(policy).build())
    }

    pub fn with_engine(engine: FillEngine) -> FillServiceHandle {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let current: CurrentSession = Arc::new(Mutex::new(None));
        let worker = tokio::spawn(serve(engine, rx, current.clone()));
        FillServiceHandle {
            tx,
            current,
            worker: Arc::new(Mutex::new(Some(worker))),
        }
    }
}

async fn serve(engine: FillEngine, mut rx: mpsc::Receiver<Envelope>, current: CurrentSession) {
    let cancel_superseded = engine.policy().cancel_superseded;
    // Superseded sessions that keep running. Dropping a session aborts its tasks, so each one
    // is owned by a drain until its follow-ups finish.
    let mut drains: JoinSet<()> = JoinSet::new();
    while let Some(Envelope { request, reply }) = rx.recv().await {
        while drains.try_join_next().is_some() {}
        if let Some(previous) = current.lock().take() {
            if cancel_superseded {
                if previous.pending() > 0 {
                    info!(session = %previous.id(), "superseding earlier fill");
                }
                previous.cancel();
            } else {
                drains.spawn(drain(previous));
            }
        }
        let outcome = engine.fill(request).await;
        let response = outcome.response();
        *current.lock() = Some(outcome.session);
        if reply.send(response).is_err() {
            debug!("requester went away before the response");
        }
    }
    debug!("fill service stopped");
}

async fn drain(session: Arc<FillSession>) {
    let report = session.join().await;
    debug!(session = %session.id(), ?report, "superseded fill finished");
}

/// Cloneable sender side of a [`FillService`].
#[derive(Clone)]
pub struct FillServiceHandle {
    tx: mpsc::Sender<Envelope>,
    current: CurrentSession,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl FillServiceHandle {
    pub async fn send(&self, request: FillRequest) -> Result<FillResponse, FillError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Envelope { request, reply })
            .await
            .map_err(|_| FillError::no_listener())?;
        response.await.map_err(|_| FillError::no_listener())
    }

    /// Wire-level entry point. A malformed message is answered, not dropped.
    pub async fn send_json(&self, raw: &str) -> Result<FillResponse, FillError> {
        match serde_json::from_str::<FillRequest>(raw) {
            Ok(request) => self.send(request).await,
            Err(err) => {
                warn!(error = %err, "malformed fill request");
                Ok(FillResponse::failed(format!("malformed request: {err}")))
            }
        }
    }

    /// The session of the most recent fill, if any.
    pub fn current_session(&self) -> Option<Arc<FillSession>> {
        self.current.lock().clone()
    }

    /// Waits for the follow-up work of the most recent fill.
    pub async fn join_current(&self) -> Option<SessionReport> {
        let session = self.current_session()?;
        Some(session.join().await)
    }

    /// Stops accepting requests. Pending follow-ups of the current session are cancelled and
    /// superseded fills still running are aborted with the worker.
    pub fn shutdown(&self) {
        if let Some(worker) = self.worker.lock().take() {
            worker.abort();
        }
        if let Some(session) = self.current.lock().take() {
            session.cancel();
        }
    }
}
