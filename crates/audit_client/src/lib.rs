use std::{
    collections::BTreeMap,
    pin::pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use futures::StreamExt;
use serde::Serialize;
use shared::{
    catalog,
    domain::{CriterionId, QualiopiOnboardingData},
    protocol::{AuditProgressEvent, AuditReport, StartAuditRequest},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

pub mod aggregator;
pub mod error;
pub mod framer;
pub mod parser;
pub mod transport;

pub use aggregator::{Applied, CriterionProgress, IgnoreReason, ProgressAggregator};
pub use error::AuditError;
pub use transport::{AuditTransport, FragmentStream, HttpTransport, MissingTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
    /// The stream failed or carried a record that could not be decoded.
    Errored,
    /// The stream ended before an `audit_complete` report arrived.
    Incomplete,
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    SessionStateChanged(SessionState),
    CriterionUpdated {
        criterion_id: CriterionId,
        progress: CriterionProgress,
    },
    ReportReady(AuditReport),
    Error(String),
}

/// Point-in-time copy of the current session, safe to hand to observers.
#[derive(Debug, Clone, Serialize)]
pub struct AuditSnapshot {
    pub generation: u64,
    pub state: SessionState,
    pub cancelled: bool,
    pub onboarding_data: Option<QualiopiOnboardingData>,
    pub progress: BTreeMap<CriterionId, CriterionProgress>,
    pub report: Option<AuditReport>,
    /// Indicators with a result, per catalog criterion.
    pub processed_indicators: BTreeMap<CriterionId, usize>,
    pub completed_criteria: usize,
    pub progress_percent: u8,
}

struct AuditSession {
    generation: u64,
    state: SessionState,
    cancelled: Arc<AtomicBool>,
    onboarding_data: Option<QualiopiOnboardingData>,
    aggregator: ProgressAggregator,
}

impl AuditSession {
    fn idle() -> Self {
        Self {
            generation: 0,
            state: SessionState::Idle,
            cancelled: Arc::new(AtomicBool::new(false)),
            onboarding_data: None,
            aggregator: ProgressAggregator::new(),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn accepts(&self, generation: u64, cancelled: &AtomicBool) -> bool {
        self.generation == generation && !cancelled.load(Ordering::SeqCst)
    }
}

struct AuditClientState {
    session: AuditSession,
    stored_onboarding_data: Option<QualiopiOnboardingData>,
    last_generation: u64,
}

/// Owns one audit attempt at a time and drives its progress stream.
pub struct AuditClient {
    transport: Arc<dyn AuditTransport>,
    inner: Mutex<AuditClientState>,
    events: broadcast::Sender<ClientEvent>,
}

impl AuditClient {
    pub fn new() -> Arc<Self> {
        Self::new_with_transport(Arc::new(MissingTransport))
    }

    pub fn new_with_transport(transport: Arc<dyn AuditTransport>) -> Arc<Self> {
        let (events, _) = broadcast::channel(1024);
        Arc::new(Self {
            transport,
            inner: Mutex::new(AuditClientState {
                session: AuditSession::idle(),
                stored_onboarding_data: None,
                last_generation: 0,
            }),
            events,
        })
    }

    pub fn http(server_url: &str) -> Result<Arc<Self>, AuditError> {
        Ok(Self::new_with_transport(Arc::new(HttpTransport::new(
            server_url,
        )?)))
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Validates and keeps onboarding data for later [`AuditClient::run`] calls.
    pub async fn set_onboarding_data(
        &self,
        data: QualiopiOnboardingData,
    ) -> Result<(), AuditError> {
        data.validate()?;
        self.inner.lock().await.stored_onboarding_data = Some(data);
        Ok(())
    }

    pub async fn onboarding_data(&self) -> Option<QualiopiOnboardingData> {
        self.inner.lock().await.stored_onboarding_data.clone()
    }

    /// Starts an audit with the stored onboarding data.
    pub async fn run(
        &self,
        chat_session_id: &str,
        criteria_to_audit: Option<Vec<CriterionId>>,
    ) -> Result<SessionState, AuditError> {
        let onboarding_data = self.onboarding_data().await;
        self.start(chat_session_id, onboarding_data, criteria_to_audit)
            .await
    }

    /// Runs one audit session to its end.
    ///
    /// Returns once the stream ends, fails, or after a cancelled session's
    /// transport closes. Dropping the returned future aborts the network read.
    pub async fn start(
        &self,
        chat_session_id: &str,
        onboarding_data: Option<QualiopiOnboardingData>,
        criteria_to_audit: Option<Vec<CriterionId>>,
    ) -> Result<SessionState, AuditError> {
        let chat_session_id = chat_session_id.trim();
        if chat_session_id.is_empty() {
            warn!("audit: start rejected, missing chat session id");
            return Err(AuditError::MissingChatSessionId);
        }
        let Some(onboarding_data) = onboarding_data else {
            warn!("audit: start rejected, missing onboarding data");
            return Err(AuditError::MissingOnboardingData);
        };
        onboarding_data.validate()?;

        let request = StartAuditRequest {
            chat_session_id: chat_session_id.to_string(),
            onboarding_data: onboarding_data.clone(),
            criteria_to_audit,
        };
        let (generation, cancelled) = self.begin_session(onboarding_data).await?;
        info!(generation, chat_session_id, "audit: session started");

        match self.drive(generation, &cancelled, &request).await {
            Ok(()) => Ok(self.finish_session(generation, &cancelled).await),
            Err(err) => {
                self.fail_session(generation, &cancelled, &err).await;
                Err(err)
            }
        }
    }

    /// Stops state mutation for the current session.
    ///
    /// A running session drops its progress and report. The network read keeps
    /// draining until the transport closes; its events are discarded.
    pub async fn cancel(&self) -> SessionState {
        let mut guard = self.inner.lock().await;
        let session = &mut guard.session;
        session.cancelled.store(true, Ordering::SeqCst);
        if session.state == SessionState::Running {
            session.aggregator.clear();
            session.state = SessionState::Cancelled;
            info!(generation = session.generation, "audit: session cancelled");
            self.emit(ClientEvent::SessionStateChanged(SessionState::Cancelled));
        }
        session.state
    }

    /// Cancels and discards the current session's results, returning to idle.
    pub async fn reset(&self) {
        let mut guard = self.inner.lock().await;
        let session = &mut guard.session;
        session.cancelled.store(true, Ordering::SeqCst);
        session.aggregator.clear();
        if session.state != SessionState::Idle {
            session.state = SessionState::Idle;
            info!(generation = session.generation, "audit: session reset");
            self.emit(ClientEvent::SessionStateChanged(SessionState::Idle));
        }
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.session.state
    }

    pub async fn snapshot(&self) -> AuditSnapshot {
        let guard = self.inner.lock().await;
        let session = &guard.session;
        AuditSnapshot {
            generation: session.generation,
            state: session.state,
            cancelled: session.is_cancelled(),
            onboarding_data: session.onboarding_data.clone(),
            progress: session.aggregator.progress().clone(),
            report: session.aggregator.report().cloned(),
            processed_indicators: catalog::CRITERIA
                .iter()
                .map(|criterion| {
                    (
                        criterion.id,
                        session.aggregator.processed_indicator_count(criterion.id),
                    )
                })
                .collect(),
            completed_criteria: session.aggregator.completed_criteria(),
            progress_percent: session.aggregator.progress_percent(),
        }
    }

    async fn begin_session(
        &self,
        onboarding_data: QualiopiOnboardingData,
    ) -> Result<(u64, Arc<AtomicBool>), AuditError> {
        let mut guard = self.inner.lock().await;
        if guard.session.state == SessionState::Running {
            warn!(
                generation = guard.session.generation,
                "audit: start rejected, a session is already running"
            );
            return Err(AuditError::AlreadyRunning);
        }
        guard.last_generation += 1;
        let generation = guard.last_generation;
        let cancelled = Arc::new(AtomicBool::new(false));
        guard.session = AuditSession {
            generation,
            state: SessionState::Running,
            cancelled: Arc::clone(&cancelled),
            onboarding_data: Some(onboarding_data),
            aggregator: ProgressAggregator::new(),
        };
        self.emit(ClientEvent::SessionStateChanged(SessionState::Running));
        Ok((generation, cancelled))
    }

    async fn drive(
        &self,
        generation: u64,
        cancelled: &AtomicBool,
        request: &StartAuditRequest,
    ) -> Result<(), AuditError> {
        let fragments = self.transport.open_stream(request).await?;
        let mut lines = pin!(framer::frame_lines(fragments));
        while let Some(line) = lines.next().await {
            if cancelled.load(Ordering::SeqCst) {
                if let Err(err) = line {
                    debug!(generation, %err, "audit: cancelled stream closed with an error");
                    return Ok(());
                }
                continue;
            }
            let line = line?;
            let Some(event) = parser::parse_line(&line)? else {
                continue;
            };
            self.apply_event(generation, cancelled, event).await;
        }
        Ok(())
    }

    async fn apply_event(
        &self,
        generation: u64,
        cancelled: &AtomicBool,
        event: AuditProgressEvent,
    ) {
        let mut guard = self.inner.lock().await;
        let session = &mut guard.session;
        if !session.accepts(generation, cancelled) {
            debug!(generation, "audit: discarding event for inactive session");
            return;
        }
        match session.aggregator.apply(event) {
            Applied::CriterionUpdated(criterion_id) => {
                if let Some(progress) = session.aggregator.criterion(criterion_id) {
                    self.emit(ClientEvent::CriterionUpdated {
                        criterion_id,
                        progress: progress.clone(),
                    });
                }
            }
            Applied::ReportStored => {
                if let Some(report) = session.aggregator.report() {
                    info!(
                        generation,
                        status = ?report.status,
                        nc_majeure = report.vue_ensemble.nc_majeure,
                        "audit: report received"
                    );
                    self.emit(ClientEvent::ReportReady(report.clone()));
                }
                session.state = SessionState::Completed;
                self.emit(ClientEvent::SessionStateChanged(SessionState::Completed));
            }
            Applied::Ignored(reason) => {
                debug!(generation, ?reason, "audit: event ignored");
            }
        }
    }

    async fn finish_session(&self, generation: u64, cancelled: &AtomicBool) -> SessionState {
        let mut guard = self.inner.lock().await;
        let session = &mut guard.session;
        if !session.accepts(generation, cancelled) {
            return SessionState::Cancelled;
        }
        if session.state == SessionState::Running {
            warn!(generation, "audit: stream ended without a report");
            session.state = SessionState::Incomplete;
            self.emit(ClientEvent::SessionStateChanged(SessionState::Incomplete));
        }
        info!(generation, state = ?session.state, "audit: session finished");
        session.state
    }

    async fn fail_session(&self, generation: u64, cancelled: &AtomicBool, err: &AuditError) {
        let mut guard = self.inner.lock().await;
        let session = &mut guard.session;
        if !session.accepts(generation, cancelled) {
            debug!(generation, %err, "audit: failure after session was cancelled");
            return;
        }
        self.emit(ClientEvent::Error(err.to_string()));
        if session.state != SessionState::Running {
            warn!(generation, state = ?session.state, %err, "audit: failure after session ended");
            return;
        }
        error!(generation, %err, "audit: session failed");
        session.state = SessionState::Errored;
        self.emit(ClientEvent::SessionStateChanged(SessionState::Errored));
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
