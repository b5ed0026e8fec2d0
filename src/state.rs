use crate::client::SolverClient;
use crate::data::{TimetableRequest, TimetableResponse};
use crate::request::ParsedRequest;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// One successful submission. Never mutated; a new submission replaces it.
#[derive(Debug)]
pub struct Session {
    pub request: ParsedRequest,
    /// Typed view of `request`, when it matches the wire contract.
    pub config: Option<TimetableRequest>,
    pub response: TimetableResponse,
}

impl Session {
    pub fn new(request: ParsedRequest, response: TimetableResponse) -> Self {
        let config = request.config();
        Self {
            request,
            config,
            response,
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub solver: SolverClient,
    pub initial_request: Arc<String>,
    pub fallback_cap: u32,
    current: Arc<RwLock<Option<Arc<Session>>>>,
    in_flight: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(solver: SolverClient, initial_request: String, fallback_cap: u32) -> Self {
        Self {
            solver,
            initial_request: Arc::new(initial_request),
            fallback_cap,
            current: Arc::new(RwLock::new(None)),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn current(&self) -> Option<Arc<Session>> {
        self.current.read().await.clone()
    }

    /// Swaps in `session` wholesale.
    pub async fn replace(&self, session: Session) -> Arc<Session> {
        let session = Arc::new(session);
        *self.current.write().await = Some(Arc::clone(&session));
        session
    }

    /// Claims the single submission slot. `None` while another submission
    /// is outstanding.
    pub fn try_begin_submission(&self) -> Option<SubmissionGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmissionGuard {
                flag: Arc::clone(&self.in_flight),
            })
    }
}

/// Releases the submission slot when dropped.
pub struct SubmissionGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for SubmissionGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
