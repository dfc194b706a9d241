//! Session ownership and per-session request serialization.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use engine::{Application, Session};
use moka::notification::RemovalCause;
use moka::sync::Cache;
use tracing::{debug, info, warn};

use crate::config::ManagerConfig;
use crate::error::{SessionError, SessionResult};
use crate::slot::SessionSlot;

/// Identifier of a session. Rendered as 16 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Parses the hex form produced by `Display`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        if text.len() != 16 {
            return None;
        }
        u64::from_str_radix(text, 16).ok().map(Self)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

type SharedSession = Arc<SessionSlot>;

/// Owns the sessions of one application.
///
/// Requests for the same session run one at a time, end to end, in the
/// order they arrived. Requests for different sessions run in parallel. Idle sessions expire and take
/// their objects and preserved state with them; nothing is sent to the
/// client.
pub struct SessionManager {
    app: Arc<Application>,
    sessions: Cache<SessionId, SharedSession>,
    next_id: AtomicU64,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("sessions", &self.sessions.entry_count())
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    #[must_use]
    pub fn new(app: Arc<Application>, config: &ManagerConfig) -> Self {
        let sessions = Cache::builder()
            .max_capacity(config.capacity)
            .time_to_idle(config.idle_timeout())
            .eviction_listener(|id: Arc<SessionId>, _session, cause| match cause {
                RemovalCause::Explicit => info!(session = %id, "session terminated"),
                RemovalCause::Expired => info!(session = %id, "session expired"),
                RemovalCause::Size => warn!(session = %id, "session evicted at capacity"),
                RemovalCause::Replaced => debug!(session = %id, "session replaced"),
            })
            .build();
        Self {
            app,
            sessions,
            next_id: AtomicU64::new(1),
        }
    }

    /// Creates a session. Its first request runs the application's entry
    /// point.
    pub fn create_session(&self) -> SessionId {
        let id = SessionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let session = Session::new(Arc::clone(&self.app));
        self.sessions.insert(id, Arc::new(SessionSlot::new(id, session)));
        info!(session = %id, "session created");
        id
    }

    /// Services one request for a session.
    ///
    /// Blocks until every earlier request for the same session has
    /// finished. Structural request errors are returned as an error
    /// response, not as `Err`.
    pub fn handle(&self, id: SessionId, body: &[u8]) -> SessionResult<Vec<u8>> {
        let slot = self.slot(id)?;
        let mut session = slot.enter();
        debug!(session = %id, requests = session.request_count(), "request started");
        Ok(session.handle(body))
    }

    /// Runs `f` with exclusive access to a session.
    pub fn with_session<R>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut Session) -> R,
    ) -> SessionResult<R> {
        let slot = self.slot(id)?;
        let mut session = slot.enter();
        Ok(f(&mut session))
    }

    /// Number of requests running against or waiting for a session.
    pub fn queued_requests(&self, id: SessionId) -> SessionResult<u64> {
        Ok(self.slot(id)?.queued())
    }

    fn slot(&self, id: SessionId) -> SessionResult<SharedSession> {
        self.sessions
            .get(&id)
            .ok_or(SessionError::UnknownSession { id })
    }

    /// Ends a session. Returns false if it was already gone.
    pub fn terminate(&self, id: SessionId) -> bool {
        self.sessions.remove(&id).is_some()
    }

    #[must_use]
    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.get(&id).is_some()
    }

    /// Number of live sessions, after processing pending expirations.
    #[must_use]
    pub fn session_count(&self) -> u64 {
        self.sessions.run_pending_tasks();
        self.sessions.entry_count()
    }

    #[must_use]
    pub const fn application(&self) -> &Arc<Application> {
        &self.app
    }
}
