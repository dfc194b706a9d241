//! Per-session state and request servicing.

use std::sync::Arc;

use protocol::{decode_client_message, encode_message, Limits, MessageHead, ProtocolMessage};
use tracing::{debug, warn};

use crate::application::Application;
use crate::error::{SyncError, SyncResult};
use crate::lifecycle::RequestCycle;
use crate::preserved::PreservedState;
use crate::registry::ObjectRegistry;
use crate::ui::HandlerMap;

/// The state one client session owns: its objects, what the client last
/// saw of them, and the application's handlers.
///
/// A session is not internally synchronized. Callers serialize requests,
/// for example by keeping it behind a mutex.
pub struct Session {
    pub(crate) app: Arc<Application>,
    pub(crate) registry: ObjectRegistry,
    pub(crate) preserved: PreservedState,
    pub(crate) handlers: HandlerMap,
    pub(crate) started: bool,
    pub(crate) requests: u64,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("objects", &self.registry.len())
            .field("preserved", &self.preserved.len())
            .field("handlers", &self.handlers.len())
            .field("requests", &self.requests)
            .finish_non_exhaustive()
    }
}

impl Session {
    #[must_use]
    pub fn new(app: Arc<Application>) -> Self {
        let registry = ObjectRegistry::new(app.config().session.max_objects);
        Self {
            app,
            registry,
            preserved: PreservedState::new(),
            handlers: HandlerMap::new(),
            started: false,
            requests: 0,
        }
    }

    /// Starts a request cycle in `ReadData`.
    pub fn begin(&mut self) -> RequestCycle<'_> {
        RequestCycle::new(self)
    }

    /// Runs one full request and returns the encoded response.
    ///
    /// A structural error aborts the request and leaves preserved state as
    /// it was before the request.
    pub fn service(&mut self, body: &[u8]) -> SyncResult<Vec<u8>> {
        let message = decode_client_message(body, &self.app.config().protocol)?;
        debug!(
            operations = message.operations.len(),
            client_counter = message.request_counter(),
            "request decoded"
        );
        let mut cycle = self.begin();
        cycle.read_data(&message)?;
        cycle.process_action()?;
        cycle.render()?;
        cycle.write_response()
    }

    /// Like [`service`](Self::service), but turns a structural error into an
    /// error response carrying a single top-level `error` in the head.
    pub fn handle(&mut self, body: &[u8]) -> Vec<u8> {
        match self.service(body) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, kind = err.kind(), "request aborted");
                error_response(&err)
            }
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn preserved(&self) -> &PreservedState {
        &self.preserved
    }

    #[must_use]
    pub const fn application(&self) -> &Arc<Application> {
        &self.app
    }

    /// Number of responses written so far.
    #[must_use]
    pub const fn request_count(&self) -> u64 {
        self.requests
    }
}

/// Encodes a response for an aborted request.
#[must_use]
pub fn error_response(err: &SyncError) -> Vec<u8> {
    let message = ProtocolMessage {
        head: MessageHead {
            error: Some(err.to_note()),
            ..MessageHead::default()
        },
        operations: Vec::new(),
    };
    encode_message(&message, &Limits::unlimited()).unwrap_or_else(|encode_err| {
        warn!(error = %encode_err, "error response encoding failed");
        br#"{"head":{"error":{"kind":"Encode","message":"error response encoding failed"}},"operations":[]}"#
            .to_vec()
    })
}
