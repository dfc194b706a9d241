//! The request cycle: `ReadData -> ProcessAction -> Render -> ResponseWritten`.

use protocol::{encode_message, ClientMessage, Operation};
use tracing::{debug, warn};

use crate::adapter::{ReadContext, RenderContext};
use crate::assembler::MessageAssembler;
use crate::error::{SyncError, SyncResult};
use crate::event::Event;
use crate::phase::{Phase, PhaseMachine};
use crate::session::Session;
use crate::ui::{HandlerSlot, Ui};

/// One request against a session.
///
/// Each phase method fails with `IllegalPhaseTransition` when called out of
/// order. Dropping a cycle before [`write_response`] succeeds rolls the
/// session's preserved state back to where it was when the cycle began.
///
/// [`write_response`]: RequestCycle::write_response
pub struct RequestCycle<'s> {
    session: &'s mut Session,
    phase: PhaseMachine,
    events: Vec<Event>,
    assembler: MessageAssembler,
}

impl<'s> RequestCycle<'s> {
    pub(crate) fn new(session: &'s mut Session) -> Self {
        Self {
            session,
            phase: PhaseMachine::new(),
            events: Vec::new(),
            assembler: MessageAssembler::new(),
        }
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase.current()
    }

    /// Events queued by `ReadData` and not yet dispatched.
    #[must_use]
    pub fn pending_events(&self) -> &[Event] {
        &self.events
    }

    /// Dispatches each inbound operation to its object's adapter, in message
    /// order. Failed operations are recorded and skipped.
    pub fn read_data(&mut self, message: &ClientMessage) -> SyncResult<()> {
        self.phase.require(Phase::ReadData)?;
        for operation in &message.operations {
            if let Err(err) = self.read_operation(operation) {
                debug!(target_id = operation.target(), error = %err, "inbound operation skipped");
                self.assembler.record_error(&err);
            }
        }
        self.phase.advance(Phase::ProcessAction)
    }

    fn read_operation(&mut self, operation: &Operation) -> SyncResult<()> {
        let session = &mut *self.session;
        let limit = session.app.config().session.max_events_per_request;
        let id = session.registry.lookup(operation.target())?;
        let object = session.registry.resolve_mut(id)?;
        let adapter = session.app.adapters().adapter_for(object)?;

        let mut ctx = ReadContext::new();
        adapter.read_data(object, operation, &mut ctx)?;
        let (events, updates) = ctx.into_parts();
        if self.events.len() + events.len() > limit {
            return Err(SyncError::LimitsExceeded {
                what: "event",
                limit,
            });
        }
        for (name, value) in updates {
            session.preserved.put(id, name, value);
        }
        self.events.extend(events);
        Ok(())
    }

    /// Runs the entry point on a session's first request, then dispatches
    /// queued events to their handlers in read order.
    pub fn process_action(&mut self) -> SyncResult<()> {
        self.phase.require(Phase::ProcessAction)?;
        let session = &mut *self.session;

        if !session.started {
            session.started = true;
            if let Some(entry_point) = session.app.entry_point().cloned() {
                let mut ui = Ui::new(
                    &mut session.registry,
                    &mut session.handlers,
                    session.app.adapters(),
                );
                if let Err(err) = entry_point(&mut ui) {
                    self.assembler.record_error(&err);
                }
            }
        }

        for event in std::mem::take(&mut self.events) {
            let key = (event.target, event.name.clone());
            let Some(mut handler) = session.handlers.get_mut(&key).and_then(HandlerSlot::begin)
            else {
                debug!(target_id = %event.target, event = %event.name, "no handler");
                continue;
            };
            let result = {
                let mut ui = Ui::new(
                    &mut session.registry,
                    &mut session.handlers,
                    session.app.adapters(),
                );
                handler(&mut ui, &event)
            };
            // `off`, `on` or destroying the target inside the handler leave
            // their change in place of the running slot.
            if let Some(slot) = session.handlers.get_mut(&key) {
                slot.finish(handler);
            }
            if let Err(err) = result {
                debug!(target_id = %event.target, error = %err, "handler failed");
                self.assembler.record_error(&err);
            }
        }
        Ok(())
    }

    /// Direct access to the widget tree. Only valid in `ProcessAction`.
    pub fn ui(&mut self) -> SyncResult<Ui<'_>> {
        self.phase.require(Phase::ProcessAction)?;
        let session = &mut *self.session;
        Ok(Ui::new(
            &mut session.registry,
            &mut session.handlers,
            session.app.adapters(),
        ))
    }

    /// Renders destroyed subtrees, then every live object in parent-first
    /// order: a create for objects the client has never seen and changes
    /// for the rest.
    pub fn render(&mut self) -> SyncResult<()> {
        self.phase.advance(Phase::Render)?;
        let session = &mut *self.session;

        for subtree in session.registry.destroyed() {
            if session.preserved.is_initialized(subtree.root) {
                self.assembler.append(Operation::Destroy {
                    target: subtree.root.to_string(),
                });
            }
            for id in &subtree.members {
                session.preserved.forget_object(*id);
            }
        }

        let resolver = session.app.resolver();
        for object in session.registry.iter() {
            let initial = !session.preserved.is_initialized(object.id());
            // Ids ascend from parent to child, so a parent that failed this
            // pass holds back its whole subtree.
            if let Some(parent) = object.parent().filter(|_| initial) {
                if !session.preserved.is_initialized(parent) {
                    let err = SyncError::ParentNotRendered {
                        target: object.id(),
                        parent,
                    };
                    debug!(target_id = %object.id(), error = %err, "render deferred");
                    self.assembler.record_error(&err);
                    continue;
                }
            }

            let adapter = match session.app.adapters().adapter_for(object) {
                Ok(adapter) => adapter,
                Err(err) => {
                    debug!(target_id = %object.id(), error = %err, "render skipped");
                    self.assembler.record_error(&err);
                    continue;
                }
            };

            let mut ctx = RenderContext::new(object.id(), &session.preserved, resolver);
            let result = if initial {
                adapter.render_initialization(object, &mut ctx)
            } else {
                adapter.render_changes(object, &mut ctx)
            };
            match result {
                Ok(()) => {
                    let (operations, updates) = ctx.into_parts();
                    for (name, value) in updates {
                        session.preserved.put(object.id(), name, value);
                    }
                    if initial {
                        session.preserved.mark_initialized(object.id());
                    }
                    self.assembler.extend(operations);
                }
                Err(err) => {
                    debug!(target_id = %object.id(), error = %err, "render failed");
                    self.assembler.record_error(&err);
                }
            }
        }
        debug!(operations = self.assembler.len(), "render complete");
        Ok(())
    }

    /// Encodes the response and commits the cycle.
    ///
    /// On failure the cycle enters `Failed` and preserved state is rolled
    /// back.
    pub fn write_response(mut self) -> SyncResult<Vec<u8>> {
        self.phase.require(Phase::Render)?;
        let counter = self.session.requests + 1;

        let mut message = std::mem::take(&mut self.assembler).serialize();
        message.head.request_counter = Some(counter);
        if self.session.requests == 0 {
            message.head.types = Some(format!("{:016x}", self.session.app.types_hash()));
        }

        match encode_message(&message, &self.session.app.config().protocol) {
            Ok(bytes) => {
                self.phase.advance(Phase::ResponseWritten)?;
                self.session.preserved.clear_for_next_cycle();
                self.session.registry.finish_cycle();
                self.session.requests = counter;
                Ok(bytes)
            }
            Err(err) => {
                self.phase.fail()?;
                self.session.preserved.rollback();
                warn!(error = %err, "response encoding failed");
                Err(err.into())
            }
        }
    }
}

impl Drop for RequestCycle<'_> {
    fn drop(&mut self) {
        if self.phase.current() != Phase::ResponseWritten && self.session.preserved.has_uncommitted()
        {
            debug!(phase = %self.phase.current(), "request abandoned, rolling back");
            self.session.preserved.rollback();
        }
    }
}
