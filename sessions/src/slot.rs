//! A session behind a first-come, first-served lock.

use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use engine::Session;
use tracing::warn;

use crate::manager::SessionId;

/// Ticket counters. `serving` is the ticket that currently owns the session.
#[derive(Debug, Default)]
struct Turns {
    next: u64,
    serving: u64,
}

/// Owns one session and hands it to callers in the order they arrived.
pub(crate) struct SessionSlot {
    id: SessionId,
    session: Mutex<Session>,
    turns: Mutex<Turns>,
    turn_changed: Condvar,
}

impl SessionSlot {
    pub(crate) fn new(id: SessionId, session: Session) -> Self {
        Self {
            id,
            session: Mutex::new(session),
            turns: Mutex::new(Turns::default()),
            turn_changed: Condvar::new(),
        }
    }

    /// Blocks until every earlier caller has finished, then locks the session.
    pub(crate) fn enter(&self) -> SessionTurn<'_> {
        let mut turns = self.turns.lock().unwrap_or_else(PoisonError::into_inner);
        let ticket = turns.next;
        turns.next += 1;
        while turns.serving != ticket {
            turns = self
                .turn_changed
                .wait(turns)
                .unwrap_or_else(PoisonError::into_inner);
        }
        drop(turns);

        let session = self.session.lock().unwrap_or_else(|poisoned| {
            warn!(session = %self.id, "recovering session after a panicked request");
            PoisonError::into_inner(poisoned)
        });
        SessionTurn {
            slot: self,
            session,
        }
    }

    /// Callers holding or waiting for the session.
    pub(crate) fn queued(&self) -> u64 {
        let turns = self.turns.lock().unwrap_or_else(PoisonError::into_inner);
        turns.next - turns.serving
    }
}

/// Exclusive access to a session. Dropping it admits the next caller, also
/// when the holder panics.
pub(crate) struct SessionTurn<'a> {
    slot: &'a SessionSlot,
    session: MutexGuard<'a, Session>,
}

impl Deref for SessionTurn<'_> {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.session
    }
}

impl DerefMut for SessionTurn<'_> {
    fn deref_mut(&mut self) -> &mut Session {
        &mut self.session
    }
}

impl Drop for SessionTurn<'_> {
    fn drop(&mut self) {
        let mut turns = self
            .slot
            .turns
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        turns.serving += 1;
        drop(turns);
        self.slot.turn_changed.notify_all();
    }
}
