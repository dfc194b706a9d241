//! Request phase state machine.

use std::fmt;

use crate::error::{SyncError, SyncResult};

/// A stage of one request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    ReadData,
    ProcessAction,
    Render,
    ResponseWritten,
    /// Terminal state after an unrecoverable error.
    Failed,
}

impl Phase {
    /// Returns the phase that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::ReadData => Some(Self::ProcessAction),
            Self::ProcessAction => Some(Self::Render),
            Self::Render => Some(Self::ResponseWritten),
            Self::ResponseWritten | Self::Failed => None,
        }
    }

    /// Returns true for `ResponseWritten` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::ResponseWritten | Self::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ReadData => "ReadData",
            Self::ProcessAction => "ProcessAction",
            Self::Render => "Render",
            Self::ResponseWritten => "ResponseWritten",
            Self::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Tracks the phase of a single request. One instance per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseMachine {
    current: Phase,
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseMachine {
    /// Creates a machine in `ReadData`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: Phase::ReadData,
        }
    }

    #[must_use]
    pub const fn current(&self) -> Phase {
        self.current
    }

    /// Moves to `to`, which must be the immediate successor of the current
    /// phase.
    pub fn advance(&mut self, to: Phase) -> SyncResult<()> {
        if self.current.next() == Some(to) {
            self.current = to;
            Ok(())
        } else {
            Err(SyncError::IllegalPhaseTransition {
                from: self.current,
                to,
            })
        }
    }

    /// Fails unless the machine is in `phase`.
    pub fn require(&self, phase: Phase) -> SyncResult<()> {
        if self.current == phase {
            Ok(())
        } else {
            Err(SyncError::IllegalPhaseTransition {
                from: self.current,
                to: phase,
            })
        }
    }

    /// Enters `Failed`. Allowed from any non-terminal phase.
    pub fn fail(&mut self) -> SyncResult<()> {
        if self.current.is_terminal() {
            return Err(SyncError::IllegalPhaseTransition {
                from: self.current,
                to: Phase::Failed,
            });
        }
        self.current = Phase::Failed;
        Ok(())
    }
}
