//! Error types for the sync engine.

use std::fmt;

use protocol::{DecodeError, EncodeError, ErrorNote, OperationKind};

use crate::phase::Phase;
use crate::types::ObjectId;

/// Result type for engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised while servicing a request.
///
/// Per-object errors are recorded in the response head and skip only the
/// affected object or operation. Structural errors abort the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// An id does not name a live object in this session.
    UnknownObjectReference { target: String },

    /// No adapter is registered for the object's type tag.
    UnsupportedType { target: ObjectId, type_tag: String },

    /// An inbound payload failed validation. Nothing was applied.
    MalformedPayload {
        target: ObjectId,
        reason: PayloadReason,
    },

    /// An operation was invoked outside its phase.
    IllegalPhaseTransition { from: Phase, to: Phase },

    /// The client message could not be decoded.
    BadRequest(DecodeError),

    /// A value referenced a resource the resolver does not know.
    UnresolvedResource { target: ObjectId, resource: String },

    /// The object's parent has not been created on the client yet, so the
    /// object is held back until it has.
    ParentNotRendered { target: ObjectId, parent: ObjectId },

    /// A per-session limit was reached.
    LimitsExceeded {
        what: &'static str,
        limit: usize,
    },

    /// The response could not be encoded within the protocol limits.
    Encode(EncodeError),
}

/// Details for [`SyncError::MalformedPayload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadReason {
    UnknownProperty { name: String },
    NotWritable { name: String },
    WrongKind {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    InvalidValue { name: String, detail: String },
    UnknownEvent { name: String },
    UnknownMethod { name: String },
    UnexpectedOperation { kind: OperationKind },
}

impl SyncError {
    /// Returns the error class written to the response head.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownObjectReference { .. } => "UnknownObjectReference",
            Self::UnsupportedType { .. } => "UnsupportedType",
            Self::MalformedPayload { .. } => "MalformedPayload",
            Self::IllegalPhaseTransition { .. } => "IllegalPhaseTransition",
            Self::BadRequest(_) => "BadRequest",
            Self::UnresolvedResource { .. } => "UnresolvedResource",
            Self::ParentNotRendered { .. } => "ParentNotRendered",
            Self::LimitsExceeded { .. } => "LimitsExceeded",
            Self::Encode(_) => "Encode",
        }
    }

    /// Returns the wire id of the object the error concerns, if any.
    #[must_use]
    pub fn target(&self) -> Option<String> {
        match self {
            Self::UnknownObjectReference { target } => Some(target.clone()),
            Self::UnsupportedType { target, .. }
            | Self::MalformedPayload { target, .. }
            | Self::UnresolvedResource { target, .. }
            | Self::ParentNotRendered { target, .. } => Some(target.to_string()),
            Self::IllegalPhaseTransition { .. }
            | Self::BadRequest(_)
            | Self::LimitsExceeded { .. }
            | Self::Encode(_) => None,
        }
    }

    /// Returns true if the error aborts the whole request.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::IllegalPhaseTransition { .. } | Self::BadRequest(_) | Self::Encode(_)
        )
    }

    /// Converts the error into a head note.
    #[must_use]
    pub fn to_note(&self) -> ErrorNote {
        let note = ErrorNote::new(self.kind(), self.to_string());
        match self.target() {
            Some(target) => note.with_target(target),
            None => note,
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownObjectReference { target } => {
                write!(f, "unknown object {target:?}")
            }
            Self::UnsupportedType { target, type_tag } => {
                write!(f, "no adapter for type {type_tag:?} of {target}")
            }
            Self::MalformedPayload { target, reason } => {
                write!(f, "malformed payload for {target}: {reason}")
            }
            Self::IllegalPhaseTransition { from, to } => {
                write!(f, "illegal phase transition from {from} to {to}")
            }
            Self::BadRequest(err) => write!(f, "bad request: {err}"),
            Self::UnresolvedResource { target, resource } => {
                write!(f, "unresolved resource {resource:?} on {target}")
            }
            Self::ParentNotRendered { target, parent } => {
                write!(f, "{target} deferred until its parent {parent} is created")
            }
            Self::LimitsExceeded { what, limit } => {
                write!(f, "{what} limit of {limit} reached")
            }
            Self::Encode(err) => write!(f, "response encoding failed: {err}"),
        }
    }
}

impl fmt::Display for PayloadReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownProperty { name } => write!(f, "unknown property {name:?}"),
            Self::NotWritable { name } => write!(f, "property {name:?} is not client writable"),
            Self::WrongKind {
                name,
                expected,
                found,
            } => {
                write!(f, "property {name:?} expects {expected}, found {found}")
            }
            Self::InvalidValue { name, detail } => {
                write!(f, "invalid value for {name:?}: {detail}")
            }
            Self::UnknownEvent { name } => write!(f, "unknown event {name:?}"),
            Self::UnknownMethod { name } => write!(f, "unknown method {name:?}"),
            Self::UnexpectedOperation { kind } => write!(f, "unexpected {kind} operation"),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::BadRequest(err) => Some(err),
            Self::Encode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DecodeError> for SyncError {
    fn from(err: DecodeError) -> Self {
        Self::BadRequest(err)
    }
}

impl From<EncodeError> for SyncError {
    fn from(err: EncodeError) -> Self {
        Self::Encode(err)
    }
}
