//! Error types for message encoding and decoding.

use std::fmt;

/// Result type for message decoding.
pub type WireResult<T> = Result<T, DecodeError>;

/// Errors that can occur while decoding a message.
///
/// Every variant is a BadRequest-class failure: the whole message is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// Body is not valid JSON.
    InvalidJson { message: String },

    /// Message root is not a JSON object.
    NotAnObject,

    /// A required top-level member is missing.
    MissingField { field: &'static str },

    /// A top-level member has the wrong JSON type.
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    /// An operation entry is malformed.
    InvalidOperation {
        index: usize,
        reason: OperationReason,
    },

    /// Limits exceeded.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },
}

/// Details for malformed operation entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationReason {
    NotAnArray,
    Empty,
    UnknownType { name: String },
    WrongArity {
        op: &'static str,
        expected: usize,
        found: usize,
    },
    InvalidMember {
        op: &'static str,
        position: usize,
        expected: &'static str,
    },
}

/// Specific message limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    MessageBytes,
    Operations,
    Properties,
}

/// Errors that can occur during encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    MessageTooLarge { size: usize, limit: usize },
    TooManyOperations { count: usize, limit: usize },
    Json { message: String },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson { message } => write!(f, "invalid json: {message}"),
            Self::NotAnObject => write!(f, "message root is not an object"),
            Self::MissingField { field } => write!(f, "missing member {field:?}"),
            Self::InvalidField { field, expected } => {
                write!(f, "member {field:?} must be {expected}")
            }
            Self::InvalidOperation { index, reason } => {
                write!(f, "invalid operation {index}: {reason}")
            }
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
            } => {
                write!(f, "{kind} limit exceeded: {actual} > {limit}")
            }
        }
    }
}

impl fmt::Display for OperationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnArray => write!(f, "operation is not an array"),
            Self::Empty => write!(f, "operation is empty"),
            Self::UnknownType { name } => write!(f, "unknown operation type {name:?}"),
            Self::WrongArity {
                op,
                expected,
                found,
            } => {
                write!(f, "{op} expects {expected} members, found {found}")
            }
            Self::InvalidMember {
                op,
                position,
                expected,
            } => {
                write!(f, "{op} member {position} must be {expected}")
            }
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MessageBytes => "message bytes",
            Self::Operations => "operation count",
            Self::Properties => "property count",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MessageTooLarge { size, limit } => {
                write!(f, "message too large: {size} bytes > {limit}")
            }
            Self::TooManyOperations { count, limit } => {
                write!(f, "too many operations: {count} > {limit}")
            }
            Self::Json { message } => write!(f, "json encoding failed: {message}"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl std::error::Error for EncodeError {}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidJson {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for EncodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_display_wrong_arity() {
        let err = DecodeError::InvalidOperation {
            index: 2,
            reason: OperationReason::WrongArity {
                op: "notify",
                expected: 4,
                found: 3,
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("operation 2"));
        assert!(msg.contains("notify expects 4"));
    }

    #[test]
    fn decode_error_display_limits_exceeded() {
        let err = DecodeError::LimitsExceeded {
            kind: LimitKind::Operations,
            limit: 4,
            actual: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("operation count"));
        assert!(msg.contains("10"));
    }

    #[test]
    fn decode_error_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: DecodeError = json_err.into();
        assert!(matches!(err, DecodeError::InvalidJson { .. }));
    }

    #[test]
    fn encode_error_display() {
        let err = EncodeError::MessageTooLarge { size: 10, limit: 4 };
        let msg = err.to_string();
        assert!(msg.contains("message too large"));
    }
}
