//! Schema validation errors.

use std::fmt;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur when building or validating type definitions and values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Duplicate type tag in a registry.
    DuplicateType { tag: String },

    /// Duplicate property name within a type.
    DuplicateProperty { tag: String, name: String },

    /// Duplicate event or method name within a type.
    DuplicateEvent { tag: String, name: String },

    /// Name is empty or contains characters outside `[A-Za-z0-9_]`.
    InvalidName { tag: String, name: String },

    /// Property name collides with a structural create property.
    ReservedProperty { tag: String, name: String },

    /// Gradient colors/stops do not satisfy the gradient invariant.
    InvalidGradient(GradientReason),
}

/// Details for invalid gradient errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientReason {
    NoColors,
    CountMismatch { colors: usize, stops: usize },
    FirstStopNotZero { found: u8 },
    NotAscending { index: usize, previous: u8, current: u8 },
    StopOutOfRange { index: usize, value: u8 },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateType { tag } => write!(f, "duplicate type {tag}"),
            Self::DuplicateProperty { tag, name } => {
                write!(f, "duplicate property {name} on {tag}")
            }
            Self::DuplicateEvent { tag, name } => {
                write!(f, "duplicate event or method {name} on {tag}")
            }
            Self::InvalidName { tag, name } => {
                write!(f, "invalid name {name:?} on {tag}")
            }
            Self::ReservedProperty { tag, name } => {
                write!(f, "property {name} on {tag} is reserved")
            }
            Self::InvalidGradient(reason) => write!(f, "invalid gradient: {reason}"),
        }
    }
}

impl fmt::Display for GradientReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoColors => write!(f, "at least one color is required"),
            Self::CountMismatch { colors, stops } => {
                write!(f, "{colors} colors but {stops} stops")
            }
            Self::FirstStopNotZero { found } => {
                write!(f, "first stop must be 0, found {found}")
            }
            Self::NotAscending {
                index,
                previous,
                current,
            } => {
                write!(
                    f,
                    "stop {index} ({current}) is not above previous stop ({previous})"
                )
            }
            Self::StopOutOfRange { index, value } => {
                write!(f, "stop {index} ({value}) exceeds 100")
            }
        }
    }
}

impl std::error::Error for SchemaError {}
