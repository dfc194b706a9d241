//! Configurable limits for bounded message handling.

use serde::Deserialize;

/// Message-level limits.
///
/// Enforced while decoding inbound client messages and while encoding
/// outbound protocol messages. Missing fields fall back to the defaults when
/// deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Limits {
    /// Maximum message size in bytes.
    pub max_message_bytes: usize,

    /// Maximum number of operations in a message.
    pub max_operations: usize,

    /// Maximum number of properties in a single operation payload.
    pub max_properties: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            // Initial renders of large forms stay well below this
            max_message_bytes: 4 * 1024 * 1024,
            max_operations: 16 * 1024,
            max_properties: 256,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_message_bytes: 64 * 1024,
            max_operations: 256,
            max_properties: 32,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_message_bytes: usize::MAX,
            max_operations: usize::MAX,
            max_properties: usize::MAX,
        }
    }
}
