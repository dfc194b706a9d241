//! Per-session limits and engine configuration.

use serde::Deserialize;

/// Limits on the state a single session may accumulate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SessionLimits {
    /// Maximum number of live remote objects.
    pub max_objects: usize,

    /// Maximum number of events queued by one request.
    pub max_events_per_request: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_objects: 64 * 1024,
            max_events_per_request: 1024,
        }
    }
}

impl SessionLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_objects: 256,
            max_events_per_request: 16,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_objects: usize::MAX,
            max_events_per_request: usize::MAX,
        }
    }
}

/// Engine configuration, loadable from JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Limits applied to inbound and outbound messages.
    pub protocol: protocol::Limits,

    pub session: SessionLimits,
}

impl EngineConfig {
    /// Creates a configuration suitable for testing.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            protocol: protocol::Limits::for_testing(),
            session: SessionLimits::for_testing(),
        }
    }
}
