//! Session manager configuration.

use std::time::Duration;

use serde::Deserialize;

/// Capacity and idle timeout of a [`SessionManager`](crate::SessionManager).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ManagerConfig {
    /// Maximum number of live sessions. The least recently used session is
    /// evicted beyond this.
    pub capacity: u64,

    /// Idle time in milliseconds after which a session expires.
    pub time_to_idle: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            // 30 minutes
            time_to_idle: 30 * 60 * 1000,
        }
    }
}

impl ManagerConfig {
    /// Creates a configuration suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            capacity: 64,
            time_to_idle: 60 * 1000,
        }
    }

    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.time_to_idle)
    }
}
