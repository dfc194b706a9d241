//! Session ownership for widgetsync.
//!
//! A [`SessionManager`] owns every session of an application. Each session
//! sits behind its own ticket lock, so one session's requests are processed
//! strictly one after another, in arrival order, while different sessions
//! proceed in parallel.
//! Sessions that stay idle past the configured timeout expire.
//!
//! # Design Principles
//!
//! - **Single writer per session** - The engine's state is not internally
//!   synchronized; the manager provides the exclusion.
//! - **No shared mutable state between sessions** - Sessions share only the
//!   immutable [`engine::Application`].
//! - **Transport agnostic** - Bytes in, bytes out. Cookies and HTTP framing
//!   live elsewhere.

mod config;
mod error;
mod manager;
mod slot;

pub use config::ManagerConfig;
pub use error::{SessionError, SessionResult};
pub use manager::{SessionId, SessionManager};
