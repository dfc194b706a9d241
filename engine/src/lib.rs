//! Render lifecycle and protocol diffing for widgetsync.
//!
//! The engine keeps a client-rendered widget tree in sync with server-held
//! objects. Each request runs through a fixed sequence of phases:
//!
//! 1. `ReadData` applies inbound client operations to the addressed objects.
//! 2. `ProcessAction` runs application handlers, which may mutate objects.
//! 3. `Render` diffs every object against what the client last saw and
//!    assembles the minimal set of operations.
//! 4. `ResponseWritten` commits the preserved state for the next request.
//!
//! # Design Principles
//!
//! - **Explicit state** - The registry and preserved state are owned by a
//!   [`Session`] and threaded through the cycle. Nothing is global.
//! - **All or nothing** - Adapters emit into a context that is committed only
//!   on success, and an abandoned request rolls preserved state back.
//! - **Open dispatch** - Adapters are looked up by type tag at runtime.
//! - **Errors are visible** - Per-object errors go to the response head,
//!   structural errors abort the request.

mod adapter;
mod application;
mod assembler;
mod encode;
mod error;
mod event;
mod lifecycle;
mod limits;
mod object;
mod phase;
mod preserved;
mod registry;
mod session;
mod types;
mod ui;

pub use adapter::{
    apply_operation, current_value, render_calls, render_create, render_listeners,
    render_property_changes, AdapterRegistry, ReadContext, RenderContext, TypeAdapter,
    WidgetAdapter,
};
pub use application::{Application, EntryPoint};
pub use assembler::MessageAssembler;
pub use encode::{decode_value, encode_value, MapResolver, ResourceResolver};
pub use error::{PayloadReason, SyncError, SyncResult};
pub use event::{Event, EventKind};
pub use lifecycle::RequestCycle;
pub use limits::{EngineConfig, SessionLimits};
pub use object::{PendingCall, RemoteObject};
pub use phase::{Phase, PhaseMachine};
pub use preserved::{listener_key, PreservedState};
pub use registry::{DestroyedSubtree, ObjectRegistry};
pub use session::{error_response, Session};
pub use types::ObjectId;
pub use ui::{Handler, Ui};
