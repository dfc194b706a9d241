//! Operation model and JSON message encoding for widgetsync.
//!
//! This crate handles the message format exchanged with the client: the
//! operation variants, message heads, JSON encoding of outbound messages and
//! bounded decoding of inbound ones. It does not know about widgets or
//! sessions, only the structure of messages.
//!
//! # Design Principles
//!
//! - **Order preserving** - Operations are kept in the order they were produced.
//! - **Bounded decoding** - Sizes and counts are validated against limits.
//! - **No domain knowledge** - Object ids and type tags are opaque strings here.
//!
//! # Message shape
//!
//! ```text
//! { "head": { ... }, "operations": [ ["set", "w3", { "text": "foo" }], ... ] }
//! ```

mod error;
mod limits;
mod message;
mod operation;

pub use error::{DecodeError, EncodeError, LimitKind, OperationReason, WireResult};
pub use limits::Limits;
pub use message::{
    decode_client_message, decode_protocol_message, encode_message, ClientMessage, ErrorNote,
    MessageHead, ProtocolMessage,
};
pub use operation::{Operation, OperationKind, Properties};

pub use serde_json::Value as JsonValue;
