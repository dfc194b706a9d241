//! Message envelopes and their JSON encoding.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{DecodeError, EncodeError, LimitKind, WireResult};
use crate::limits::Limits;
use crate::operation::{decode_operation, Direction, Operation, Properties};

/// An error reported to the client in the message head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNote {
    /// Error class, e.g. `"UnsupportedType"`.
    pub kind: String,
    /// Id of the object the error concerns, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub message: String,
}

impl ErrorNote {
    #[must_use]
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            target: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// Head of a server-to-client message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHead {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_counter: Option<u64>,

    /// Fingerprint of the session's type registry, sent on the first response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<String>,

    /// Per-object errors collected while rendering.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorNote>,

    /// Request-level failure. Set only on error responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorNote>,
}

/// A complete server-to-client message.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ProtocolMessage {
    pub head: MessageHead,
    pub operations: Vec<Operation>,
}

impl ProtocolMessage {
    /// Returns true if the message has no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// A decoded client-to-server message.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientMessage {
    /// Raw head members; the engine reads only the ones it knows.
    pub head: Properties,
    pub operations: Vec<Operation>,
}

impl ClientMessage {
    /// Returns the client's request counter, if present.
    #[must_use]
    pub fn request_counter(&self) -> Option<u64> {
        self.head.get("requestCounter").and_then(JsonValue::as_u64)
    }
}

/// Encodes a protocol message to JSON bytes.
///
/// # Errors
///
/// Returns [`EncodeError`] if the message exceeds `limits`.
pub fn encode_message(message: &ProtocolMessage, limits: &Limits) -> Result<Vec<u8>, EncodeError> {
    if message.operations.len() > limits.max_operations {
        return Err(EncodeError::TooManyOperations {
            count: message.operations.len(),
            limit: limits.max_operations,
        });
    }
    let bytes = serde_json::to_vec(message)?;
    if bytes.len() > limits.max_message_bytes {
        return Err(EncodeError::MessageTooLarge {
            size: bytes.len(),
            limit: limits.max_message_bytes,
        });
    }
    Ok(bytes)
}

/// Decodes an inbound client message.
///
/// Accepts `set`, `call`, `notify` and `listen` operations. The whole
/// message is rejected on the first malformed entry.
///
/// # Errors
///
/// Returns [`DecodeError`] for malformed JSON, bad structure or exceeded
/// limits.
pub fn decode_client_message(bytes: &[u8], limits: &Limits) -> WireResult<ClientMessage> {
    let (head, entries) = decode_envelope(bytes, limits)?;
    let operations = decode_operations(&entries, Direction::Inbound, limits)?;
    Ok(ClientMessage { head, operations })
}

/// Decodes a server-to-client message, as produced by [`encode_message`].
///
/// # Errors
///
/// Returns [`DecodeError`] for malformed JSON, bad structure or exceeded
/// limits.
pub fn decode_protocol_message(bytes: &[u8], limits: &Limits) -> WireResult<ProtocolMessage> {
    let (head, entries) = decode_envelope(bytes, limits)?;
    let head: MessageHead =
        serde_json::from_value(JsonValue::Object(head)).map_err(|_| DecodeError::InvalidField {
            field: "head",
            expected: "a message head",
        })?;
    let operations = decode_operations(&entries, Direction::Outbound, limits)?;
    Ok(ProtocolMessage { head, operations })
}

fn decode_envelope(bytes: &[u8], limits: &Limits) -> WireResult<(Properties, Vec<JsonValue>)> {
    if bytes.len() > limits.max_message_bytes {
        return Err(DecodeError::LimitsExceeded {
            kind: LimitKind::MessageBytes,
            limit: limits.max_message_bytes,
            actual: bytes.len(),
        });
    }

    let root: JsonValue = serde_json::from_slice(bytes)?;
    let JsonValue::Object(mut root) = root else {
        return Err(DecodeError::NotAnObject);
    };

    let head = match root.remove("head") {
        None => Properties::new(),
        Some(JsonValue::Object(head)) => head,
        Some(_) => {
            return Err(DecodeError::InvalidField {
                field: "head",
                expected: "an object",
            })
        }
    };

    let entries = match root.remove("operations") {
        None => return Err(DecodeError::MissingField { field: "operations" }),
        Some(JsonValue::Array(entries)) => entries,
        Some(_) => {
            return Err(DecodeError::InvalidField {
                field: "operations",
                expected: "an array",
            })
        }
    };

    if entries.len() > limits.max_operations {
        return Err(DecodeError::LimitsExceeded {
            kind: LimitKind::Operations,
            limit: limits.max_operations,
            actual: entries.len(),
        });
    }

    Ok((head, entries))
}

fn decode_operations(
    entries: &[JsonValue],
    direction: Direction,
    limits: &Limits,
) -> WireResult<Vec<Operation>> {
    let mut operations = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        check_property_count(entry, limits)?;
        decode_operation(entry, direction, &mut operations)
            .map_err(|reason| DecodeError::InvalidOperation { index, reason })?;
    }
    Ok(operations)
}

fn check_property_count(entry: &JsonValue, limits: &Limits) -> WireResult<()> {
    let Some(items) = entry.as_array() else {
        return Ok(());
    };
    for properties in items.iter().filter_map(JsonValue::as_object) {
        if properties.len() > limits.max_properties {
            return Err(DecodeError::LimitsExceeded {
                kind: LimitKind::Properties,
                limit: limits.max_properties,
                actual: properties.len(),
            });
        }
    }
    Ok(())
}
