//! Protocol operations.

use std::fmt;

use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::Value as JsonValue;

use crate::error::OperationReason;

/// Encoded property payload of an operation.
pub type Properties = serde_json::Map<String, JsonValue>;

/// Operation type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Create,
    Set,
    Call,
    Listen,
    Destroy,
    Notify,
}

impl OperationKind {
    /// Returns the wire name of the operation type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Set => "set",
            Self::Call => "call",
            Self::Listen => "listen",
            Self::Destroy => "destroy",
            Self::Notify => "notify",
        }
    }

    /// Parses a wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "create" => Some(Self::Create),
            "set" => Some(Self::Set),
            "call" => Some(Self::Call),
            "listen" => Some(Self::Listen),
            "destroy" => Some(Self::Destroy),
            "notify" => Some(Self::Notify),
            _ => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single protocol operation. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Create a client-side counterpart. `parent` is written into the
    /// properties as `"parent"` on the wire.
    Create {
        target: String,
        type_tag: String,
        parent: Option<String>,
        properties: Properties,
    },
    Set {
        target: String,
        properties: Properties,
    },
    Call {
        target: String,
        method: String,
        properties: Properties,
    },
    Listen {
        target: String,
        event: String,
        enabled: bool,
    },
    Destroy {
        target: String,
    },
    Notify {
        target: String,
        event: String,
        properties: Properties,
    },
}

impl Operation {
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Set { .. } => OperationKind::Set,
            Self::Call { .. } => OperationKind::Call,
            Self::Listen { .. } => OperationKind::Listen,
            Self::Destroy { .. } => OperationKind::Destroy,
            Self::Notify { .. } => OperationKind::Notify,
        }
    }

    /// Returns the id of the addressed object.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::Create { target, .. }
            | Self::Set { target, .. }
            | Self::Call { target, .. }
            | Self::Listen { target, .. }
            | Self::Destroy { target }
            | Self::Notify { target, .. } => target,
        }
    }

    /// Returns the property payload, if the operation carries one.
    #[must_use]
    pub const fn properties(&self) -> Option<&Properties> {
        match self {
            Self::Create { properties, .. }
            | Self::Set { properties, .. }
            | Self::Call { properties, .. }
            | Self::Notify { properties, .. } => Some(properties),
            Self::Listen { .. } | Self::Destroy { .. } => None,
        }
    }

    /// Returns the JSON array form of the operation.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let kind = JsonValue::from(self.kind().as_str());
        match self {
            Self::Create {
                target,
                type_tag,
                parent,
                properties,
            } => {
                let mut props = Properties::new();
                if let Some(parent) = parent {
                    props.insert("parent".to_string(), JsonValue::from(parent.as_str()));
                }
                for (name, value) in properties {
                    props.insert(name.clone(), value.clone());
                }
                JsonValue::Array(vec![
                    kind,
                    JsonValue::from(target.as_str()),
                    JsonValue::from(type_tag.as_str()),
                    JsonValue::Object(props),
                ])
            }
            Self::Set { target, properties } => JsonValue::Array(vec![
                kind,
                JsonValue::from(target.as_str()),
                JsonValue::Object(properties.clone()),
            ]),
            Self::Call {
                target,
                method: name,
                properties,
            }
            | Self::Notify {
                target,
                event: name,
                properties,
            } => JsonValue::Array(vec![
                kind,
                JsonValue::from(target.as_str()),
                JsonValue::from(name.as_str()),
                JsonValue::Object(properties.clone()),
            ]),
            Self::Listen {
                target,
                event,
                enabled,
            } => {
                let mut props = Properties::new();
                props.insert(event.clone(), JsonValue::Bool(*enabled));
                JsonValue::Array(vec![
                    kind,
                    JsonValue::from(target.as_str()),
                    JsonValue::Object(props),
                ])
            }
            Self::Destroy { target } => {
                JsonValue::Array(vec![kind, JsonValue::from(target.as_str())])
            }
        }
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_json() {
            JsonValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in &items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            other => other.serialize(serializer),
        }
    }
}

/// Which operation types a decoder accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    /// Client to server: set, call, notify, listen.
    Inbound,
    /// Server to client: create, set, call, listen, destroy.
    Outbound,
}

impl Direction {
    const fn accepts(self, kind: OperationKind) -> bool {
        match self {
            Self::Inbound => matches!(
                kind,
                OperationKind::Set
                    | OperationKind::Call
                    | OperationKind::Notify
                    | OperationKind::Listen
            ),
            Self::Outbound => !matches!(kind, OperationKind::Notify),
        }
    }
}

/// Decodes one JSON operation entry, appending the result to `out`.
///
/// A listen entry expands to one operation per event member.
pub(crate) fn decode_operation(
    entry: &JsonValue,
    direction: Direction,
    out: &mut Vec<Operation>,
) -> Result<(), OperationReason> {
    let items = entry.as_array().ok_or(OperationReason::NotAnArray)?;
    let first = items.first().ok_or(OperationReason::Empty)?;
    let name = first.as_str().ok_or(OperationReason::UnknownType {
        name: first.to_string(),
    })?;
    let kind = OperationKind::from_name(name)
        .filter(|kind| direction.accepts(*kind))
        .ok_or_else(|| OperationReason::UnknownType {
            name: name.to_string(),
        })?;
    let op = kind.as_str();

    match kind {
        OperationKind::Create => {
            expect_arity(op, items, 4)?;
            let target = string_member(op, items, 1)?;
            let type_tag = string_member(op, items, 2)?;
            let mut properties = object_member(op, items, 3)?;
            let parent = match properties.remove("parent") {
                None => None,
                Some(JsonValue::String(parent)) => Some(parent),
                Some(_) => {
                    return Err(OperationReason::InvalidMember {
                        op,
                        position: 3,
                        expected: "a string parent",
                    })
                }
            };
            out.push(Operation::Create {
                target,
                type_tag,
                parent,
                properties,
            });
        }
        OperationKind::Set => {
            expect_arity(op, items, 3)?;
            out.push(Operation::Set {
                target: string_member(op, items, 1)?,
                properties: object_member(op, items, 2)?,
            });
        }
        OperationKind::Call => {
            expect_arity(op, items, 4)?;
            out.push(Operation::Call {
                target: string_member(op, items, 1)?,
                method: string_member(op, items, 2)?,
                properties: object_member(op, items, 3)?,
            });
        }
        OperationKind::Notify => {
            expect_arity(op, items, 4)?;
            out.push(Operation::Notify {
                target: string_member(op, items, 1)?,
                event: string_member(op, items, 2)?,
                properties: object_member(op, items, 3)?,
            });
        }
        OperationKind::Listen => {
            expect_arity(op, items, 3)?;
            let target = string_member(op, items, 1)?;
            let events = object_member(op, items, 2)?;
            let mut listens = Vec::with_capacity(events.len());
            for (event, enabled) in events {
                let enabled = enabled.as_bool().ok_or(OperationReason::InvalidMember {
                    op,
                    position: 2,
                    expected: "an object of booleans",
                })?;
                listens.push(Operation::Listen {
                    target: target.clone(),
                    event,
                    enabled,
                });
            }
            out.extend(listens);
        }
        OperationKind::Destroy => {
            expect_arity(op, items, 2)?;
            out.push(Operation::Destroy {
                target: string_member(op, items, 1)?,
            });
        }
    }
    Ok(())
}

fn expect_arity(
    op: &'static str,
    items: &[JsonValue],
    expected: usize,
) -> Result<(), OperationReason> {
    if items.len() == expected {
        Ok(())
    } else {
        Err(OperationReason::WrongArity {
            op,
            expected,
            found: items.len(),
        })
    }
}

fn string_member(
    op: &'static str,
    items: &[JsonValue],
    position: usize,
) -> Result<String, OperationReason> {
    items[position]
        .as_str()
        .map(str::to_string)
        .ok_or(OperationReason::InvalidMember {
            op,
            position,
            expected: "a string",
        })
}

fn object_member(
    op: &'static str,
    items: &[JsonValue],
    position: usize,
) -> Result<Properties, OperationReason> {
    items[position]
        .as_object()
        .cloned()
        .ok_or(OperationReason::InvalidMember {
            op,
            position,
            expected: "an object",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: JsonValue) -> Properties {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn create_writes_parent_into_properties() {
        let op = Operation::Create {
            target: "w3".to_string(),
            type_tag: "rwt.widgets.Label".to_string(),
            parent: Some("w2".to_string()),
            properties: props(json!({"style": ["SHADOW_IN"]})),
        };
        assert_eq!(
            op.to_json(),
            json!(["create", "w3", "rwt.widgets.Label", {"parent": "w2", "style": ["SHADOW_IN"]}])
        );
    }

    #[test]
    fn set_keeps_explicit_null() {
        let op = Operation::Set {
            target: "w3".to_string(),
            properties: props(json!({"image": null})),
        };
        assert_eq!(op.to_json(), json!(["set", "w3", {"image": null}]));
    }

    #[test]
    fn listen_and_destroy_shapes() {
        let listen = Operation::Listen {
            target: "w4".to_string(),
            event: "Selection".to_string(),
            enabled: true,
        };
        assert_eq!(listen.to_json(), json!(["listen", "w4", {"Selection": true}]));
        let destroy = Operation::Destroy {
            target: "w4".to_string(),
        };
        assert_eq!(destroy.to_json(), json!(["destroy", "w4"]));
    }

    #[test]
    fn serialize_matches_to_json() {
        let op = Operation::Call {
            target: "w5".to_string(),
            method: "show".to_string(),
            properties: Properties::new(),
        };
        let encoded = serde_json::to_value(&op).unwrap();
        assert_eq!(encoded, op.to_json());
    }

    #[test]
    fn decode_inbound_notify() {
        let mut out = Vec::new();
        decode_operation(
            &json!(["notify", "w4", "Selection", {"button": 1}]),
            Direction::Inbound,
            &mut out,
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind(), OperationKind::Notify);
        assert_eq!(out[0].target(), "w4");
    }

    #[test]
    fn decode_inbound_rejects_create() {
        let mut out = Vec::new();
        let err = decode_operation(
            &json!(["create", "w4", "rwt.widgets.Label", {}]),
            Direction::Inbound,
            &mut out,
        )
        .unwrap_err();
        assert!(matches!(err, OperationReason::UnknownType { .. }));
    }

    #[test]
    fn decode_rejects_wrong_arity() {
        let mut out = Vec::new();
        let err =
            decode_operation(&json!(["notify", "w4", {}]), Direction::Inbound, &mut out).unwrap_err();
        assert_eq!(
            err,
            OperationReason::WrongArity {
                op: "notify",
                expected: 4,
                found: 3
            }
        );
    }

    #[test]
    fn decode_listen_expands_events() {
        let mut out = Vec::new();
        decode_operation(
            &json!(["listen", "w4", {"Modify": true, "Selection": false}]),
            Direction::Inbound,
            &mut out,
        )
        .unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|op| op.kind() == OperationKind::Listen));
    }

    #[test]
    fn decode_listen_rejects_non_boolean() {
        let mut out = Vec::new();
        let err = decode_operation(
            &json!(["listen", "w4", {"Modify": 1}]),
            Direction::Inbound,
            &mut out,
        )
        .unwrap_err();
        assert!(matches!(err, OperationReason::InvalidMember { position: 2, .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn decode_outbound_create_extracts_parent() {
        let mut out = Vec::new();
        decode_operation(
            &json!(["create", "w3", "rwt.widgets.Label", {"parent": "w2", "text": "a"}]),
            Direction::Outbound,
            &mut out,
        )
        .unwrap();
        match &out[0] {
            Operation::Create {
                parent, properties, ..
            } => {
                assert_eq!(parent.as_deref(), Some("w2"));
                assert!(!properties.contains_key("parent"));
            }
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[test]
    fn kind_names_roundtrip() {
        for kind in [
            OperationKind::Create,
            OperationKind::Set,
            OperationKind::Call,
            OperationKind::Listen,
            OperationKind::Destroy,
            OperationKind::Notify,
        ] {
            assert_eq!(OperationKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(OperationKind::from_name("patch"), None);
    }
}
