//! Value encoding and resource resolution.

use std::collections::BTreeMap;

use protocol::JsonValue;
use schema::{Gradient, Rgba, Value};

use crate::error::{PayloadReason, SyncError, SyncResult};
use crate::types::ObjectId;

/// Maps a resource name to its delivery URL.
///
/// Implementations must be idempotent and free of side effects. Registration
/// and delivery of resources happen outside the engine.
pub trait ResourceResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<String>;
}

impl<F> ResourceResolver for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn resolve(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// A resolver backed by explicitly registered names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapResolver {
    urls: BTreeMap<String, String>,
}

impl MapResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, url: impl Into<String>) {
        self.urls.insert(name.into(), url.into());
    }

    /// Removes a registration. Returns false if the name was unknown.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.urls.remove(name).is_some()
    }

    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.urls.contains_key(name)
    }
}

impl ResourceResolver for MapResolver {
    fn resolve(&self, name: &str) -> Option<String> {
        self.urls.get(name).cloned()
    }
}

/// Encodes a property value for the wire.
///
/// `Null` encodes as JSON `null`. Colors encode as `[r,g,b,a]`, gradients as
/// `[[colors...], [stops...], vertical]` and images as `[url, width, height]`.
pub fn encode_value(
    target: ObjectId,
    value: &Value,
    resolver: &dyn ResourceResolver,
) -> SyncResult<JsonValue> {
    Ok(match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::from(*i),
        Value::Str(s) => JsonValue::from(s.as_str()),
        Value::Color(color) => encode_color(*color),
        Value::Gradient(gradient) => encode_gradient(gradient),
        Value::Image(image) => {
            let url =
                resolver
                    .resolve(&image.resource)
                    .ok_or_else(|| SyncError::UnresolvedResource {
                        target,
                        resource: image.resource.clone(),
                    })?;
            JsonValue::Array(vec![
                JsonValue::from(url),
                JsonValue::from(image.width),
                JsonValue::from(image.height),
            ])
        }
        Value::List(items) => JsonValue::Array(
            items
                .iter()
                .map(|item| encode_value(target, item, resolver))
                .collect::<SyncResult<Vec<_>>>()?,
        ),
    })
}

fn encode_color(color: Rgba) -> JsonValue {
    JsonValue::Array(
        color
            .components()
            .iter()
            .map(|c| JsonValue::from(*c))
            .collect(),
    )
}

fn encode_gradient(gradient: &Gradient) -> JsonValue {
    JsonValue::Array(vec![
        JsonValue::Array(gradient.colors().iter().map(|c| encode_color(*c)).collect()),
        JsonValue::Array(
            gradient
                .stops()
                .iter()
                .map(|s| JsonValue::from(*s))
                .collect(),
        ),
        JsonValue::Bool(gradient.is_vertical()),
    ])
}

/// Decodes an inbound property value.
///
/// Only scalars and lists of scalars come from the client. When `default`
/// is not `Null`, the decoded value must be `Null` or of the same kind.
pub fn decode_value(
    target: ObjectId,
    name: &str,
    json: &JsonValue,
    default: &Value,
) -> SyncResult<Value> {
    let value = decode_json(json).map_err(|detail| SyncError::MalformedPayload {
        target,
        reason: PayloadReason::InvalidValue {
            name: name.to_string(),
            detail,
        },
    })?;
    if default.is_null() || value.is_null() || value.kind_name() == default.kind_name() {
        Ok(value)
    } else {
        Err(SyncError::MalformedPayload {
            target,
            reason: PayloadReason::WrongKind {
                name: name.to_string(),
                expected: default.kind_name(),
                found: value.kind_name(),
            },
        })
    }
}

fn decode_json(json: &JsonValue) -> Result<Value, String> {
    match json {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(b) => Ok(Value::Bool(*b)),
        JsonValue::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| format!("{n} is not an integer")),
        JsonValue::String(s) => Ok(Value::Str(s.clone())),
        JsonValue::Array(items) => items
            .iter()
            .map(decode_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        JsonValue::Object(_) => Err("objects are not property values".to_string()),
    }
}
