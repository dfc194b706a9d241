//! Client events queued during `ReadData`.

use std::collections::BTreeMap;

use schema::Value;

use crate::types::ObjectId;

/// How an event reached the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A `notify` operation for a listened event type.
    Notify,
    /// A `call` operation invoking a server method.
    Call,
}

/// A client event, dispatched to handlers during `ProcessAction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub target: ObjectId,
    pub kind: EventKind,
    /// Event type or method name.
    pub name: String,
    pub properties: BTreeMap<String, Value>,
}

impl Event {
    #[must_use]
    pub fn notify(target: ObjectId, name: impl Into<String>) -> Self {
        Self {
            target,
            kind: EventKind::Notify,
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn call(target: ObjectId, name: impl Into<String>) -> Self {
        Self {
            target,
            kind: EventKind::Call,
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_properties(mut self, properties: BTreeMap<String, Value>) -> Self {
        self.properties = properties;
        self
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}
