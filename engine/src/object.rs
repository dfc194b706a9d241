//! Server-side remote objects.

use std::collections::{BTreeMap, BTreeSet};

use schema::{TypeTag, Value};

use crate::types::ObjectId;

/// A server-initiated method call waiting to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCall {
    pub method: String,
    pub properties: BTreeMap<String, Value>,
}

/// A server-side entity with a client-side counterpart.
///
/// Holds only current state. What the client last saw lives in the
/// session's preserved state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    id: ObjectId,
    type_tag: TypeTag,
    parent: Option<ObjectId>,
    styles: Vec<String>,
    properties: BTreeMap<String, Value>,
    listeners: BTreeSet<String>,
    pending_calls: Vec<PendingCall>,
}

impl RemoteObject {
    pub(crate) fn new(
        id: ObjectId,
        type_tag: TypeTag,
        parent: Option<ObjectId>,
        styles: Vec<String>,
    ) -> Self {
        Self {
            id,
            type_tag,
            parent,
            styles,
            properties: BTreeMap::new(),
            listeners: BTreeSet::new(),
            pending_calls: Vec::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    #[must_use]
    pub const fn type_tag(&self) -> &TypeTag {
        &self.type_tag
    }

    #[must_use]
    pub const fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Style flags sent with the create operation.
    #[must_use]
    pub fn styles(&self) -> &[String] {
        &self.styles
    }

    /// Returns the explicitly set value of a property.
    ///
    /// `None` means the property was never set and resolves to the type's
    /// default.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Sets a property. `Value::Null` is an explicit reset.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), value.into());
    }

    /// Removes an explicit value, reverting the property to its default.
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.properties.remove(name)
    }

    #[must_use]
    pub const fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    /// Enables or disables client notification for an event type.
    pub fn listen(&mut self, event: impl Into<String>, enabled: bool) {
        let event = event.into();
        if enabled {
            self.listeners.insert(event);
        } else {
            self.listeners.remove(&event);
        }
    }

    #[must_use]
    pub fn is_listening(&self, event: &str) -> bool {
        self.listeners.contains(event)
    }

    #[must_use]
    pub const fn listeners(&self) -> &BTreeSet<String> {
        &self.listeners
    }

    /// Queues a client-side method call for the next render.
    pub fn call(&mut self, method: impl Into<String>, properties: BTreeMap<String, Value>) {
        self.pending_calls.push(PendingCall {
            method: method.into(),
            properties,
        });
    }

    #[must_use]
    pub fn pending_calls(&self) -> &[PendingCall] {
        &self.pending_calls
    }

    pub(crate) fn clear_calls(&mut self) {
        self.pending_calls.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label() -> RemoteObject {
        RemoteObject::new(
            ObjectId::new(3),
            TypeTag::new("rwt.widgets.Label"),
            Some(ObjectId::new(2)),
            vec!["SHADOW_IN".to_string()],
        )
    }

    #[test]
    fn properties_start_unset() {
        let object = label();
        assert!(object.get("text").is_none());
        assert!(object.properties().is_empty());
        assert_eq!(object.parent(), Some(ObjectId::new(2)));
        assert_eq!(object.styles(), ["SHADOW_IN".to_string()]);
    }

    #[test]
    fn set_and_unset() {
        let mut object = label();
        object.set("text", "foo");
        assert_eq!(object.get("text"), Some(&Value::Str("foo".to_string())));
        object.set("text", Value::Null);
        assert_eq!(object.get("text"), Some(&Value::Null));
        assert_eq!(object.unset("text"), Some(Value::Null));
        assert!(object.get("text").is_none());
    }

    #[test]
    fn listeners_toggle() {
        let mut object = label();
        object.listen("Selection", true);
        assert!(object.is_listening("Selection"));
        object.listen("Selection", false);
        assert!(!object.is_listening("Selection"));
        object.listen("Selection", false);
        assert!(object.listeners().is_empty());
    }

    #[test]
    fn calls_queue_in_order() {
        let mut object = label();
        object.call("focus", BTreeMap::new());
        object.call("show", BTreeMap::new());
        let methods: Vec<_> = object
            .pending_calls()
            .iter()
            .map(|call| call.method.as_str())
            .collect();
        assert_eq!(methods, vec!["focus", "show"]);
        object.clear_calls();
        assert!(object.pending_calls().is_empty());
    }
}
