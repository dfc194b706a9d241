//! Widget type and property definitions.

use std::fmt;

use crate::Value;

/// Property names that are always emitted structurally on create.
pub const RESERVED_PROPERTIES: &[&str] = &["parent", "style"];

/// The client-side type name of a remote object (e.g. `rwt.widgets.Label`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeTag(String);

impl TypeTag {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// When a property is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Emitted on create when non-default, then on every change.
    Tracked,
    /// Emitted on create when non-default, never afterwards.
    CreateOnly,
}

/// A property definition within a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDef {
    pub name: String,
    pub default: Value,
    pub render: RenderMode,
    /// Whether inbound `set` operations may update this property.
    pub client_writable: bool,
}

impl PropertyDef {
    /// Creates a tracked property.
    #[must_use]
    pub fn tracked(name: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            default,
            render: RenderMode::Tracked,
            client_writable: false,
        }
    }

    /// Creates a property that is only sent with the create operation.
    #[must_use]
    pub fn create_only(name: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            default,
            render: RenderMode::CreateOnly,
            client_writable: false,
        }
    }

    /// Allows the client to update this property.
    #[must_use]
    pub const fn client_writable(mut self) -> Self {
        self.client_writable = true;
        self
    }
}

/// A widget type definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    pub tag: TypeTag,
    pub properties: Vec<PropertyDef>,
    /// Events the client may notify and the server may listen for.
    pub events: Vec<String>,
    /// Server methods the client may call.
    pub methods: Vec<String>,
}

impl TypeDef {
    /// Creates a type with no properties.
    #[must_use]
    pub fn new(tag: impl Into<TypeTag>) -> Self {
        Self {
            tag: tag.into(),
            properties: Vec::new(),
            events: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Adds a property definition.
    #[must_use]
    pub fn property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    /// Adds an event type.
    #[must_use]
    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.events.push(event.into());
        self
    }

    /// Adds a client-callable method.
    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.methods.push(method.into());
        self
    }

    /// Looks up a property definition by name.
    #[must_use]
    pub fn find_property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|def| def.name == name)
    }

    #[must_use]
    pub fn has_event(&self, event: &str) -> bool {
        self.events.iter().any(|name| name == event)
    }

    #[must_use]
    pub fn has_method(&self, method: &str) -> bool {
        self.methods.iter().any(|name| name == method)
    }
}

impl From<String> for TypeTag {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}
