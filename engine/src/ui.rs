//! Application access to the widget tree during `ProcessAction`.

use std::collections::BTreeMap;

use schema::{TypeDef, Value};

use crate::adapter::AdapterRegistry;
use crate::error::{PayloadReason, SyncError, SyncResult};
use crate::event::Event;
use crate::object::RemoteObject;
use crate::registry::ObjectRegistry;
use crate::types::ObjectId;

/// An application event handler.
pub type Handler = Box<dyn FnMut(&mut Ui<'_>, &Event) -> SyncResult<()> + Send>;

pub(crate) type HandlerMap = BTreeMap<(ObjectId, String), HandlerSlot>;

/// An entry in a session's handler map.
pub(crate) enum HandlerSlot {
    Installed(Handler),
    /// The handler is out for dispatch. Removing or replacing the slot while
    /// it runs decides what happens to it afterwards.
    Running,
}

impl HandlerSlot {
    /// Takes the handler out for dispatch, leaving `Running` behind.
    pub(crate) fn begin(&mut self) -> Option<Handler> {
        match std::mem::replace(self, Self::Running) {
            Self::Installed(handler) => Some(handler),
            Self::Running => None,
        }
    }

    /// Puts a dispatched handler back unless the slot was replaced.
    pub(crate) fn finish(&mut self, handler: Handler) {
        if matches!(self, Self::Running) {
            *self = Self::Installed(handler);
        }
    }
}

/// Mutable view of a session's objects.
///
/// Only obtainable while a request is in `ProcessAction`, so application
/// code cannot change state after the render pass has captured it.
pub struct Ui<'a> {
    registry: &'a mut ObjectRegistry,
    handlers: &'a mut HandlerMap,
    adapters: &'a AdapterRegistry,
}

impl<'a> Ui<'a> {
    pub(crate) fn new(
        registry: &'a mut ObjectRegistry,
        handlers: &'a mut HandlerMap,
        adapters: &'a AdapterRegistry,
    ) -> Self {
        Self {
            registry,
            handlers,
            adapters,
        }
    }

    /// Registers a new object.
    pub fn create(&mut self, type_tag: &str, parent: Option<ObjectId>) -> SyncResult<ObjectId> {
        self.create_with_style(type_tag, parent, &[])
    }

    /// Registers a new object with style flags.
    pub fn create_with_style(
        &mut self,
        type_tag: &str,
        parent: Option<ObjectId>,
        styles: &[&str],
    ) -> SyncResult<ObjectId> {
        let styles = styles.iter().map(|style| (*style).to_string()).collect();
        self.registry.register(type_tag, parent, styles)
    }

    pub fn object(&self, id: ObjectId) -> SyncResult<&RemoteObject> {
        self.registry.resolve(id)
    }

    #[must_use]
    pub fn exists(&self, id: ObjectId) -> bool {
        self.registry.contains(id)
    }

    #[must_use]
    pub fn children(&self, id: ObjectId) -> Vec<ObjectId> {
        self.registry.children(id)
    }

    /// Returns the current value of a property, or its default.
    pub fn get(&self, id: ObjectId, name: &str) -> SyncResult<Value> {
        let object = self.registry.resolve(id)?;
        if let Some(value) = object.get(name) {
            return Ok(value.clone());
        }
        Ok(self
            .type_def(object)
            .and_then(|def| def.find_property(name))
            .map(|property| property.default.clone())
            .unwrap_or_default())
    }

    /// Sets a property.
    ///
    /// Fails if the object's type does not define the property or the value
    /// is of a different kind than the default.
    pub fn set(&mut self, id: ObjectId, name: &str, value: impl Into<Value>) -> SyncResult<()> {
        let value = value.into();
        let object = self.registry.resolve(id)?;
        if let Some(def) = self.type_def(object) {
            let property = def.find_property(name).ok_or_else(|| SyncError::MalformedPayload {
                target: id,
                reason: PayloadReason::UnknownProperty {
                    name: name.to_string(),
                },
            })?;
            let default = &property.default;
            if !default.is_null() && !value.is_null() && default.kind_name() != value.kind_name()
            {
                return Err(SyncError::MalformedPayload {
                    target: id,
                    reason: PayloadReason::WrongKind {
                        name: name.to_string(),
                        expected: default.kind_name(),
                        found: value.kind_name(),
                    },
                });
            }
        }
        self.registry.resolve_mut(id)?.set(name, value);
        Ok(())
    }

    /// Enables or disables client notification for an event type.
    pub fn listen(&mut self, id: ObjectId, event: &str, enabled: bool) -> SyncResult<()> {
        let object = self.registry.resolve(id)?;
        let known = self.type_def(object).is_some_and(|def| def.has_event(event));
        if !known {
            return Err(SyncError::MalformedPayload {
                target: id,
                reason: PayloadReason::UnknownEvent {
                    name: event.to_string(),
                },
            });
        }
        self.registry.resolve_mut(id)?.listen(event, enabled);
        Ok(())
    }

    /// Queues a client-side method call.
    ///
    /// Fails if the object's type does not define the method.
    pub fn call(
        &mut self,
        id: ObjectId,
        method: &str,
        properties: BTreeMap<String, Value>,
    ) -> SyncResult<()> {
        let object = self.registry.resolve(id)?;
        let known = self.type_def(object).is_some_and(|def| def.has_method(method));
        if !known {
            return Err(SyncError::MalformedPayload {
                target: id,
                reason: PayloadReason::UnknownMethod {
                    name: method.to_string(),
                },
            });
        }
        self.registry.resolve_mut(id)?.call(method, properties);
        Ok(())
    }

    /// Installs a handler for an event type or method of an object.
    ///
    /// Installing a handler for an event type also enables the listener.
    pub fn on<F>(&mut self, id: ObjectId, name: &str, handler: F) -> SyncResult<()>
    where
        F: FnMut(&mut Ui<'_>, &Event) -> SyncResult<()> + Send + 'static,
    {
        let object = self.registry.resolve(id)?;
        let def = self
            .type_def(object)
            .ok_or_else(|| SyncError::UnsupportedType {
                target: id,
                type_tag: object.type_tag().to_string(),
            })?;
        let is_event = def.has_event(name);
        if !is_event && !def.has_method(name) {
            return Err(SyncError::MalformedPayload {
                target: id,
                reason: PayloadReason::UnknownEvent {
                    name: name.to_string(),
                },
            });
        }
        if is_event {
            self.registry.resolve_mut(id)?.listen(name, true);
        }
        self.handlers.insert(
            (id, name.to_string()),
            HandlerSlot::Installed(Box::new(handler)),
        );
        Ok(())
    }

    /// Removes a handler. Installing and removing leaves the listener off.
    ///
    /// A handler may remove itself while it runs.
    pub fn off(&mut self, id: ObjectId, name: &str) -> bool {
        if let Ok(object) = self.registry.resolve_mut(id) {
            object.listen(name, false);
        }
        self.handlers.remove(&(id, name.to_string())).is_some()
    }

    /// Destroys an object and its descendants.
    ///
    /// Returns false if the object was already gone.
    pub fn destroy(&mut self, id: ObjectId) -> bool {
        if !self.registry.mark_for_destroy(id) {
            return false;
        }
        if let Some(subtree) = self.registry.destroyed().last() {
            let members = &subtree.members;
            self.handlers
                .retain(|(owner, _), _| members.binary_search(owner).is_err());
        }
        true
    }

    fn type_def(&self, object: &RemoteObject) -> Option<&'a TypeDef> {
        self.adapters
            .get(object.type_tag().as_str())
            .map(|adapter| adapter.type_def())
    }
}
