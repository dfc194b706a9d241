//! Per-type render and read contract, and dispatch by type tag.
//!
//! An adapter never writes to the preserved-state store or the message
//! assembler directly. It emits operations and preserved values into a
//! context, and the request cycle commits them only when the adapter
//! succeeds, so a failed render or read leaves no partial trace.

use std::collections::BTreeMap;
use std::fmt;

use protocol::{JsonValue, Operation, Properties};
use schema::{PropertyDef, RenderMode, TypeDef, TypeRegistry, Value};

use crate::encode::{decode_value, encode_value, ResourceResolver};
use crate::error::{PayloadReason, SyncError, SyncResult};
use crate::event::{Event, EventKind};
use crate::object::RemoteObject;
use crate::preserved::{listener_key, PreservedState};
use crate::types::ObjectId;

/// Render-phase view of one object's preserved state.
pub struct RenderContext<'a> {
    target: ObjectId,
    preserved: &'a PreservedState,
    resolver: &'a dyn ResourceResolver,
    operations: Vec<Operation>,
    updates: Vec<(String, Value)>,
}

impl<'a> RenderContext<'a> {
    #[must_use]
    pub fn new(
        target: ObjectId,
        preserved: &'a PreservedState,
        resolver: &'a dyn ResourceResolver,
    ) -> Self {
        Self {
            target,
            preserved,
            resolver,
            operations: Vec::new(),
            updates: Vec::new(),
        }
    }

    #[must_use]
    pub const fn target(&self) -> ObjectId {
        self.target
    }

    /// Returns the value the client last saw, as of the start of the cycle.
    #[must_use]
    pub fn preserved(&self, name: &str) -> Option<&'a Value> {
        self.preserved.get(self.target, name)
    }

    pub fn encode(&self, value: &Value) -> SyncResult<JsonValue> {
        encode_value(self.target, value, self.resolver)
    }

    pub fn emit(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    /// Records a value as sent, effective once the render is committed.
    pub fn preserve(&mut self, name: impl Into<String>, value: Value) {
        self.updates.push((name.into(), value));
    }

    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<Operation>, Vec<(String, Value)>) {
        (self.operations, self.updates)
    }
}

/// Read-phase buffer for one inbound operation.
#[derive(Debug, Default)]
pub struct ReadContext {
    events: Vec<Event>,
    updates: Vec<(String, Value)>,
}

impl ReadContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an event for `ProcessAction`.
    pub fn queue(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Records a client-originated value as already known to the client.
    pub fn preserve(&mut self, name: impl Into<String>, value: Value) {
        self.updates.push((name.into(), value));
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<Event>, Vec<(String, Value)>) {
        (self.events, self.updates)
    }
}

/// The render/read contract implemented once per widget type.
pub trait WidgetAdapter: Send + Sync {
    /// Definition of the type this adapter handles.
    fn type_def(&self) -> &TypeDef;

    /// Renders the create operation for an object the client has never
    /// seen. Called exactly once per object lifetime.
    fn render_initialization(
        &self,
        object: &RemoteObject,
        ctx: &mut RenderContext<'_>,
    ) -> SyncResult<()>;

    /// Renders changes since the client last saw the object.
    fn render_changes(&self, object: &RemoteObject, ctx: &mut RenderContext<'_>)
        -> SyncResult<()>;

    /// Applies one inbound operation. Must validate the whole payload before
    /// mutating `object`.
    fn read_data(
        &self,
        object: &mut RemoteObject,
        operation: &Operation,
        ctx: &mut ReadContext,
    ) -> SyncResult<()>;
}

/// Adapter driven entirely by a [`TypeDef`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAdapter {
    def: TypeDef,
}

impl TypeAdapter {
    #[must_use]
    pub const fn new(def: TypeDef) -> Self {
        Self { def }
    }
}

impl WidgetAdapter for TypeAdapter {
    fn type_def(&self) -> &TypeDef {
        &self.def
    }

    fn render_initialization(
        &self,
        object: &RemoteObject,
        ctx: &mut RenderContext<'_>,
    ) -> SyncResult<()> {
        render_create(&self.def, object, ctx)?;
        render_listeners(&self.def, object, ctx);
        render_calls(object, ctx)
    }

    fn render_changes(
        &self,
        object: &RemoteObject,
        ctx: &mut RenderContext<'_>,
    ) -> SyncResult<()> {
        render_property_changes(&self.def, object, ctx)?;
        render_listeners(&self.def, object, ctx);
        render_calls(object, ctx)
    }

    fn read_data(
        &self,
        object: &mut RemoteObject,
        operation: &Operation,
        ctx: &mut ReadContext,
    ) -> SyncResult<()> {
        apply_operation(&self.def, object, operation, ctx)
    }
}

/// Returns the current value of a property, falling back to its default.
#[must_use]
pub fn current_value<'o>(object: &'o RemoteObject, def: &'o PropertyDef) -> &'o Value {
    object.get(&def.name).unwrap_or(&def.default)
}

/// Emits a create operation carrying the structural properties and every
/// property that differs from its default.
pub fn render_create(
    def: &TypeDef,
    object: &RemoteObject,
    ctx: &mut RenderContext<'_>,
) -> SyncResult<()> {
    let mut properties = Properties::new();
    if !object.styles().is_empty() {
        let styles = object
            .styles()
            .iter()
            .map(|style| JsonValue::from(style.as_str()))
            .collect();
        properties.insert("style".to_string(), JsonValue::Array(styles));
    }

    let mut preserve = Vec::new();
    for property in &def.properties {
        let current = current_value(object, property);
        if *current == property.default {
            continue;
        }
        properties.insert(property.name.clone(), ctx.encode(current)?);
        if property.render == RenderMode::Tracked {
            preserve.push((property.name.clone(), current.clone()));
        }
    }

    ctx.emit(Operation::Create {
        target: object.id().to_string(),
        type_tag: object.type_tag().to_string(),
        parent: object.parent().map(|parent| parent.to_string()),
        properties,
    });
    for (name, value) in preserve {
        ctx.preserve(name, value);
    }
    Ok(())
}

/// Emits one set operation with every tracked property whose value differs
/// from what the client last saw.
pub fn render_property_changes(
    def: &TypeDef,
    object: &RemoteObject,
    ctx: &mut RenderContext<'_>,
) -> SyncResult<()> {
    let mut properties = Properties::new();
    let mut preserve = Vec::new();
    for property in &def.properties {
        if property.render != RenderMode::Tracked {
            continue;
        }
        let current = current_value(object, property);
        let previous = ctx.preserved(&property.name).unwrap_or(&property.default);
        if current == previous {
            continue;
        }
        properties.insert(property.name.clone(), ctx.encode(current)?);
        preserve.push((property.name.clone(), current.clone()));
    }

    if !properties.is_empty() {
        ctx.emit(Operation::Set {
            target: object.id().to_string(),
            properties,
        });
    }
    for (name, value) in preserve {
        ctx.preserve(name, value);
    }
    Ok(())
}

/// Emits listen operations for event types whose listener state changed.
pub fn render_listeners(def: &TypeDef, object: &RemoteObject, ctx: &mut RenderContext<'_>) {
    for event in &def.events {
        let key = listener_key(event);
        let current = object.is_listening(event);
        let previous = ctx
            .preserved(&key)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if current != previous {
            ctx.emit(Operation::Listen {
                target: object.id().to_string(),
                event: event.clone(),
                enabled: current,
            });
            ctx.preserve(key, Value::Bool(current));
        }
    }
}

/// Emits the object's queued method calls.
pub fn render_calls(object: &RemoteObject, ctx: &mut RenderContext<'_>) -> SyncResult<()> {
    for call in object.pending_calls() {
        let mut properties = Properties::new();
        for (name, value) in &call.properties {
            properties.insert(name.clone(), ctx.encode(value)?);
        }
        ctx.emit(Operation::Call {
            target: object.id().to_string(),
            method: call.method.clone(),
            properties,
        });
    }
    Ok(())
}

/// Applies an inbound operation according to a type definition.
pub fn apply_operation(
    def: &TypeDef,
    object: &mut RemoteObject,
    operation: &Operation,
    ctx: &mut ReadContext,
) -> SyncResult<()> {
    let target = object.id();
    let malformed = |reason| SyncError::MalformedPayload { target, reason };

    match operation {
        Operation::Set { properties, .. } => {
            let mut decoded = Vec::with_capacity(properties.len());
            for (name, json) in properties {
                let property = def.find_property(name).ok_or_else(|| {
                    malformed(PayloadReason::UnknownProperty { name: name.clone() })
                })?;
                if !property.client_writable {
                    return Err(malformed(PayloadReason::NotWritable { name: name.clone() }));
                }
                decoded.push((name, decode_value(target, name, json, &property.default)?));
            }
            for (name, value) in decoded {
                object.set(name.clone(), value.clone());
                ctx.preserve(name.clone(), value);
            }
            Ok(())
        }
        Operation::Notify {
            event, properties, ..
        } => {
            if !def.has_event(event) {
                return Err(malformed(PayloadReason::UnknownEvent {
                    name: event.clone(),
                }));
            }
            let properties = decode_properties(target, properties)?;
            ctx.queue(Event::notify(target, event.clone()).with_properties(properties));
            Ok(())
        }
        Operation::Call {
            method, properties, ..
        } => {
            if !def.has_method(method) {
                return Err(malformed(PayloadReason::UnknownMethod {
                    name: method.clone(),
                }));
            }
            let properties = decode_properties(target, properties)?;
            let event = Event {
                target,
                kind: EventKind::Call,
                name: method.clone(),
                properties,
            };
            ctx.queue(event);
            Ok(())
        }
        Operation::Listen { event, enabled, .. } => {
            if !def.has_event(event) {
                return Err(malformed(PayloadReason::UnknownEvent {
                    name: event.clone(),
                }));
            }
            object.listen(event.clone(), *enabled);
            ctx.preserve(listener_key(event), Value::Bool(*enabled));
            Ok(())
        }
        Operation::Create { .. } | Operation::Destroy { .. } => {
            Err(malformed(PayloadReason::UnexpectedOperation {
                kind: operation.kind(),
            }))
        }
    }
}

fn decode_properties(
    target: ObjectId,
    properties: &Properties,
) -> SyncResult<BTreeMap<String, Value>> {
    properties
        .iter()
        .map(|(name, json)| Ok((name.clone(), decode_value(target, name, json, &Value::Null)?)))
        .collect()
}

/// Adapters keyed by type tag.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<String, Box<dyn WidgetAdapter>>,
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("types", &self.adapters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AdapterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a [`TypeAdapter`] for every type in the registry.
    #[must_use]
    pub fn from_types(types: &TypeRegistry) -> Self {
        let mut registry = Self::new();
        for def in types.types() {
            registry.register(Box::new(TypeAdapter::new(def.clone())));
        }
        registry
    }

    /// Registers an adapter for its type tag, returning the one it replaces.
    pub fn register(&mut self, adapter: Box<dyn WidgetAdapter>) -> Option<Box<dyn WidgetAdapter>> {
        let tag = adapter.type_def().tag.to_string();
        self.adapters.insert(tag, adapter)
    }

    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&dyn WidgetAdapter> {
        self.adapters.get(tag).map(Box::as_ref)
    }

    /// Selects the adapter for an object by its type tag.
    pub fn adapter_for(&self, object: &RemoteObject) -> SyncResult<&dyn WidgetAdapter> {
        self.get(object.type_tag().as_str())
            .ok_or_else(|| SyncError::UnsupportedType {
                target: object.id(),
                type_tag: object.type_tag().to_string(),
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
