//! Adapter for text fields.
//!
//! A text field's content and selection are both written by the client.
//! The selection is only meaningful relative to the content, so an inbound
//! selection outside the resulting text is rejected before anything is
//! applied.

use engine::{
    apply_operation, render_calls, render_create, render_listeners, render_property_changes,
    PayloadReason, ReadContext, RemoteObject, RenderContext, SyncError, SyncResult,
    WidgetAdapter,
};
use protocol::{JsonValue, Operation};
use schema::{TypeDef, Value};

use crate::types::text_type;

/// Adapter for `rwt.widgets.Text`.
#[derive(Debug, Clone)]
pub struct TextAdapter {
    def: TypeDef,
}

impl Default for TextAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl TextAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self { def: text_type() }
    }
}

impl WidgetAdapter for TextAdapter {
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
        if let Operation::Set { properties, .. } = operation {
            if let Some(selection) = properties.get("selection") {
                let length = match properties.get("text") {
                    Some(JsonValue::String(text)) => text.chars().count(),
                    _ => object
                        .get("text")
                        .and_then(Value::as_str)
                        .map_or(0, |text| text.chars().count()),
                };
                check_selection(object, selection, length)?;
            }
        }
        apply_operation(&self.def, object, operation, ctx)
    }
}

fn check_selection(object: &RemoteObject, selection: &JsonValue, length: usize) -> SyncResult<()> {
    let invalid = |detail: String| SyncError::MalformedPayload {
        target: object.id(),
        reason: PayloadReason::InvalidValue {
            name: "selection".to_string(),
            detail,
        },
    };
    let range = selection
        .as_array()
        .filter(|items| items.len() == 2)
        .and_then(|items| Some((items[0].as_u64()?, items[1].as_u64()?)))
        .ok_or_else(|| invalid(format!("expected [start, end], got {selection}")))?;
    let (start, end) = range;
    let length = length as u64;
    if start > end || end > length {
        return Err(invalid(format!(
            "range {start}..{end} outside text of length {length}"
        )));
    }
    Ok(())
}

/// Clamps a selection range to a text of `length` characters.
#[must_use]
pub fn clamp_selection(start: i64, end: i64, length: usize) -> (i64, i64) {
    let length = i64::try_from(length).unwrap_or(i64::MAX);
    let start = start.clamp(0, length);
    let end = end.clamp(start, length);
    (start, end)
}
