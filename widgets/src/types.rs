//! Type definitions of the standard widgets.

use schema::{PropertyDef, SchemaResult, TypeDef, TypeRegistry, Value};

pub const DISPLAY: &str = "rwt.widgets.Display";
pub const SHELL: &str = "rwt.widgets.Shell";
pub const COMPOSITE: &str = "rwt.widgets.Composite";
pub const LABEL: &str = "rwt.widgets.Label";
pub const BUTTON: &str = "rwt.widgets.Button";
pub const TEXT: &str = "rwt.widgets.Text";

/// Margin a label keeps around its content unless told otherwise.
pub const DEFAULT_LABEL_MARGIN: i64 = 3;

/// Properties shared by every control.
fn control(tag: &str) -> TypeDef {
    TypeDef::new(tag)
        .property(PropertyDef::tracked("visible", Value::Bool(true)))
        .property(PropertyDef::tracked("enabled", Value::Bool(true)))
        .property(PropertyDef::tracked("toolTip", Value::Null))
        .property(PropertyDef::tracked("foreground", Value::Null))
        .property(PropertyDef::tracked("background", Value::Null))
}

#[must_use]
pub fn display_type() -> TypeDef {
    TypeDef::new(DISPLAY)
        .property(PropertyDef::tracked("focusControl", Value::Null).client_writable())
        .method("beep")
}

#[must_use]
pub fn shell_type() -> TypeDef {
    TypeDef::new(SHELL)
        .property(PropertyDef::tracked("text", Value::Null))
        .property(PropertyDef::tracked("visible", Value::Bool(false)))
        .property(PropertyDef::tracked("active", Value::Bool(false)).client_writable())
        .property(PropertyDef::tracked("background", Value::Null))
        .event("Close")
        .event("Activate")
}

#[must_use]
pub fn composite_type() -> TypeDef {
    control(COMPOSITE)
}

#[must_use]
pub fn label_type() -> TypeDef {
    let margin = || Value::Int(DEFAULT_LABEL_MARGIN);
    control(LABEL)
        .property(PropertyDef::tracked("text", Value::Null))
        .property(PropertyDef::tracked("image", Value::Null))
        .property(PropertyDef::tracked("alignment", Value::from("left")))
        .property(PropertyDef::tracked("leftMargin", margin()))
        .property(PropertyDef::tracked("topMargin", margin()))
        .property(PropertyDef::tracked("rightMargin", margin()))
        .property(PropertyDef::tracked("bottomMargin", margin()))
        .property(PropertyDef::tracked("backgroundGradient", Value::Null))
        .property(PropertyDef::create_only("markupEnabled", Value::Bool(false)))
}

#[must_use]
pub fn button_type() -> TypeDef {
    control(BUTTON)
        .property(PropertyDef::tracked("text", Value::Null))
        .property(PropertyDef::tracked("image", Value::Null))
        .property(PropertyDef::tracked("selection", Value::Bool(false)).client_writable())
        .property(PropertyDef::create_only("markupEnabled", Value::Bool(false)))
        .event("Selection")
        .method("focus")
}

#[must_use]
pub fn text_type() -> TypeDef {
    control(TEXT)
        .property(PropertyDef::tracked("text", Value::from("")).client_writable())
        .property(
            PropertyDef::tracked("selection", Value::List(vec![Value::Int(0), Value::Int(0)]))
                .client_writable(),
        )
        .property(PropertyDef::tracked("message", Value::Null))
        .property(PropertyDef::tracked("editable", Value::Bool(true)))
        .property(PropertyDef::tracked("textLimit", Value::Null))
        .event("Modify")
        .event("DefaultSelection")
        .method("focus")
}

/// Registry with every standard widget type.
pub fn widget_types() -> SchemaResult<TypeRegistry> {
    TypeRegistry::new(vec![
        display_type(),
        shell_type(),
        composite_type(),
        label_type(),
        button_type(),
        text_type(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::RenderMode;

    #[test]
    fn registry_validates() {
        let types = widget_types().unwrap();
        assert_eq!(types.len(), 6);
        for tag in [DISPLAY, SHELL, COMPOSITE, LABEL, BUTTON, TEXT] {
            assert!(types.get(tag).is_some(), "{tag}");
        }
    }

    #[test]
    fn label_markup_is_create_only() {
        let label = label_type();
        let markup = label.find_property("markupEnabled").unwrap();
        assert_eq!(markup.render, RenderMode::CreateOnly);
        assert_eq!(
            label.find_property("leftMargin").unwrap().default,
            Value::Int(DEFAULT_LABEL_MARGIN)
        );
    }

    #[test]
    fn text_content_is_client_writable() {
        let text = text_type();
        assert!(text.find_property("text").unwrap().client_writable);
        assert!(text.find_property("selection").unwrap().client_writable);
        assert!(!text.find_property("editable").unwrap().client_writable);
        assert!(text.has_event("Modify"));
    }
}
