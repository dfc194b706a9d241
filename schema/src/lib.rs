//! Property value model and widget type definitions for widgetsync.
//!
//! This crate defines what a remote object looks like to the sync engine:
//! - Property values (scalars, colors, gradients, image references, lists)
//! - Widget type definitions with per-property defaults and render modes
//! - A validated type registry
//! - Deterministic registry fingerprinting
//!
//! # Design Principles
//!
//! - **Payload, not mechanism** - Nothing here knows about requests or phases.
//! - **Explicit types** - No reflection on arbitrary Rust types.
//! - **Value equality** - Diffing compares values, never identities.

mod error;
mod hash;
mod registry;
mod types;
mod value;

pub use error::{GradientReason, SchemaError, SchemaResult};
pub use hash::types_hash;
pub use registry::TypeRegistry;
pub use types::{PropertyDef, RenderMode, TypeDef, TypeTag, RESERVED_PROPERTIES};
pub use value::{Gradient, ImageRef, Rgba, Value};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = Value::Null;
        let _ = Rgba::rgb(0, 0, 0);
        let _ = TypeTag::new("rwt.widgets.Label");
        let _ = PropertyDef::tracked("text", Value::Null);
        let _ = TypeRegistry::empty();

        let _: SchemaResult<()> = Ok(());
    }

    #[test]
    fn type_def_basic_usage() {
        let def = TypeDef::new("rwt.widgets.Label").property(PropertyDef::tracked("text", Value::Null));
        assert_eq!(def.tag.as_str(), "rwt.widgets.Label");
        assert_eq!(def.properties.len(), 1);
    }

    #[test]
    fn reserved_names_are_structural() {
        assert!(RESERVED_PROPERTIES.contains(&"parent"));
        assert!(RESERVED_PROPERTIES.contains(&"style"));
    }
}
