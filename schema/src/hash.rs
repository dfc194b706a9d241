//! Deterministic type registry fingerprinting.

use blake3::Hasher;

use crate::{Gradient, PropertyDef, RenderMode, TypeRegistry, Value};

/// Computes a deterministic fingerprint of a type registry.
///
/// Covers tags, property names, defaults, render modes, events and methods,
/// in registration order.
#[must_use]
pub fn types_hash(registry: &TypeRegistry) -> u64 {
    let mut hasher = Hasher::new();
    write_len(&mut hasher, registry.len());

    for def in registry.types() {
        write_str(&mut hasher, def.tag.as_str());
        write_len(&mut hasher, def.properties.len());
        for property in &def.properties {
            write_property(&mut hasher, property);
        }
        write_len(&mut hasher, def.events.len());
        for event in &def.events {
            write_str(&mut hasher, event);
        }
        write_len(&mut hasher, def.methods.len());
        for method in &def.methods {
            write_str(&mut hasher, method);
        }
    }

    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

fn write_property(hasher: &mut Hasher, property: &PropertyDef) {
    write_str(hasher, &property.name);
    write_value(hasher, &property.default);
    write_u8(
        hasher,
        match property.render {
            RenderMode::Tracked => 0,
            RenderMode::CreateOnly => 1,
        },
    );
    write_u8(hasher, u8::from(property.client_writable));
}

fn write_value(hasher: &mut Hasher, value: &Value) {
    match value {
        Value::Null => write_u8(hasher, 0),
        Value::Bool(b) => {
            write_u8(hasher, 1);
            write_u8(hasher, u8::from(*b));
        }
        Value::Int(i) => {
            write_u8(hasher, 2);
            hasher.update(&i.to_le_bytes());
        }
        Value::Str(s) => {
            write_u8(hasher, 3);
            write_str(hasher, s);
        }
        Value::Color(color) => {
            write_u8(hasher, 4);
            hasher.update(&color.components());
        }
        Value::Gradient(gradient) => {
            write_u8(hasher, 5);
            write_gradient(hasher, gradient);
        }
        Value::Image(image) => {
            write_u8(hasher, 6);
            write_str(hasher, &image.resource);
            hasher.update(&image.width.to_le_bytes());
            hasher.update(&image.height.to_le_bytes());
        }
        Value::List(items) => {
            write_u8(hasher, 7);
            write_len(hasher, items.len());
            for item in items {
                write_value(hasher, item);
            }
        }
    }
}

fn write_gradient(hasher: &mut Hasher, gradient: &Gradient) {
    write_len(hasher, gradient.colors().len());
    for color in gradient.colors() {
        hasher.update(&color.components());
    }
    hasher.update(gradient.stops());
    write_u8(hasher, u8::from(gradient.is_vertical()));
}

fn write_u8(hasher: &mut Hasher, value: u8) {
    hasher.update(&[value]);
}

fn write_len(hasher: &mut Hasher, len: usize) {
    hasher.update(&(len as u64).to_le_bytes());
}

fn write_str(hasher: &mut Hasher, value: &str) {
    write_len(hasher, value.len());
    hasher.update(value.as_bytes());
}
