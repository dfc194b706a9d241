//! Validated collection of widget types.

use std::collections::HashSet;

use crate::error::{SchemaError, SchemaResult};
use crate::types::{TypeDef, RESERVED_PROPERTIES};

/// A validated, ordered set of type definitions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeRegistry {
    types: Vec<TypeDef>,
}

impl TypeRegistry {
    /// Creates a registry from type definitions after validation.
    pub fn new(types: Vec<TypeDef>) -> SchemaResult<Self> {
        let registry = Self { types };
        registry.validate()?;
        Ok(registry)
    }

    /// Creates a registry with no types.
    #[must_use]
    pub const fn empty() -> Self {
        Self { types: Vec::new() }
    }

    /// Returns the type definition for a tag.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&TypeDef> {
        self.types.iter().find(|def| def.tag.as_str() == tag)
    }

    /// Returns all types in registration order.
    #[must_use]
    pub fn types(&self) -> &[TypeDef] {
        &self.types
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Validates registry invariants.
    pub fn validate(&self) -> SchemaResult<()> {
        let mut tags = HashSet::new();
        for def in &self.types {
            if !tags.insert(def.tag.as_str()) {
                return Err(SchemaError::DuplicateType {
                    tag: def.tag.to_string(),
                });
            }
            validate_type(def)?;
        }
        Ok(())
    }
}

fn validate_type(def: &TypeDef) -> SchemaResult<()> {
    let mut names = HashSet::new();
    for property in &def.properties {
        validate_name(def, &property.name)?;
        if RESERVED_PROPERTIES.contains(&property.name.as_str()) {
            return Err(SchemaError::ReservedProperty {
                tag: def.tag.to_string(),
                name: property.name.clone(),
            });
        }
        if !names.insert(property.name.as_str()) {
            return Err(SchemaError::DuplicateProperty {
                tag: def.tag.to_string(),
                name: property.name.clone(),
            });
        }
    }

    let mut handlers = HashSet::new();
    for name in def.events.iter().chain(&def.methods) {
        validate_name(def, name)?;
        if !handlers.insert(name.as_str()) {
            return Err(SchemaError::DuplicateEvent {
                tag: def.tag.to_string(),
                name: name.clone(),
            });
        }
    }
    Ok(())
}

fn validate_name(def: &TypeDef, name: &str) -> SchemaResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(SchemaError::InvalidName {
            tag: def.tag.to_string(),
            name: name.to_string(),
        })
    }
}
