//! Remote object registry.

use std::collections::{BTreeMap, BTreeSet};

use schema::TypeTag;

use crate::error::{SyncError, SyncResult};
use crate::object::RemoteObject;
use crate::types::ObjectId;

/// A destroyed object and its removed descendants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestroyedSubtree {
    pub root: ObjectId,
    /// All removed ids, root first, in ascending order.
    pub members: Vec<ObjectId>,
}

/// Maps ids to live objects for the lifetime of a session.
///
/// Ids are assigned sequentially and never reused. A parent must be
/// registered before its children, so ascending id order is a valid
/// parent-before-child render order.
#[derive(Debug, Clone)]
pub struct ObjectRegistry {
    objects: BTreeMap<ObjectId, RemoteObject>,
    next_id: u32,
    destroyed: Vec<DestroyedSubtree>,
    max_objects: usize,
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new(usize::MAX)
    }
}

impl ObjectRegistry {
    /// Creates an empty registry holding at most `max_objects` live objects.
    #[must_use]
    pub const fn new(max_objects: usize) -> Self {
        Self {
            objects: BTreeMap::new(),
            next_id: 0,
            destroyed: Vec::new(),
            max_objects,
        }
    }

    /// Registers a new object and returns its id.
    pub fn register(
        &mut self,
        type_tag: impl Into<TypeTag>,
        parent: Option<ObjectId>,
        styles: Vec<String>,
    ) -> SyncResult<ObjectId> {
        if let Some(parent) = parent {
            if !self.objects.contains_key(&parent) {
                return Err(SyncError::UnknownObjectReference {
                    target: parent.to_string(),
                });
            }
        }
        if self.objects.len() >= self.max_objects {
            return Err(SyncError::LimitsExceeded {
                what: "object",
                limit: self.max_objects,
            });
        }
        let next = self
            .next_id
            .checked_add(1)
            .ok_or(SyncError::LimitsExceeded {
                what: "object id",
                limit: u32::MAX as usize,
            })?;
        self.next_id = next;
        let id = ObjectId::new(next);
        self.objects
            .insert(id, RemoteObject::new(id, type_tag.into(), parent, styles));
        Ok(id)
    }

    /// Resolves an id to its object.
    pub fn resolve(&self, id: ObjectId) -> SyncResult<&RemoteObject> {
        self.objects
            .get(&id)
            .ok_or_else(|| SyncError::UnknownObjectReference {
                target: id.to_string(),
            })
    }

    pub fn resolve_mut(&mut self, id: ObjectId) -> SyncResult<&mut RemoteObject> {
        self.objects
            .get_mut(&id)
            .ok_or_else(|| SyncError::UnknownObjectReference {
                target: id.to_string(),
            })
    }

    /// Resolves a wire id (`w<n>`) to a live object id.
    pub fn lookup(&self, wire_id: &str) -> SyncResult<ObjectId> {
        ObjectId::parse(wire_id)
            .filter(|id| self.objects.contains_key(id))
            .ok_or_else(|| SyncError::UnknownObjectReference {
                target: wire_id.to_string(),
            })
    }

    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterates live objects in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &RemoteObject> {
        self.objects.values()
    }

    /// Returns the direct children of an object.
    #[must_use]
    pub fn children(&self, id: ObjectId) -> Vec<ObjectId> {
        self.objects
            .range(id..)
            .filter(|(_, object)| object.parent() == Some(id))
            .map(|(child, _)| *child)
            .collect()
    }

    /// Removes an object and its descendants without recording a destroy.
    ///
    /// Returns false if the id was not registered.
    pub fn unregister(&mut self, id: ObjectId) -> bool {
        self.remove_subtree(id).is_some()
    }

    /// Removes an object and its descendants and records the removal so the
    /// next render can emit a destroy operation for the root.
    ///
    /// Returns false if the id was not registered.
    pub fn mark_for_destroy(&mut self, id: ObjectId) -> bool {
        match self.remove_subtree(id) {
            Some(members) => {
                self.destroyed.push(DestroyedSubtree { root: id, members });
                true
            }
            None => false,
        }
    }

    /// Subtrees removed since the last written response.
    #[must_use]
    pub fn destroyed(&self) -> &[DestroyedSubtree] {
        &self.destroyed
    }

    pub(crate) fn finish_cycle(&mut self) {
        self.destroyed.clear();
        for object in self.objects.values_mut() {
            object.clear_calls();
        }
    }

    fn remove_subtree(&mut self, root: ObjectId) -> Option<Vec<ObjectId>> {
        if !self.objects.contains_key(&root) {
            return None;
        }
        // Children always have larger ids than their parents.
        let mut members = BTreeSet::new();
        members.insert(root);
        for (id, object) in self.objects.range(root..) {
            if object.parent().is_some_and(|parent| members.contains(&parent)) {
                members.insert(*id);
            }
        }
        for id in &members {
            self.objects.remove(id);
        }
        Some(members.into_iter().collect())
    }
}
