//! Preserved state: what the client last saw.

use std::collections::{BTreeMap, BTreeSet};

use schema::Value;

use crate::types::ObjectId;

const LISTEN_PREFIX: &str = "listen:";

/// Returns the preserved-state key for an event listener.
///
/// Property names cannot contain `:`, so these never collide with them.
#[must_use]
pub fn listener_key(event: &str) -> String {
    format!("{LISTEN_PREFIX}{event}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum JournalEntry {
    Value {
        id: ObjectId,
        name: String,
        previous: Option<Value>,
    },
    Initialized {
        id: ObjectId,
        previous: bool,
    },
}

/// Last value sent to the client per (object, property), plus which objects
/// the client has been told to create.
///
/// Every mutation is journaled until [`clear_for_next_cycle`] commits the
/// cycle. [`rollback`] restores the state at the start of the cycle.
///
/// [`clear_for_next_cycle`]: PreservedState::clear_for_next_cycle
/// [`rollback`]: PreservedState::rollback
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreservedState {
    values: BTreeMap<(ObjectId, String), Value>,
    initialized: BTreeSet<ObjectId>,
    journal: Vec<JournalEntry>,
}

impl PreservedState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last value sent for a property, if any.
    #[must_use]
    pub fn get(&self, id: ObjectId, name: &str) -> Option<&Value> {
        self.values.get(&(id, name.to_string()))
    }

    /// Records the value sent for a property.
    pub fn put(&mut self, id: ObjectId, name: impl Into<String>, value: Value) {
        let name = name.into();
        let previous = self.values.insert((id, name.clone()), value);
        self.journal.push(JournalEntry::Value { id, name, previous });
    }

    /// Returns true once a create operation has been rendered for `id`.
    #[must_use]
    pub fn is_initialized(&self, id: ObjectId) -> bool {
        self.initialized.contains(&id)
    }

    pub fn mark_initialized(&mut self, id: ObjectId) {
        let previous = !self.initialized.insert(id);
        self.journal.push(JournalEntry::Initialized { id, previous });
    }

    /// Drops all state for a removed object.
    pub fn forget_object(&mut self, id: ObjectId) {
        let names: Vec<String> = self
            .values
            .range((id, String::new())..)
            .take_while(|((owner, _), _)| *owner == id)
            .map(|((_, name), _)| name.clone())
            .collect();
        for name in names {
            let previous = self.values.remove(&(id, name.clone()));
            self.journal.push(JournalEntry::Value { id, name, previous });
        }
        if self.initialized.remove(&id) {
            self.journal
                .push(JournalEntry::Initialized { id, previous: true });
        }
    }

    /// Commits the current cycle. The journal is discarded.
    pub fn clear_for_next_cycle(&mut self) {
        self.journal.clear();
    }

    /// Restores the state at the start of the current cycle.
    pub fn rollback(&mut self) {
        while let Some(entry) = self.journal.pop() {
            match entry {
                JournalEntry::Value { id, name, previous } => match previous {
                    Some(value) => {
                        self.values.insert((id, name), value);
                    }
                    None => {
                        self.values.remove(&(id, name));
                    }
                },
                JournalEntry::Initialized { id, previous } => {
                    if previous {
                        self.initialized.insert(id);
                    } else {
                        self.initialized.remove(&id);
                    }
                }
            }
        }
    }

    /// Returns true if the current cycle has uncommitted changes.
    #[must_use]
    pub fn has_uncommitted(&self) -> bool {
        !self.journal.is_empty()
    }

    /// Number of preserved property values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.initialized.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W1: ObjectId = ObjectId::new(1);
    const W2: ObjectId = ObjectId::new(2);

    #[test]
    fn get_returns_last_put() {
        let mut state = PreservedState::new();
        assert!(state.get(W1, "text").is_none());
        state.put(W1, "text", Value::from("a"));
        state.put(W1, "text", Value::from("b"));
        assert_eq!(state.get(W1, "text"), Some(&Value::from("b")));
    }

    #[test]
    fn rollback_restores_cycle_start() {
        let mut state = PreservedState::new();
        state.put(W1, "text", Value::from("a"));
        state.mark_initialized(W1);
        state.clear_for_next_cycle();

        state.put(W1, "text", Value::from("b"));
        state.put(W1, "visible", Value::Bool(false));
        state.mark_initialized(W2);
        state.forget_object(W1);
        assert!(state.has_uncommitted());

        state.rollback();
        assert_eq!(state.get(W1, "text"), Some(&Value::from("a")));
        assert!(state.get(W1, "visible").is_none());
        assert!(state.is_initialized(W1));
        assert!(!state.is_initialized(W2));
        assert!(!state.has_uncommitted());
    }

    #[test]
    fn commit_keeps_changes() {
        let mut state = PreservedState::new();
        state.put(W1, "text", Value::from("a"));
        state.clear_for_next_cycle();
        state.rollback();
        assert_eq!(state.get(W1, "text"), Some(&Value::from("a")));
    }

    #[test]
    fn forget_object_only_touches_owner() {
        let mut state = PreservedState::new();
        state.put(W1, "text", Value::from("a"));
        state.put(W1, listener_key("Selection"), Value::Bool(true));
        state.put(W2, "text", Value::from("b"));
        state.mark_initialized(W1);

        state.forget_object(W1);
        assert!(state.get(W1, "text").is_none());
        assert!(state.get(W1, &listener_key("Selection")).is_none());
        assert!(!state.is_initialized(W1));
        assert_eq!(state.get(W2, "text"), Some(&Value::from("b")));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn mark_initialized_twice_rolls_back_cleanly() {
        let mut state = PreservedState::new();
        state.mark_initialized(W1);
        state.clear_for_next_cycle();
        state.mark_initialized(W1);
        state.rollback();
        assert!(state.is_initialized(W1));
    }

    #[test]
    fn listener_keys_are_prefixed() {
        assert_eq!(listener_key("Modify"), "listen:Modify");
    }
}
