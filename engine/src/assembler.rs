//! Outbound message assembly.

use protocol::{ErrorNote, MessageHead, Operation, ProtocolMessage};

use crate::error::SyncError;

/// Collects the operations and error notes of one response.
///
/// Append-only. Operations keep the order in which they were appended; the
/// assembler does not reorder or validate dependencies between them.
#[derive(Debug, Clone, Default)]
pub struct MessageAssembler {
    operations: Vec<Operation>,
    errors: Vec<ErrorNote>,
}

impl MessageAssembler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    pub fn extend(&mut self, operations: impl IntoIterator<Item = Operation>) {
        self.operations.extend(operations);
    }

    /// Records a per-object error for the response head.
    pub fn record_error(&mut self, error: &SyncError) {
        self.errors.push(error.to_note());
    }

    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    #[must_use]
    pub fn errors(&self) -> &[ErrorNote] {
        &self.errors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Builds the protocol message.
    #[must_use]
    pub fn serialize(self) -> ProtocolMessage {
        ProtocolMessage {
            head: MessageHead {
                errors: self.errors,
                ..MessageHead::default()
            },
            operations: self.operations,
        }
    }
}
