//! Shared undo/redo history
//!
//! One undo stack and one redo stack cover every open document. A record may
//! span several documents; undo applies each `from` in reverse order, redo
//! applies each `to` in order.

use crate::types::{Block, CoverConfig, DocumentId};

/// A field's value before and after an edit
#[derive(Debug, Clone, PartialEq)]
pub struct Change<T> {
    pub from: T,
    pub to: T,
}

impl<T> Change<T> {
    pub fn new(from: T, to: T) -> Self {
        Self { from, to }
    }

    /// The value on the requested side
    pub fn side(&self, direction: Direction) -> &T {
        match direction {
            Direction::Undo => &self.from,
            Direction::Redo => &self.to,
        }
    }
}

/// One recorded field change
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDiff {
    Title(Change<String>),
    Author(Change<Option<String>>),
    Content(Change<String>),
    Blocks(Change<Vec<Block>>),
    Cover(Change<CoverConfig>),
}

/// Which side of a record is being applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Undo,
    Redo,
}

/// An undo-stack entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeRecord {
    pub changes: Vec<(DocumentId, FieldDiff)>,
}

impl ChangeRecord {
    pub fn new(changes: Vec<(DocumentId, FieldDiff)>) -> Self {
        Self { changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Changes in the order they must be applied for `direction`
    pub fn ordered(&self, direction: Direction) -> Vec<&(DocumentId, FieldDiff)> {
        match direction {
            Direction::Undo => self.changes.iter().rev().collect(),
            Direction::Redo => self.changes.iter().collect(),
        }
    }
}

/// Undo and redo stacks
#[derive(Debug, Default)]
pub struct UndoManager {
    undo: Vec<ChangeRecord>,
    redo: Vec<ChangeRecord>,
}

impl UndoManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new edit; clears the redo stack
    pub fn push(&mut self, record: ChangeRecord) {
        if record.is_empty() {
            return;
        }
        self.undo.push(record);
        self.redo.clear();
    }

    /// Move the top undo record to the redo stack and return it
    pub fn undo(&mut self) -> Option<&ChangeRecord> {
        let record = self.undo.pop()?;
        self.redo.push(record);
        self.redo.last()
    }

    /// Move the top redo record back to the undo stack and return it
    pub fn redo(&mut self) -> Option<&ChangeRecord> {
        let record = self.redo.pop()?;
        self.undo.push(record);
        self.undo.last()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Drop every change that touches `id`; records left empty are removed
    pub fn forget(&mut self, id: &DocumentId) {
        for stack in [&mut self.undo, &mut self.redo] {
            for record in stack.iter_mut() {
                record.changes.retain(|(doc, _)| doc != id);
            }
            stack.retain(|record| !record.is_empty());
        }
    }

    /// Every diff still reachable through undo or redo
    pub fn diffs(&self) -> impl Iterator<Item = &FieldDiff> {
        self.undo
            .iter()
            .chain(self.redo.iter())
            .flat_map(|record| record.changes.iter().map(|(_, diff)| diff))
    }
}
