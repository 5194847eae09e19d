//! Typed change events for the live list

use serde::{Deserialize, Serialize};

use crate::repository::{ChangeKind, RecordChange};

/// A change reduced to what the synchronizer acts on: kind and row id.
/// Inserts and updates are re-read from the store before applying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub id: i64,
}

impl ChangeEvent {
    pub fn insert(id: i64) -> Self {
        Self { kind: ChangeKind::Insert, id }
    }

    pub fn update(id: i64) -> Self {
        Self { kind: ChangeKind::Update, id }
    }

    pub fn delete(id: i64) -> Self {
        Self { kind: ChangeKind::Delete, id }
    }

    /// None when the payload carries no usable id
    pub fn from_change(change: &RecordChange) -> Option<Self> {
        change.id().map(|id| Self { kind: change.kind, id })
    }
}
