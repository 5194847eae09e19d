//! Change Events
//!
//! Row-level change notifications delivered to subscribers of a table.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::query::{record_id, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One change; `record` is the new row for insert/update and the old row
/// for delete. Updates may also carry the row as it was before the write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordChange {
    pub table: String,
    pub kind: ChangeKind,
    pub record: Record,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_record: Option<Record>,
}

impl RecordChange {
    pub fn new(table: &str, kind: ChangeKind, record: Record) -> Self {
        Self {
            table: table.to_string(),
            kind,
            record,
            old_record: None,
        }
    }

    pub fn with_old_record(mut self, old: Record) -> Self {
        self.old_record = Some(old);
        self
    }

    pub fn id(&self) -> Option<i64> {
        record_id(&self.record)
    }
}

/// Tears down delivery when unsubscribed or dropped
pub struct SubscriptionHandle {
    id: u64,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionHandle {
    pub fn new(id: u64, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id,
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    /// Idempotent
    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
            log::debug!("subscription {} closed", self.id);
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// A live subscription: the handle plus its event receiver
#[derive(Debug)]
pub struct Subscription {
    pub handle: SubscriptionHandle,
    pub events: mpsc::UnboundedReceiver<RecordChange>,
}

impl Subscription {
    /// Next event in delivery order; None once torn down
    pub async fn next(&mut self) -> Option<RecordChange> {
        self.events.recv().await
    }

    pub fn unsubscribe(&mut self) {
        self.handle.unsubscribe();
    }
}
