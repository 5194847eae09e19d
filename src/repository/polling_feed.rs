//! Polling change feed
//!
//! A `ChangeStream` over any `RecordStore`: re-reads the filtered table on
//! an interval and diffs consecutive snapshots into change events.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::change::{ChangeKind, RecordChange, Subscription, SubscriptionHandle};
use super::query::{record_id, Query, Record};
use super::traits::{ChangeStream, RecordStore};
use crate::domain::DomainResult;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct PollingChangeFeed {
    store: Arc<dyn RecordStore>,
    interval: Duration,
    next_id: AtomicU64,
}

impl PollingChangeFeed {
    pub fn new(store: Arc<dyn RecordStore>, interval: Duration) -> Self {
        Self {
            store,
            interval,
            next_id: AtomicU64::new(0),
        }
    }
}

fn index_by_id(rows: Vec<Record>) -> BTreeMap<i64, Record> {
    rows.into_iter()
        .filter_map(|row| record_id(&row).map(|id| (id, row)))
        .collect()
}

/// Changes turning `previous` into `current`: inserts (oldest id first),
/// then updates, then deletes
pub fn diff_snapshots(
    table: &str,
    previous: &BTreeMap<i64, Record>,
    current: &BTreeMap<i64, Record>,
) -> Vec<RecordChange> {
    let mut changes = Vec::new();
    for (id, row) in current {
        if !previous.contains_key(id) {
            changes.push(RecordChange::new(table, ChangeKind::Insert, row.clone()));
        }
    }
    for (id, row) in current {
        if let Some(old) = previous.get(id) {
            if old != row {
                changes.push(
                    RecordChange::new(table, ChangeKind::Update, row.clone()).with_old_record(old.clone()),
                );
            }
        }
    }
    for (id, row) in previous {
        if !current.contains_key(id) {
            changes.push(RecordChange::new(table, ChangeKind::Delete, row.clone()));
        }
    }
    changes
}

#[async_trait]
impl ChangeStream for PollingChangeFeed {
    async fn subscribe(&self, table: &str, query: &Query) -> DomainResult<Subscription> {
        let mut query = query.clone();
        query.limit = None;
        query.order = None;

        // Baseline first so only later changes are reported
        let baseline = index_by_id(self.store.select(table, &query).await?);
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;

        let store = self.store.clone();
        let table = table.to_string();
        let period = self.interval;
        let task = tokio::spawn(async move {
            let mut known = baseline;
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    break;
                }
                match store.select(&table, &query).await {
                    Ok(rows) => {
                        let current = index_by_id(rows);
                        for change in diff_snapshots(&table, &known, &current) {
                            if tx.send(change).is_err() {
                                return;
                            }
                        }
                        known = current;
                    }
                    Err(e) => log::warn!("poll of {} failed: {}", table, e),
                }
            }
        });

        let handle = SubscriptionHandle::new(id, move || task.abort());
        Ok(Subscription { handle, events: rx })
    }
}
