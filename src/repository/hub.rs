//! In-process change hub
//!
//! Fans out committed writes of the local store to filtered subscribers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use super::change::{RecordChange, Subscription, SubscriptionHandle};
use super::query::Query;

struct Subscriber {
    table: String,
    query: Query,
    tx: mpsc::UnboundedSender<RecordChange>,
}

#[derive(Default)]
struct HubInner {
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<u64, Subscriber>>,
}

impl HubInner {
    fn subscribers(&self) -> MutexGuard<'_, HashMap<u64, Subscriber>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone, Default)]
pub struct ChangeHub {
    inner: Arc<HubInner>,
}

impl ChangeHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, table: &str, query: &Query) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.inner.subscribers().insert(
            id,
            Subscriber {
                table: table.to_string(),
                query: query.clone(),
                tx,
            },
        );

        let weak = Arc::downgrade(&self.inner);
        let handle = SubscriptionHandle::new(id, move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers().remove(&id);
            }
        });
        log::debug!("hub subscription {} on {}", id, table);
        Subscription { handle, events: rx }
    }

    /// Deliver to matching subscribers; returns how many received it.
    /// An update reaches subscribers matching either its old or its new row,
    /// so a row moved out of a filter still reaches the filter's listeners.
    pub fn publish(&self, change: &RecordChange) -> usize {
        let mut subscribers = self.inner.subscribers();
        subscribers.retain(|_, s| !s.tx.is_closed());

        let mut delivered = 0;
        for subscriber in subscribers.values() {
            if subscriber.table == change.table
                && (subscriber.query.matches(&change.record)
                    || change.old_record.as_ref().is_some_and(|old| subscriber.query.matches(old)))
                && subscriber.tx.send(change.clone()).is_ok()
            {
                delivered += 1;
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().len()
    }
}
