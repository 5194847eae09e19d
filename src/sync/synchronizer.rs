//! Live list synchronizer
//!
//! One instance per page session. `initialize` swaps in a new scope:
//! it tears down the old subscription, subscribes to the new one and
//! only then reads the snapshot, so nothing committed in between is
//! missed. Every subscription gets a generation number; events carry the
//! generation they were received under and are dropped when it is stale.
//!
//! Fetch-and-apply runs under the state lock, one event at a time, in
//! delivery order.
//!
//! User actions write to the store only. The mirror changes when the
//! write comes back as an event. The purchased checkbox is the exception
//! on the view side: it flips immediately and is restored on failure.

use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};

use super::event::ChangeEvent;
use super::mirror::Mirror;
use crate::domain::{DomainError, DomainResult, ListScope, ShoppingItem, TableRecord, User};
use crate::repository::{
    from_record, BlobStore, ChangeKind, ChangeStream, Query, Record, RecordChange, RecordStore,
    Subscription, SubscriptionHandle,
};
use crate::view::{ItemRowView, ListRenderer, RenderPatch};

struct SyncState<R> {
    generation: u64,
    scope: Option<ListScope>,
    mirror: Mirror<ShoppingItem>,
    renderer: R,
    handle: Option<SubscriptionHandle>,
}

#[derive(Clone)]
struct EventSource {
    generation: u64,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<RecordChange>>>,
}

pub struct LiveListSynchronizer<R: ListRenderer> {
    store: Arc<dyn RecordStore>,
    feed: Arc<dyn ChangeStream>,
    blobs: Arc<dyn BlobStore>,
    state: Mutex<SyncState<R>>,
    events: StdMutex<Option<EventSource>>,
}

fn scope_query(scope: &ListScope) -> Query {
    Query::new()
        .eq("category_id", scope.category_id)
        .eq("group_id", scope.group_id)
}

fn patch_of(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

impl<R: ListRenderer> LiveListSynchronizer<R> {
    pub fn new(
        store: Arc<dyn RecordStore>,
        feed: Arc<dyn ChangeStream>,
        blobs: Arc<dyn BlobStore>,
        renderer: R,
    ) -> Self {
        Self {
            store,
            feed,
            blobs,
            state: Mutex::new(SyncState {
                generation: 0,
                scope: None,
                mirror: Mirror::new(),
                renderer,
                handle: None,
            }),
            events: StdMutex::new(None),
        }
    }

    fn events(&self) -> MutexGuard<'_, Option<EventSource>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Point the list at a new (category, group), returning the snapshot
    pub async fn initialize(&self, scope: ListScope) -> DomainResult<Vec<ShoppingItem>> {
        let mut state = self.state.lock().await;
        if let Some(mut old) = state.handle.take() {
            old.unsubscribe();
        }
        *self.events() = None;
        state.generation += 1;
        let generation = state.generation;

        let (subscription, items) = match self.subscribe_and_fetch(&scope).await {
            Ok(loaded) => loaded,
            Err(e) => {
                state.scope = None;
                state.mirror.clear();
                state.renderer.apply(&RenderPatch::Reset(Vec::new()));
                return Err(e);
            }
        };

        let Subscription { handle, events } = subscription;
        state.handle = Some(handle);
        state.scope = Some(scope);
        state.mirror.replace(items.clone());
        *self.events() = Some(EventSource {
            generation,
            rx: Arc::new(Mutex::new(events)),
        });

        let rows = items.iter().map(ItemRowView::from_item).collect();
        state.renderer.apply(&RenderPatch::Reset(rows));
        log::info!(
            "live list for category {} (group {}) loaded with {} items, generation {}",
            scope.category_id,
            scope.group_id,
            items.len(),
            generation
        );
        Ok(items)
    }

    async fn subscribe_and_fetch(&self, scope: &ListScope) -> DomainResult<(Subscription, Vec<ShoppingItem>)> {
        let query = scope_query(scope);
        let subscription = self.feed.subscribe(ShoppingItem::TABLE, &query).await?;
        let rows = self
            .store
            .select(ShoppingItem::TABLE, &query.order_by("created_at", false))
            .await?;
        let items = rows
            .into_iter()
            .map(from_record::<ShoppingItem>)
            .collect::<DomainResult<Vec<_>>>()?;
        Ok((subscription, items))
    }

    /// Apply one change against the current subscription
    pub async fn on_event(&self, change: RecordChange) -> DomainResult<Vec<RenderPatch>> {
        let mut state = self.state.lock().await;
        let generation = state.generation;
        self.apply(&mut state, generation, change).await
    }

    async fn apply(
        &self,
        state: &mut SyncState<R>,
        generation: u64,
        change: RecordChange,
    ) -> DomainResult<Vec<RenderPatch>> {
        let scope = match state.scope {
            Some(scope) if generation == state.generation => scope,
            _ => {
                log::debug!("dropping {:?} from retired subscription", change.kind);
                return Ok(Vec::new());
            }
        };
        let Some(event) = ChangeEvent::from_change(&change) else {
            log::warn!("change on {} without an id ignored", change.table);
            return Ok(Vec::new());
        };

        let mut patches = Vec::new();
        match event.kind {
            ChangeKind::Insert => {
                if state.mirror.contains(event.id) {
                    return Ok(patches);
                }
                let Some(item) = self.fetch_item(&scope, event.id).await? else {
                    return Ok(patches);
                };
                let was_empty = state.mirror.is_empty();
                patches.push(RenderPatch::Prepend(ItemRowView::from_item(&item)));
                state.mirror.prepend(item);
                if was_empty {
                    patches.push(RenderPatch::HidePlaceholder);
                }
            }
            ChangeKind::Update => {
                if !state.mirror.contains(event.id) {
                    return Ok(patches);
                }
                match self.fetch_item(&scope, event.id).await? {
                    Some(item) => {
                        patches.push(RenderPatch::Update(ItemRowView::from_item(&item)));
                        state.mirror.replace_entry(item);
                    }
                    // Moved to another list or deleted since
                    None => {
                        state.mirror.remove(event.id);
                        patches.push(RenderPatch::Remove(event.id));
                        if state.mirror.is_empty() {
                            patches.push(RenderPatch::ShowPlaceholder);
                        }
                    }
                }
            }
            ChangeKind::Delete => {
                if state.mirror.remove(event.id).is_none() {
                    return Ok(patches);
                }
                patches.push(RenderPatch::Remove(event.id));
                if state.mirror.is_empty() {
                    patches.push(RenderPatch::ShowPlaceholder);
                }
            }
        }

        for patch in &patches {
            state.renderer.apply(patch);
        }
        Ok(patches)
    }

    /// The item as it is now, if it still belongs to `scope`
    async fn fetch_item(&self, scope: &ListScope, id: i64) -> DomainResult<Option<ShoppingItem>> {
        let rows = self
            .store
            .select(ShoppingItem::TABLE, &scope_query(scope).eq("id", id).limit(1))
            .await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(from_record(row)?)),
            None => {
                log::debug!("item {} is not in category {}", id, scope.category_id);
                Ok(None)
            }
        }
    }

    /// Wait for the next event and apply it. Returns false when there is
    /// no live subscription left to wait on.
    pub async fn pump(&self) -> DomainResult<bool> {
        let source = self.events().clone();
        let Some(source) = source else {
            return Ok(false);
        };

        let mut rx = source.rx.lock().await;
        let Some(change) = rx.recv().await else {
            drop(rx);
            let mut events = self.events();
            if events.as_ref().map(|s| s.generation) == Some(source.generation) {
                *events = None;
                log::info!("change stream for generation {} closed", source.generation);
                return Ok(false);
            }
            // Superseded by a newer subscription
            return Ok(true);
        };

        // Take the state lock before releasing the receiver so events
        // are applied in the order they were received
        let mut state = self.state.lock().await;
        drop(rx);
        self.apply(&mut state, source.generation, change).await?;
        Ok(true)
    }

    /// Pump until the page shuts down or the stream closes
    pub async fn run(&self) {
        loop {
            match self.pump().await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => log::warn!("live list event failed: {}", e),
            }
        }
    }

    /// Tear down the subscription on navigation
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        if let Some(mut handle) = state.handle.take() {
            handle.unsubscribe();
        }
        *self.events() = None;
        state.generation += 1;
        state.scope = None;
    }

    pub async fn scope(&self) -> Option<ListScope> {
        self.state.lock().await.scope
    }

    pub async fn is_subscribed(&self) -> bool {
        self.state.lock().await.handle.is_some()
    }

    pub async fn mirror(&self) -> Vec<ShoppingItem> {
        self.state.lock().await.mirror.entries().to_vec()
    }

    /// Read the renderer and mirror together
    pub async fn inspect<T>(&self, f: impl FnOnce(&R, &Mirror<ShoppingItem>) -> T) -> T {
        let state = self.state.lock().await;
        f(&state.renderer, &state.mirror)
    }

    async fn require_scope(&self) -> DomainResult<ListScope> {
        self.scope()
            .await
            .ok_or_else(|| DomainError::MissingContext("Category".to_string()))
    }

    /// Writes only target items shown in the current list
    async fn require_listed(&self, item_id: i64) -> DomainResult<()> {
        if self.state.lock().await.mirror.contains(item_id) {
            Ok(())
        } else {
            Err(DomainError::NotFound(format!("item {}", item_id)))
        }
    }

    async fn show_row_error(&self, item_id: i64, message: Option<String>) {
        let mut state = self.state.lock().await;
        state.renderer.apply(&RenderPatch::RowError { item_id, message });
    }

    /// Insert a new item into the current list
    pub async fn add_item(&self, user: &User, name: &str, price: f64) -> DomainResult<ShoppingItem> {
        let scope = self.require_scope().await?;
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::InvalidInput("item name is required".to_string()));
        }
        if !price.is_finite() || price < 0.0 {
            return Err(DomainError::InvalidInput("price must be a non-negative number".to_string()));
        }

        let record = patch_of(json!({
            "category_id": scope.category_id,
            "group_id": scope.group_id,
            "user_id": user.id,
            "name": name,
            "price": price,
        }));
        let created = self.store.insert(ShoppingItem::TABLE, record).await?;
        from_record(created)
    }

    /// Toggle purchased; the checkbox flips now and is restored if the
    /// write fails
    pub async fn set_purchased(&self, item_id: i64, purchased: bool) -> DomainResult<ShoppingItem> {
        let (previous, generation) = {
            let mut state = self.state.lock().await;
            let previous = state
                .mirror
                .get(item_id)
                .map(|i| i.is_purchased)
                .ok_or_else(|| DomainError::NotFound(format!("item {}", item_id)))?;
            state.renderer.apply(&RenderPatch::SetChecked { item_id, checked: purchased });
            state.renderer.apply(&RenderPatch::RowError { item_id, message: None });
            (previous, state.generation)
        };

        let patch = patch_of(json!({ "is_purchased": purchased }));
        match self.store.update(ShoppingItem::TABLE, item_id, patch).await {
            Ok(row) => from_record(row),
            Err(e) => {
                log::warn!("marking item {} purchased={} failed: {}", item_id, purchased, e);
                let mut state = self.state.lock().await;
                if state.generation == generation {
                    state.renderer.apply(&RenderPatch::SetChecked { item_id, checked: previous });
                    state.renderer.apply(&RenderPatch::RowError {
                        item_id,
                        message: Some(e.to_string()),
                    });
                }
                Err(e)
            }
        }
    }

    pub async fn delete_item(&self, item_id: i64) -> DomainResult<()> {
        self.require_listed(item_id).await?;
        match self.store.delete(ShoppingItem::TABLE, item_id).await {
            Ok(_) => Ok(()),
            Err(e) => {
                log::warn!("deleting item {} failed: {}", item_id, e);
                self.show_row_error(item_id, Some(e.to_string())).await;
                Err(e)
            }
        }
    }

    /// Upload an image for an item and store its public URL on the row
    pub async fn attach_image(&self, item_id: i64, file_name: &str, bytes: Vec<u8>) -> DomainResult<ShoppingItem> {
        self.require_listed(item_id).await?;
        let result = self.upload_image(item_id, file_name, bytes).await;
        if let Err(e) = &result {
            log::warn!("image upload for item {} failed: {}", item_id, e);
            self.show_row_error(item_id, Some(e.to_string())).await;
        }
        result
    }

    async fn upload_image(&self, item_id: i64, file_name: &str, bytes: Vec<u8>) -> DomainResult<ShoppingItem> {
        let mime = mime_guess::from_path(file_name).first_or_octet_stream();
        if mime.type_() != mime_guess::mime::IMAGE {
            return Err(DomainError::InvalidInput(format!("{} is not an image", file_name)));
        }
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
            .ok_or_else(|| DomainError::InvalidInput(format!("{} has no extension", file_name)))?;

        let path = ShoppingItem::image_path(item_id, extension);
        let stored = self.blobs.upload(&path, bytes, mime.essence_str()).await?;
        let patch = patch_of(json!({ "image_url": stored.public_url }));
        from_record(self.store.update(ShoppingItem::TABLE, item_id, patch).await?)
    }
}
