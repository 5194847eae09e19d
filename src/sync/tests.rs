//! Live list synchronizer tests
//!
//! Driven end to end through an in-memory SQLite store and its change hub.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;
    use tempfile::TempDir;

    use crate::domain::{DomainError, DomainResult, ListScope, ShoppingItem, User};
    use crate::repository::{
        ChangeKind, LocalBlobStore, Query, Record, RecordChange, RecordStore, SqliteStore,
    };
    use crate::sync::LiveListSynchronizer;
    use crate::view::{ListView, EMPTY_LIST_PLACEHOLDER};

    const LEHENGA: ListScope = ListScope { category_id: 1, group_id: 1 };
    const JEWELLERY: ListScope = ListScope { category_id: 2, group_id: 1 };

    /// Delegates to SQLite but can be told to fail updates
    struct FlakyStore {
        inner: Arc<SqliteStore>,
        fail_updates: AtomicBool,
    }

    #[async_trait]
    impl RecordStore for FlakyStore {
        async fn select(&self, table: &str, query: &Query) -> DomainResult<Vec<Record>> {
            self.inner.select(table, query).await
        }

        async fn insert(&self, table: &str, record: Record) -> DomainResult<Record> {
            self.inner.insert(table, record).await
        }

        async fn update(&self, table: &str, id: i64, patch: Record) -> DomainResult<Record> {
            if self.fail_updates.load(Ordering::SeqCst) {
                return Err(DomainError::Remote("network down".to_string()));
            }
            self.inner.update(table, id, patch).await
        }

        async fn delete(&self, table: &str, id: i64) -> DomainResult<Record> {
            self.inner.delete(table, id).await
        }
    }

    struct Harness {
        store: Arc<SqliteStore>,
        flaky: Arc<FlakyStore>,
        sync: Arc<LiveListSynchronizer<ListView>>,
        _blobs: TempDir,
    }

    async fn harness() -> Harness {
        let store = Arc::new(SqliteStore::in_memory().await.expect("Failed to init test DB"));
        let flaky = Arc::new(FlakyStore {
            inner: store.clone(),
            fail_updates: AtomicBool::new(false),
        });
        let blobs = tempfile::tempdir().unwrap();
        let sync = LiveListSynchronizer::new(
            flaky.clone(),
            store.clone(),
            Arc::new(LocalBlobStore::new(blobs.path().to_path_buf())),
            ListView::new(),
        );
        Harness {
            store,
            flaky,
            sync: Arc::new(sync),
            _blobs: blobs,
        }
    }

    async fn seed(store: &SqliteStore, scope: ListScope, name: &str) -> i64 {
        let record = json!({
            "category_id": scope.category_id,
            "group_id": scope.group_id,
            "name": name,
            "price": 100.0,
        });
        let row = store
            .insert("shopping_items", record.as_object().cloned().unwrap())
            .await
            .unwrap();
        row["id"].as_i64().unwrap()
    }

    fn change(kind: ChangeKind, id: i64) -> RecordChange {
        RecordChange::new("shopping_items", kind, json!({"id": id}).as_object().cloned().unwrap())
    }

    fn user() -> User {
        User {
            id: "user-1".to_string(),
            email: Some("bride@example.com".to_string()),
            name: None,
        }
    }

    async fn view_ids(sync: &LiveListSynchronizer<ListView>) -> Vec<i64> {
        sync.inspect(|view, _| view.rows().iter().map(|r| r.item_id).collect()).await
    }

    async fn pump_once(sync: &LiveListSynchronizer<ListView>) {
        let pumped = tokio::time::timeout(Duration::from_secs(2), sync.pump())
            .await
            .expect("no event delivered");
        assert!(pumped.unwrap());
    }

    #[tokio::test]
    async fn test_initialize_snapshot_newest_first() {
        let h = harness().await;
        let first = seed(&h.store, LEHENGA, "Dupatta").await;
        let second = seed(&h.store, LEHENGA, "Blouse").await;
        seed(&h.store, JEWELLERY, "Jhumka").await;

        let items = h.sync.initialize(LEHENGA).await.unwrap();
        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![second, first]);
        assert_eq!(view_ids(&h.sync).await, vec![second, first]);
        assert!(h.sync.inspect(|view, _| view.placeholder().is_none()).await);
    }

    #[tokio::test]
    async fn test_empty_snapshot_shows_placeholder() {
        let h = harness().await;
        h.sync.initialize(LEHENGA).await.unwrap();
        let placeholder = h.sync.inspect(|view, _| view.placeholder()).await;
        assert_eq!(placeholder, Some(EMPTY_LIST_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_insert_for_present_id_is_noop() {
        let h = harness().await;
        let id = seed(&h.store, LEHENGA, "Dupatta").await;
        h.sync.initialize(LEHENGA).await.unwrap();

        let patches = h.sync.on_event(change(ChangeKind::Insert, id)).await.unwrap();
        assert!(patches.is_empty());
        assert_eq!(h.sync.mirror().await.len(), 1);
        assert_eq!(view_ids(&h.sync).await, vec![id]);
    }

    #[tokio::test]
    async fn test_delete_for_absent_id_is_noop() {
        let h = harness().await;
        seed(&h.store, LEHENGA, "Dupatta").await;
        h.sync.initialize(LEHENGA).await.unwrap();

        let patches = h.sync.on_event(change(ChangeKind::Delete, 404)).await.unwrap();
        assert!(patches.is_empty());
        assert_eq!(h.sync.mirror().await.len(), 1);
    }

    #[tokio::test]
    async fn test_update_for_absent_id_is_noop() {
        let h = harness().await;
        let other = seed(&h.store, JEWELLERY, "Haar").await;
        h.sync.initialize(LEHENGA).await.unwrap();

        let patches = h.sync.on_event(change(ChangeKind::Update, other)).await.unwrap();
        assert!(patches.is_empty());
        assert!(h.sync.mirror().await.is_empty());
    }

    #[tokio::test]
    async fn test_insert_from_other_category_is_ignored() {
        let h = harness().await;
        let jhumka = seed(&h.store, JEWELLERY, "Jhumka").await;
        h.sync.initialize(LEHENGA).await.unwrap();

        let patches = h.sync.on_event(change(ChangeKind::Insert, jhumka)).await.unwrap();
        assert!(patches.is_empty());
        assert!(h.sync.mirror().await.is_empty());
        let placeholder = h.sync.inspect(|view, _| view.placeholder()).await;
        assert_eq!(placeholder, Some(EMPTY_LIST_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_item_moved_to_other_category_leaves_list() {
        let h = harness().await;
        let id = seed(&h.store, LEHENGA, "Dupatta").await;
        h.sync.initialize(LEHENGA).await.unwrap();

        let patch = json!({"category_id": JEWELLERY.category_id});
        h.store
            .update("shopping_items", id, patch.as_object().cloned().unwrap())
            .await
            .unwrap();
        pump_once(&h.sync).await;

        assert!(h.sync.mirror().await.is_empty());
        assert!(view_ids(&h.sync).await.is_empty());
        let placeholder = h.sync.inspect(|view, _| view.placeholder()).await;
        assert_eq!(placeholder, Some(EMPTY_LIST_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_writes_to_items_outside_list_are_refused() {
        let h = harness().await;
        seed(&h.store, LEHENGA, "Dupatta").await;
        let jhumka = seed(&h.store, JEWELLERY, "Jhumka").await;
        h.sync.initialize(LEHENGA).await.unwrap();

        let not_found = DomainError::NotFound(format!("item {}", jhumka));
        assert_eq!(h.sync.delete_item(jhumka).await, Err(not_found.clone()));
        assert_eq!(
            h.sync.attach_image(jhumka, "jhumka.png", vec![0x89, 0x50]).await.map(|_| ()),
            Err(not_found)
        );

        let rows = h
            .store
            .select("shopping_items", &Query::new().eq("id", jhumka))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].get("image_url").map_or(true, |url| url.is_null()));
        assert_eq!(h.sync.mirror().await.len(), 1);
    }

    #[tokio::test]
    async fn test_deleting_last_item_shows_placeholder() {
        let h = harness().await;
        let id = seed(&h.store, LEHENGA, "Dupatta").await;
        h.sync.initialize(LEHENGA).await.unwrap();

        h.sync.delete_item(id).await.unwrap();
        pump_once(&h.sync).await;

        assert!(h.sync.mirror().await.is_empty());
        let placeholder = h.sync.inspect(|view, _| view.placeholder()).await;
        assert_eq!(placeholder, Some(EMPTY_LIST_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_added_items_arrive_through_stream() {
        let h = harness().await;
        h.sync.initialize(LEHENGA).await.unwrap();

        let created = h.sync.add_item(&user(), "  Potli bag ", 850.0).await.unwrap();
        assert_eq!(created.name, "Potli bag");
        assert_eq!(created.user_id.as_deref(), Some("user-1"));
        // Not applied until the change comes back
        assert!(h.sync.mirror().await.is_empty());

        pump_once(&h.sync).await;
        assert_eq!(h.sync.mirror().await[0].id, created.id);
        assert!(h.sync.inspect(|view, _| view.placeholder().is_none()).await);
    }

    #[tokio::test]
    async fn test_events_apply_in_delivery_order() {
        let h = harness().await;
        h.sync.initialize(LEHENGA).await.unwrap();

        let a = seed(&h.store, LEHENGA, "Chooda").await;
        let b = seed(&h.store, LEHENGA, "Kaleere").await;
        let c = seed(&h.store, LEHENGA, "Payal").await;
        for _ in 0..3 {
            pump_once(&h.sync).await;
        }
        assert_eq!(view_ids(&h.sync).await, vec![c, b, a]);
    }

    #[tokio::test]
    async fn test_update_patches_row_in_place() {
        let h = harness().await;
        let older = seed(&h.store, LEHENGA, "Dupatta").await;
        let newer = seed(&h.store, LEHENGA, "Blouse").await;
        h.sync.initialize(LEHENGA).await.unwrap();
        let bindings = h
            .sync
            .inspect(|view, _| view.row(older).unwrap().bindings)
            .await;

        h.sync.set_purchased(older, true).await.unwrap();
        pump_once(&h.sync).await;

        let (row_bindings, checked, status) = h
            .sync
            .inspect(|view, _| {
                let row = view.row(older).unwrap();
                (row.bindings, row.checked, row.view.status_label.clone())
            })
            .await;
        assert_eq!(row_bindings, bindings);
        assert!(checked);
        assert_eq!(status, "Purchased");
        assert_eq!(view_ids(&h.sync).await, vec![newer, older]);
        assert!(h.sync.mirror().await[1].is_purchased);
    }

    #[tokio::test]
    async fn test_failed_purchase_toggle_rolls_back() {
        let h = harness().await;
        let id = seed(&h.store, LEHENGA, "Dupatta").await;
        h.sync.initialize(LEHENGA).await.unwrap();
        h.flaky.fail_updates.store(true, Ordering::SeqCst);

        let result = h.sync.set_purchased(id, true).await;
        assert_eq!(result, Err(DomainError::Remote("network down".to_string())));

        let (checked, error) = h
            .sync
            .inspect(|view, _| {
                let row = view.row(id).unwrap();
                (row.checked, row.error.clone())
            })
            .await;
        assert!(!checked);
        assert_eq!(error.as_deref(), Some("network down"));
        assert!(!h.sync.mirror().await[0].is_purchased);
    }

    #[tokio::test]
    async fn test_reinitialize_tears_down_old_subscription() {
        let h = harness().await;
        h.sync.initialize(LEHENGA).await.unwrap();
        h.sync.initialize(JEWELLERY).await.unwrap();
        assert_eq!(h.store.hub().subscriber_count(), 1);

        seed(&h.store, LEHENGA, "Dupatta").await;
        let jhumka = seed(&h.store, JEWELLERY, "Jhumka").await;
        pump_once(&h.sync).await;

        let ids: Vec<i64> = h.sync.mirror().await.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![jhumka]);
        assert_eq!(h.sync.scope().await, Some(JEWELLERY));
    }

    #[tokio::test]
    async fn test_attach_image_updates_row() {
        let h = harness().await;
        let id = seed(&h.store, LEHENGA, "Dupatta").await;
        h.sync.initialize(LEHENGA).await.unwrap();

        let item = h.sync.attach_image(id, "dupatta.jpg", vec![0xff, 0xd8]).await.unwrap();
        let url = item.image_url.unwrap();
        assert!(url.ends_with(&format!("shopping_item_images/{}.jpg", id)));

        pump_once(&h.sync).await;
        let row_url = h
            .sync
            .inspect(|view, _| view.row(id).unwrap().view.image_url.clone())
            .await;
        assert_eq!(row_url, Some(url));
    }

    #[tokio::test]
    async fn test_attach_rejects_non_images() {
        let h = harness().await;
        let id = seed(&h.store, LEHENGA, "Dupatta").await;
        h.sync.initialize(LEHENGA).await.unwrap();

        let result = h.sync.attach_image(id, "notes.txt", b"hello".to_vec()).await;
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
        let error = h.sync.inspect(|view, _| view.row(id).unwrap().error.clone()).await;
        assert!(error.is_some());
    }

    #[tokio::test]
    async fn test_actions_require_scope() {
        let h = harness().await;
        assert_eq!(
            h.sync.add_item(&user(), "Dupatta", 10.0).await,
            Err(DomainError::MissingContext("Category".to_string()))
        );
        h.sync.initialize(LEHENGA).await.unwrap();
        assert!(matches!(
            h.sync.add_item(&user(), "   ", 10.0).await,
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_run_stops_after_shutdown() {
        let h = harness().await;
        h.sync.initialize(LEHENGA).await.unwrap();

        let runner = {
            let sync = h.sync.clone();
            tokio::spawn(async move { sync.run().await })
        };
        let id = seed(&h.store, LEHENGA, "Dupatta").await;
        for _ in 0..50 {
            if !h.sync.mirror().await.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(h.sync.mirror().await[0].id, id);

        h.sync.shutdown().await;
        tokio::time::timeout(Duration::from_secs(2), runner)
            .await
            .expect("runner did not stop")
            .unwrap();
        assert!(!h.sync.is_subscribed().await);
    }
}
