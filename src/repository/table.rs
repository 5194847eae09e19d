//! Typed table repository
//!
//! `Repository<T>` for any `TableRecord`, mapping entities to rows of the
//! record store through serde.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::query::{Query, Record};
use super::traits::{RecordStore, Repository};
use crate::domain::{DomainError, DomainResult, TableRecord};

pub struct TableRepository<T> {
    store: Arc<dyn RecordStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for TableRepository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: TableRecord> TableRepository<T> {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    /// Rows matching a query, decoded
    pub async fn list_where(&self, query: &Query) -> DomainResult<Vec<T>> {
        let rows = self.store.select(T::TABLE, query).await?;
        rows.into_iter().map(from_record).collect()
    }

    pub async fn find_one(&self, query: &Query) -> DomainResult<Option<T>> {
        let query = query.clone().limit(1);
        Ok(self.list_where(&query).await?.into_iter().next())
    }

    /// Partial update of selected columns
    pub async fn patch(&self, id: i64, patch: Record) -> DomainResult<T> {
        from_record(self.store.update(T::TABLE, id, patch).await?)
    }
}

#[async_trait]
impl<T: TableRecord> Repository<T> for TableRepository<T> {
    async fn create(&self, entity: &T) -> DomainResult<T> {
        let record = writable_fields(to_record(entity)?);
        from_record(self.store.insert(T::TABLE, record).await?)
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<T>> {
        self.find_one(&Query::new().eq("id", id)).await
    }

    async fn list(&self) -> DomainResult<Vec<T>> {
        self.list_where(&Query::new().order_by("id", true)).await
    }

    async fn update(&self, entity: &T) -> DomainResult<T> {
        let patch = writable_fields(to_record(entity)?);
        self.patch(entity.id(), patch).await
    }

    async fn delete(&self, id: i64) -> DomainResult<()> {
        self.store.delete(T::TABLE, id).await.map(|_| ())
    }
}

pub fn to_record<T: serde::Serialize>(entity: &T) -> DomainResult<Record> {
    match serde_json::to_value(entity) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(DomainError::Internal(format!("expected an object, got {}", other))),
        Err(e) => Err(DomainError::Internal(e.to_string())),
    }
}

pub fn from_record<T: TableRecord>(record: Record) -> DomainResult<T> {
    serde_json::from_value(Value::Object(record))
        .map_err(|e| DomainError::Internal(format!("Failed to decode {} row: {}", T::TABLE, e)))
}

/// Drop store-assigned columns before a write
fn writable_fields(mut record: Record) -> Record {
    record.remove("id");
    if matches!(record.get("created_at"), Some(Value::Null)) {
        record.remove("created_at");
    }
    record
}
