//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces for data access and the hosted
//! collaborators (auth, change stream, blob storage).
//! Implementations can use SQLite, a REST backend, the filesystem, etc.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::change::Subscription;
use super::query::{Query, Record};
use crate::domain::{DomainResult, Entity, Session, User};

/// Core repository trait for CRUD operations
///
/// Generic over any Entity type.
/// All operations are async to support various backends.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Create a new entity
    async fn create(&self, entity: &T) -> DomainResult<T>;

    /// Find entity by ID
    async fn find_by_id(&self, id: T::Id) -> DomainResult<Option<T>>;

    /// List all entities
    async fn list(&self) -> DomainResult<Vec<T>>;

    /// Update an existing entity
    async fn update(&self, entity: &T) -> DomainResult<T>;

    /// Delete entity by ID
    async fn delete(&self, id: T::Id) -> DomainResult<()>;
}

/// Row-level access to named collections
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn select(&self, table: &str, query: &Query) -> DomainResult<Vec<Record>>;

    /// Insert a row, returning it as stored (with id and defaults)
    async fn insert(&self, table: &str, record: Record) -> DomainResult<Record>;

    /// Apply a partial update, returning the new row
    async fn update(&self, table: &str, id: i64, patch: Record) -> DomainResult<Record>;

    /// Delete a row, returning its last state
    async fn delete(&self, table: &str, id: i64) -> DomainResult<Record>;
}

/// Push feed of row changes
#[async_trait]
pub trait ChangeStream: Send + Sync {
    /// Events for rows of `table` matching the query's filters
    async fn subscribe(&self, table: &str, query: &Query) -> DomainResult<Subscription>;
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn is_authenticated(&self) -> bool;

    async fn current_user(&self) -> DomainResult<Option<User>>;

    async fn sign_in(&self, email: &str, password: &str) -> DomainResult<Session>;

    async fn sign_up(&self, email: &str, password: &str, name: Option<&str>) -> DomainResult<Session>;

    /// Text a one-time sign-in code to `phone`
    async fn send_otp(&self, phone: &str) -> DomainResult<()>;

    /// Exchange a texted code for a session, registering the phone on first use
    async fn verify_otp(&self, phone: &str, token: &str) -> DomainResult<Session>;

    async fn sign_out(&self) -> DomainResult<()>;
}

/// Location of an uploaded object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub path: String,
    pub public_url: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload (overwriting) an object
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> DomainResult<StoredObject>;

    fn public_url(&self, path: &str) -> String;
}
