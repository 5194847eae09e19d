//! Repository Layer
//!
//! Data access abstractions and implementations.

mod change;
mod db;
mod hub;
mod local_auth;
mod local_blob;
mod polling_feed;
mod query;
mod sqlite_store;
mod table;
mod traits;

pub mod rest;


pub use change::{ChangeKind, RecordChange, Subscription, SubscriptionHandle};
pub use db::{open_connection, run_migrations, table_columns, ColumnType};
pub use hub::ChangeHub;
pub use local_auth::LocalAuth;
pub use local_blob::LocalBlobStore;
pub use polling_feed::{diff_snapshots, PollingChangeFeed, DEFAULT_POLL_INTERVAL};
pub use query::{record_id, values_equal, Filter, Order, Query, Record};
pub use sqlite_store::{SqliteStore, TABLES};
pub use table::{from_record, to_record, TableRepository};
pub use traits::{AuthService, BlobStore, ChangeStream, RecordStore, Repository, StoredObject};
