//! Shaadi Cart Core
//!
//! Layered architecture:
//! - domain: Records, page context and business rules
//! - repository: Store, change stream, auth and blob backends
//! - aggregation: Budget rollups
//! - sync: Live shopping list synchronizer
//! - view: View models and the list rendering boundary
//! - commands: Page-level operations

use std::sync::Arc;

use tokio::sync::RwLock;

pub mod aggregation;
pub mod commands;
pub mod config;
pub mod domain;
pub mod repository;
pub mod session;
pub mod sync;
pub mod view;

use config::{AppConfig, BackendConfig};
use domain::{DomainResult, GroupSelection, SessionContext};
use repository::rest::{RestAuth, RestBlobStore, RestClient, RestRecordStore};
use repository::{
    AuthService, BlobStore, ChangeStream, LocalAuth, LocalBlobStore, PollingChangeFeed, RecordStore,
    SqliteStore,
};
use sync::LiveListSynchronizer;
use view::ListRenderer;

/// Application state shared across commands
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn RecordStore>,
    pub feed: Arc<dyn ChangeStream>,
    pub auth: Arc<dyn AuthService>,
    pub blobs: Arc<dyn BlobStore>,
    /// Group the user is working in
    pub selection: RwLock<GroupSelection>,
}

impl AppState {
    fn local(config: AppConfig, store: Arc<SqliteStore>) -> Self {
        let blobs = Arc::new(LocalBlobStore::new(config.blob_dir()));
        Self {
            store: store.clone(),
            feed: store,
            auth: Arc::new(LocalAuth::new()),
            blobs,
            selection: RwLock::new(GroupSelection::default()),
            config,
        }
    }

    /// SQLite database in the data directory
    pub async fn open_local(config: AppConfig) -> DomainResult<Self> {
        let store = SqliteStore::open(&config.db_path()).await?;
        log::info!("opened local store at {}", config.db_path().display());
        Ok(Self::local(config, Arc::new(store)))
    }

    pub async fn in_memory(config: AppConfig) -> DomainResult<Self> {
        let store = SqliteStore::in_memory().await?;
        Ok(Self::local(config, Arc::new(store)))
    }

    /// Hosted backend; changes are discovered by polling
    pub fn connect_remote(config: AppConfig, backend: &BackendConfig) -> Self {
        let client = RestClient::new(&backend.url, &backend.anon_key);
        let store: Arc<dyn RecordStore> = Arc::new(RestRecordStore::new(client.clone()));
        let feed = Arc::new(PollingChangeFeed::new(store.clone(), config.poll_interval()));
        log::info!("connected to {}", backend.url);
        Self {
            store,
            feed,
            auth: Arc::new(RestAuth::new(client.clone())),
            blobs: Arc::new(RestBlobStore::new(client, &backend.storage_bucket)),
            selection: RwLock::new(GroupSelection::default()),
            config,
        }
    }

    /// Remote when a backend is configured, local otherwise
    pub async fn open(config: AppConfig) -> DomainResult<Self> {
        match config.backend.clone() {
            Some(backend) => Ok(Self::connect_remote(config, &backend)),
            None => Self::open_local(config).await,
        }
    }

    /// Authenticated user plus selected group, or the gate's error
    pub async fn session(&self) -> DomainResult<SessionContext> {
        let selection = self.selection.read().await.clone();
        session::require_session(self.auth.as_ref(), &selection).await
    }

    pub async fn select_group(&self, group_id: i64) {
        self.selection.write().await.select(group_id);
    }

    /// New live list for a shopping page
    pub fn shopping_list<R: ListRenderer>(&self, renderer: R) -> LiveListSynchronizer<R> {
        LiveListSynchronizer::new(self.store.clone(), self.feed.clone(), self.blobs.clone(), renderer)
    }
}

/// Start the rolling file logger in the configured log directory
pub fn init_logging(config: &AppConfig) -> Result<(), String> {
    rolling_logger::init_logger(config.log_dir(), "ShaadiCart")?;
    rolling_logger::info(&format!("data dir {}", config.data_dir.display()))
}
