//! Hosted backend over HTTP
//!
//! PostgREST-style record store, GoTrue-style auth and object storage,
//! sharing one `RestClient` (base URL, anon key, session token).

mod auth;
mod client;
mod storage;
mod store;

pub use auth::RestAuth;
pub use client::RestClient;
pub use storage::RestBlobStore;
pub use store::RestRecordStore;
