//! Filesystem blob store

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use super::traits::{BlobStore, StoredObject};
use crate::domain::{DomainError, DomainResult};

pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve a relative object path under the root
    fn resolve(&self, path: &str) -> DomainResult<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || relative.as_os_str().is_empty() {
            return Err(DomainError::InvalidInput(format!("invalid object path: {}", path)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> DomainResult<StoredObject> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::Internal(format!("Failed to create blob dir: {}", e)))?;
        }
        tokio::fs::write(&target, &bytes)
            .await
            .map_err(|e| DomainError::Internal(format!("Failed to write blob: {}", e)))?;
        log::debug!("stored {} ({}, {} bytes)", target.display(), content_type, bytes.len());

        let path = path.trim_start_matches('/').to_string();
        Ok(StoredObject {
            public_url: self.public_url(&path),
            path,
        })
    }

    fn public_url(&self, path: &str) -> String {
        format!("file://{}", self.root.join(path.trim_start_matches('/')).display())
    }
}
