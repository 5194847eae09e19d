//! Object storage over HTTP

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};

use super::client::RestClient;
use crate::domain::{DomainError, DomainResult};
use crate::repository::traits::{BlobStore, StoredObject};

pub struct RestBlobStore {
    client: RestClient,
    bucket: String,
}

impl RestBlobStore {
    pub fn new(client: RestClient, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for RestBlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> DomainResult<StoredObject> {
        let path = path.trim_start_matches('/');
        let content_type = HeaderValue::from_str(content_type)
            .map_err(|e| DomainError::InvalidInput(format!("invalid content type: {}", e)))?;
        let request = self
            .client
            .http()
            .post(self.client.url(&format!("storage/v1/object/{}/{}", self.bucket, path)))
            .header(CONTENT_TYPE, content_type)
            .header(CACHE_CONTROL, HeaderValue::from_static("max-age=3600"))
            .header("x-upsert", HeaderValue::from_static("true"))
            .body(bytes);
        self.client.send(request).await?;

        Ok(StoredObject {
            path: path.to_string(),
            public_url: self.public_url(path),
        })
    }

    fn public_url(&self, path: &str) -> String {
        self.client.url(&format!(
            "storage/v1/object/public/{}/{}",
            self.bucket,
            path.trim_start_matches('/')
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url() {
        let blobs = RestBlobStore::new(RestClient::new("https://demo.example.co", "anon"), "wedding-photos");
        assert_eq!(
            blobs.public_url("shopping_item_images/3.jpg"),
            "https://demo.example.co/storage/v1/object/public/wedding-photos/shopping_item_images/3.jpg"
        );
    }
}
