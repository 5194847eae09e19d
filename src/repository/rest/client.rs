//! Shared HTTP client

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::{DomainError, DomainResult};

#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: Arc<RwLock<Option<String>>>,
}

impl RestClient {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub async fn access_token(&self) -> Option<String> {
        self.access_token.read().await.clone()
    }

    pub async fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write().await = token;
    }

    /// `apikey` plus a bearer of the session token (anon key when signed out)
    pub async fn headers(&self) -> DomainResult<HeaderMap> {
        let bearer = self
            .access_token()
            .await
            .unwrap_or_else(|| self.anon_key.clone());

        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(&self.anon_key)?);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", bearer))?);
        Ok(headers)
    }

    /// Attach auth headers, send, and map error statuses
    pub async fn send(&self, request: RequestBuilder) -> DomainResult<Response> {
        let response = request
            .headers(self.headers().await?)
            .send()
            .await
            .map_err(|e| DomainError::Remote(format!("Network error: {}", e)))?;
        check_status(response).await
    }

    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> DomainResult<T> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| DomainError::Remote(format!("Malformed response: {}", e)))
    }
}

fn header_value(value: &str) -> DomainResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| DomainError::InvalidInput(format!("invalid header: {}", e)))
}

async fn check_status(response: Response) -> DomainResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(DomainError::Unauthenticated);
    }

    let body = response.text().await.unwrap_or_default();
    Err(DomainError::Remote(error_message(status, &body)))
}

/// Server-provided message if the body has one
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()))
}
