//! HTTP clients for the platform's catalog, identity, and media services
//!
//! Every call carries the configured timeout; a 404 maps to `Ok(None)` on
//! the lookup seams, anything else non-2xx is a transport error.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::path::Path;
use std::time::Duration;

use super::{Catalog, CollaboratorError, Identity, MediaStore, ProductInfo, UserInfo};

fn build_client(timeout_ms: u64) -> Result<reqwest::Client, CollaboratorError> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| CollaboratorError::Transport(format!("Failed to build client: {e}")))
}

async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<Option<T>, CollaboratorError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| CollaboratorError::Transport(e.to_string()))?;

    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !response.status().is_success() {
        return Err(CollaboratorError::Transport(format!(
            "GET {} returned {}",
            url,
            response.status()
        )));
    }

    response
        .json::<T>()
        .await
        .map(Some)
        .map_err(|e| CollaboratorError::Decode(e.to_string()))
}

/// Catalog service client
#[derive(Clone)]
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Result<Self, CollaboratorError> {
        Ok(Self {
            client: build_client(timeout_ms)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn product_by_id(
        &self,
        product_id: &str,
    ) -> Result<Option<ProductInfo>, CollaboratorError> {
        let url = format!("{}/api/products/{}", self.base_url, product_id);
        get_json(&self.client, &url).await
    }
}

/// Identity service client
#[derive(Clone)]
pub struct HttpIdentity {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentity {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Result<Self, CollaboratorError> {
        Ok(Self {
            client: build_client(timeout_ms)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl Identity for HttpIdentity {
    async fn user_by_id(&self, user_id: &str) -> Result<Option<UserInfo>, CollaboratorError> {
        let url = format!("{}/api/users/{}", self.base_url, user_id);
        get_json(&self.client, &url).await
    }
}

/// Media (object storage) service client
#[derive(Clone)]
pub struct HttpMediaStore {
    client: reqwest::Client,
    base_url: String,
}

#[derive(serde::Deserialize)]
struct UploadResponse {
    url: String,
}

impl HttpMediaStore {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Result<Self, CollaboratorError> {
        Ok(Self {
            client: build_client(timeout_ms)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl MediaStore for HttpMediaStore {
    async fn upload_image(&self, local_path: &Path) -> Result<String, CollaboratorError> {
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| CollaboratorError::Transport(format!("Failed to read upload: {e}")))?;

        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());

        let url = format!("{}/api/media/images/{}", self.base_url, file_name);
        let response = self
            .client
            .post(&url)
            .header("content-type", "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| CollaboratorError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CollaboratorError::Transport(format!(
                "POST {} returned {}",
                url,
                response.status()
            )));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::Decode(e.to_string()))?;
        Ok(uploaded.url)
    }
}
