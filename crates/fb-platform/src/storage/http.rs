//! HTTP Poster Storage
//!
//! Client for the hosted object-storage REST API.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{PlatformError, Result};
use crate::storage::{encode_key, public_object_url, ObjectInfo, PosterStorage};

/// Seconds browsers and CDNs may cache a poster
const POSTER_CACHE_CONTROL: &str = "3600";

#[derive(Debug, Clone)]
pub struct HttpStorageConfig {
    /// Hosted backend base URL
    pub base_url: String,
    /// Key with write access to the bucket
    pub service_key: String,
    pub bucket: String,
}

/// Error body returned by the storage API
#[derive(Debug, Default, Deserialize)]
struct StorageErrorBody {
    /// String or number depending on the server version
    #[serde(default, rename = "statusCode")]
    status_code: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl StorageErrorBody {
    /// Missing objects are reported as 400 with an embedded 404 by some versions.
    fn is_not_found(&self) -> bool {
        let embedded_404 = match &self.status_code {
            Some(Value::String(code)) => code == "404",
            Some(Value::Number(code)) => code.as_u64() == Some(404),
            _ => false,
        };
        embedded_404 || self.error.as_deref() == Some("not_found")
    }
}

/// Object info body. Newer servers report flat fields, older ones nest them
/// under `metadata`.
#[derive(Debug, Deserialize)]
struct ObjectInfoBody {
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    metadata: Option<ObjectMetadata>,
}

#[derive(Debug, Deserialize)]
struct ObjectMetadata {
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    mimetype: Option<String>,
}

impl ObjectInfoBody {
    fn into_info(self) -> Option<ObjectInfo> {
        let (meta_size, meta_type) = match self.metadata {
            Some(meta) => (meta.size, meta.mimetype),
            None => (None, None),
        };
        let size = self.size.or(meta_size)?;
        Some(ObjectInfo {
            size: usize::try_from(size).unwrap_or(usize::MAX),
            content_type: self.content_type.or(meta_type)?,
        })
    }
}

pub struct HttpPosterStorage {
    config: HttpStorageConfig,
    client: reqwest::Client,
}

impl HttpPosterStorage {
    pub fn new(config: HttpStorageConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: HttpStorageConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.bucket_url(), encode_key(key))
    }

    fn bucket_url(&self) -> String {
        format!(
            "{}/storage/v1/object/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.bucket)
        )
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.config.service_key)
            .header("apikey", &self.config.service_key)
    }

    fn info_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/info/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.bucket),
            encode_key(key)
        )
    }

    async fn error_from(response: reqwest::Response) -> PlatformError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        Self::error_from_text(status, text)
    }

    fn error_from_text(status: reqwest::StatusCode, text: String) -> PlatformError {
        let body: StorageErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let message = body
            .message
            .or(body.error)
            .unwrap_or_else(|| if text.is_empty() { status.to_string() } else { text });
        warn!(status = status.as_u16(), message = %message, "Storage request rejected");
        PlatformError::storage(message)
    }
}

#[async_trait]
impl PosterStorage for HttpPosterStorage {
    async fn upload(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String> {
        let size = bytes.len();
        let response = self
            .authorized(self.client.post(self.object_url(key)))
            .header("content-type", content_type)
            .header("cache-control", format!("max-age={}", POSTER_CACHE_CONTROL))
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        debug!(key = %key, size, "Uploaded poster");
        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let response = self
            .authorized(self.client.delete(self.bucket_url()))
            .json(&json!({ "prefixes": [key] }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        debug!(key = %key, "Deleted poster");
        Ok(())
    }

    async fn object_info(&self, key: &str) -> Result<Option<ObjectInfo>> {
        let response = self
            .authorized(self.client.get(self.info_url(key)))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body: StorageErrorBody = serde_json::from_str(&text).unwrap_or_default();
            if body.is_not_found() {
                return Ok(None);
            }
            return Err(Self::error_from_text(status, text));
        }

        let body: ObjectInfoBody = response.json().await?;
        let info = body
            .into_info()
            .ok_or_else(|| PlatformError::storage("object info is missing size or content type"))?;
        debug!(key = %key, size = info.size, content_type = %info.content_type, "Fetched poster info");
        Ok(Some(info))
    }

    fn public_url(&self, key: &str) -> String {
        public_object_url(&self.config.base_url, &self.config.bucket, key)
    }
}
