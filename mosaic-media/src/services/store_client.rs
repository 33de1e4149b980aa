//! Remote media store client
//!
//! Thin wrapper over the store's HTTP API: expression search,
//! collection-by-name fetch, single-resource fetch and sidecar body fetch.
//! No business logic lives here; callers build expressions with the
//! helpers below and interpret the results.

use crate::model::AssetRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use mosaic_common::config::MediaStoreConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = "Mosaic/0.1.0 (https://github.com/mosaic/mosaic)";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Media store client errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Credentials incomplete, store treated as unavailable
    #[error("Media store credentials missing")]
    CredentialsMissing,

    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// Store API returned an error response
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Failed to parse API response
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Search expression for assets one level under a base folder
pub fn expr_under_folder(base: &str) -> String {
    format!("folder:{}/*", base)
}

/// Search expression for assets in an exact folder path. The path is
/// quoted so keys carrying reserved punctuation (colons) survive the
/// store's expression parser.
pub fn expr_exact_folder(path: &str) -> String {
    format!("folder:\"{}\"", path)
}

/// Restrict an expression to one resource kind (image or raw sidecar)
pub fn expr_with_kind(kind: ResourceKind, expression: &str) -> String {
    format!("resource_type:{} AND {}", kind.as_str(), expression)
}

/// Resource kinds the engine queries for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Image,
    Raw,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Raw => "raw",
        }
    }
}

/// Read-only access to the remote media store
///
/// Implementations are passed explicitly into the aggregators; there is
/// no process-wide client handle.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Expression search returning asset records with the requested
    /// context/metadata fields populated
    async fn search(
        &self,
        expression: &str,
        with_fields: &[&str],
        max_results: u32,
    ) -> Result<Vec<AssetRecord>, StoreError>;

    /// Fetch a single resource (with context and metadata) by public id
    async fn fetch_resource(&self, public_id: &str) -> Result<AssetRecord, StoreError>;

    /// Fetch the ordered contents of a named collection
    async fn fetch_collection(
        &self,
        name: &str,
        max_results: u32,
    ) -> Result<Vec<AssetRecord>, StoreError>;

    /// Plain GET against an asset's own delivery URL, parsed as JSON
    async fn fetch_json_body(&self, url: &str) -> Result<serde_json::Value, StoreError>;
}

/// Search request body
#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    expression: &'a str,
    with_field: &'a [&'a str],
    max_results: u32,
}

/// Search response envelope
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    resources: Vec<RawResource>,
}

/// Collection response envelope
#[derive(Debug, Deserialize)]
struct CollectionResponse {
    #[serde(default)]
    assets: Vec<CollectionAssetRef>,
}

#[derive(Debug, Deserialize)]
struct CollectionAssetRef {
    public_id: String,
}

/// One resource as the store reports it
#[derive(Debug, Deserialize)]
struct RawResource {
    asset_id: Option<String>,
    public_id: String,
    secure_url: Option<String>,
    url: Option<String>,
    folder: Option<String>,
    asset_folder: Option<String>,
    filename: Option<String>,
    display_name: Option<String>,
    #[serde(default)]
    context: serde_json::Value,
    #[serde(default)]
    metadata: serde_json::Value,
    created_at: Option<DateTime<Utc>>,
    width: Option<u32>,
    height: Option<u32>,
    format: Option<String>,
    bytes: Option<u64>,
}

impl From<RawResource> for AssetRecord {
    fn from(raw: RawResource) -> Self {
        let url = raw.secure_url.or(raw.url).unwrap_or_default();
        AssetRecord {
            id: raw.asset_id.unwrap_or_else(|| raw.public_id.clone()),
            public_id: raw.public_id,
            url,
            folder: raw.folder,
            asset_folder: raw.asset_folder,
            filename: raw.filename,
            display_name: raw.display_name,
            context: raw.context,
            metadata: raw.metadata,
            created_at: raw.created_at,
            width: raw.width,
            height: raw.height,
            format: raw.format,
            bytes: raw.bytes,
        }
    }
}

/// HTTP client against the media store API
pub struct MediaStoreClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl MediaStoreClient {
    /// Build a client from configuration. Missing credentials make the
    /// store unavailable rather than a hard failure.
    pub fn new(config: &MediaStoreConfig) -> Result<Self, StoreError> {
        let (base_url, api_key, api_secret) = match (
            config.api_base_url.as_ref(),
            config.api_key.as_ref(),
            config.api_secret.as_ref(),
        ) {
            (Some(url), Some(key), Some(secret)) => (url.clone(), key.clone(), secret.clone()),
            _ => return Err(StoreError::CredentialsMissing),
        };

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            api_secret,
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api(status.as_u16(), body));
        }
        Ok(response)
    }
}

#[async_trait]
impl MediaStore for MediaStoreClient {
    async fn search(
        &self,
        expression: &str,
        with_fields: &[&str],
        max_results: u32,
    ) -> Result<Vec<AssetRecord>, StoreError> {
        let url = format!("{}/resources/search", self.base_url);
        tracing::debug!(expression = %expression, url = %url, "Searching media store");

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .json(&SearchRequest {
                expression,
                with_field: with_fields,
                max_results,
            })
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;
        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;

        tracing::debug!(
            expression = %expression,
            count = parsed.resources.len(),
            "Media store search completed"
        );

        Ok(parsed.resources.into_iter().map(AssetRecord::from).collect())
    }

    async fn fetch_resource(&self, public_id: &str) -> Result<AssetRecord, StoreError> {
        let url = format!(
            "{}/resources/{}?context=true&metadata=true",
            self.base_url, public_id
        );

        let response = self
            .http_client
            .get(&url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;
        let raw: RawResource = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;

        Ok(raw.into())
    }

    async fn fetch_collection(
        &self,
        name: &str,
        max_results: u32,
    ) -> Result<Vec<AssetRecord>, StoreError> {
        let url = format!("{}/collections/{}", self.base_url, name);
        tracing::debug!(collection = %name, "Fetching media store collection");

        let response = self
            .http_client
            .get(&url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;
        let parsed: CollectionResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;

        // Collection entries are references only; resolve each to a full
        // record, tolerating individual failures.
        let fetches = parsed
            .assets
            .iter()
            .take(max_results as usize)
            .map(|asset_ref| self.fetch_resource(&asset_ref.public_id));

        let mut records = Vec::new();
        for (result, asset_ref) in join_all(fetches).await.into_iter().zip(&parsed.assets) {
            match result {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(
                    public_id = %asset_ref.public_id,
                    error = %e,
                    "Failed to resolve collection asset, skipping"
                ),
            }
        }

        Ok(records)
    }

    async fn fetch_json_body(&self, url: &str) -> Result<serde_json::Value, StoreError> {
        tracing::debug!(url = %url, "Fetching sidecar body");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expression_builders() {
        assert_eq!(expr_under_folder("gallery"), "folder:gallery/*");
        assert_eq!(
            expr_exact_folder("gallery/panel:kurdistan-at-a-crossroads"),
            "folder:\"gallery/panel:kurdistan-at-a-crossroads\""
        );
        assert_eq!(
            expr_with_kind(ResourceKind::Raw, &expr_exact_folder("notable-figures/saladin")),
            "resource_type:raw AND folder:\"notable-figures/saladin\""
        );
    }

    #[test]
    fn client_requires_credentials() {
        let config = MediaStoreConfig::default();
        assert!(matches!(
            MediaStoreClient::new(&config),
            Err(StoreError::CredentialsMissing)
        ));
    }

    #[test]
    fn raw_resource_conversion_prefers_secure_url() {
        let raw: RawResource = serde_json::from_value(serde_json::json!({
            "public_id": "gallery/first-meeting/img1",
            "secure_url": "https://media.example.com/img1.jpg",
            "url": "http://media.example.com/img1.jpg",
            "asset_folder": "gallery/first-meeting"
        }))
        .unwrap();

        let record = AssetRecord::from(raw);
        assert_eq!(record.id, "gallery/first-meeting/img1");
        assert_eq!(record.url, "https://media.example.com/img1.jpg");
        assert_eq!(record.asset_folder.as_deref(), Some("gallery/first-meeting"));
    }
}
