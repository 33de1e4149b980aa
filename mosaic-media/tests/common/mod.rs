//! Shared test fixtures: an in-memory media store fake and asset builders

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use mosaic_media::services::store_client::{MediaStore, StoreError};
use mosaic_media::AssetRecord;
use std::collections::HashMap;

/// In-memory media store understanding the expression shapes the engine
/// issues: `folder:base/*`, `folder:"exact/path"` (optionally with a
/// trailing `/*` wildcard) and the `resource_type:` prefix.
#[derive(Default)]
pub struct FakeStore {
    pub images: Vec<AssetRecord>,
    pub raws: Vec<AssetRecord>,
    /// Sidecar bodies keyed by delivery URL
    pub sidecar_bodies: HashMap<String, serde_json::Value>,
    pub collections: HashMap<String, Vec<AssetRecord>>,
    /// Every search fails (transient remote error)
    pub fail_search: bool,
    /// Only exact-folder (quoted) searches fail
    pub fail_exact_folder: bool,
}

impl FakeStore {
    fn pool_for(&self, expression: &str) -> &[AssetRecord] {
        if expression.starts_with("resource_type:raw") {
            &self.raws
        } else {
            &self.images
        }
    }

    fn folder_clause(expression: &str) -> &str {
        expression
            .rsplit("folder:")
            .next()
            .expect("expression has a folder clause")
    }
}

fn folder_of(asset: &AssetRecord) -> Option<&str> {
    asset.asset_folder.as_deref().or(asset.folder.as_deref())
}

fn matches_prefix(asset: &AssetRecord, base: &str) -> bool {
    let prefix = format!("{}/", base);
    if let Some(folder) = folder_of(asset) {
        if folder.starts_with(&prefix) {
            return true;
        }
    }
    asset.public_id.starts_with(&prefix)
}

fn matches_exact(asset: &AssetRecord, path: &str) -> bool {
    if let Some(folder) = folder_of(asset) {
        if folder == path {
            return true;
        }
    }
    asset.public_id.starts_with(&format!("{}/", path))
}

#[async_trait]
impl MediaStore for FakeStore {
    async fn search(
        &self,
        expression: &str,
        _with_fields: &[&str],
        max_results: u32,
    ) -> Result<Vec<AssetRecord>, StoreError> {
        if self.fail_search {
            return Err(StoreError::Network("fake store down".to_string()));
        }

        let clause = Self::folder_clause(expression);
        let quoted = clause.starts_with('"');
        if quoted && self.fail_exact_folder {
            return Err(StoreError::Api(400, "exact folder search rejected".to_string()));
        }

        let clause = clause.trim_matches('"');
        let filter: Box<dyn Fn(&AssetRecord) -> bool> = if let Some(base) = clause.strip_suffix("/*") {
            let base = base.to_string();
            Box::new(move |asset| matches_prefix(asset, &base))
        } else {
            let path = clause.to_string();
            Box::new(move |asset| matches_exact(asset, &path))
        };

        Ok(self
            .pool_for(expression)
            .iter()
            .filter(|asset| filter(asset))
            .take(max_results as usize)
            .cloned()
            .collect())
    }

    async fn fetch_resource(&self, public_id: &str) -> Result<AssetRecord, StoreError> {
        self.images
            .iter()
            .chain(self.raws.iter())
            .find(|asset| asset.public_id == public_id)
            .cloned()
            .ok_or_else(|| StoreError::Api(404, format!("no such resource: {}", public_id)))
    }

    async fn fetch_collection(
        &self,
        name: &str,
        max_results: u32,
    ) -> Result<Vec<AssetRecord>, StoreError> {
        self.collections
            .get(name)
            .map(|assets| assets.iter().take(max_results as usize).cloned().collect())
            .ok_or_else(|| StoreError::Api(404, format!("no such collection: {}", name)))
    }

    async fn fetch_json_body(&self, url: &str) -> Result<serde_json::Value, StoreError> {
        self.sidecar_bodies
            .get(url)
            .cloned()
            .ok_or_else(|| StoreError::Network(format!("no body at {}", url)))
    }
}

/// Asset with folder metadata populated, created at `created_secs` past
/// the epoch
pub fn foldered_asset(public_id: &str, folder: &str, created_secs: i64) -> AssetRecord {
    AssetRecord {
        id: public_id.to_string(),
        public_id: public_id.to_string(),
        url: format!("https://media.example.com/{}", public_id),
        folder: Some(folder.to_string()),
        asset_folder: Some(folder.to_string()),
        filename: None,
        display_name: None,
        context: serde_json::Value::Null,
        metadata: serde_json::Value::Null,
        created_at: Some(created_at(created_secs)),
        width: Some(1600),
        height: Some(900),
        format: Some("jpg".to_string()),
        bytes: Some(123_456),
    }
}

/// Asset with no folder metadata at all
pub fn flat_asset(public_id: &str, created_secs: i64) -> AssetRecord {
    let mut asset = foldered_asset(public_id, "", created_secs);
    asset.folder = None;
    asset.asset_folder = None;
    asset
}

pub fn created_at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}
