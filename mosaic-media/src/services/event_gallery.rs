//! Event gallery aggregation
//!
//! Reconstructs the event gallery out of a flat asset listing: one
//! representative thumbnail per event for the gallery page, and the full
//! image set for one event's detail view.

use crate::model::{strip_extension, AssetRecord, EventGalleryEntry, EventImage, EventImageSet, GroupKey};
use crate::services::folder_key::resolve_group_key;
use crate::services::store_client::{expr_exact_folder, expr_under_folder, MediaStore};
use crate::services::thumbnail::select_thumbnail;
use crate::services::title::format_title;
use chrono::{DateTime, Utc};
use mosaic_common::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Context/metadata fields requested with every gallery search
const SEARCH_FIELDS: [&str; 2] = ["context", "metadata"];

/// Aggregates media store assets into event gallery entities
pub struct EventGalleryAggregator {
    store: Arc<dyn MediaStore>,
    base_folder: String,
    /// When set, the gallery listing reads this named collection instead
    /// of inferring groups from folders
    collection: Option<String>,
    max_results: u32,
}

impl EventGalleryAggregator {
    pub fn new(store: Arc<dyn MediaStore>, base_folder: impl Into<String>, max_results: u32) -> Self {
        Self {
            store,
            base_folder: base_folder.into(),
            collection: None,
            max_results,
        }
    }

    /// Switch the listing to collection-based grouping
    pub fn with_collection(mut self, name: impl Into<String>) -> Self {
        self.collection = Some(name.into());
        self
    }

    /// One gallery entry per event, newest representative asset first.
    ///
    /// Assets that resolve to no group key become their own synthetic
    /// single-asset pseudo-entry instead of being dropped; back-catalog
    /// media predating the folder convention still shows up that way.
    pub async fn list_event_thumbnails(&self) -> Result<Vec<EventGalleryEntry>> {
        if let Some(collection) = &self.collection {
            return self.list_from_collection(collection).await;
        }

        let expression = expr_under_folder(&self.base_folder);
        let assets = self
            .store
            .search(&expression, &SEARCH_FIELDS, self.max_results)
            .await
            .map_err(|e| Error::Remote(e.to_string()))?;

        if assets.is_empty() {
            tracing::warn!(folder = %self.base_folder, "No assets found under gallery folder");
            return Ok(Vec::new());
        }

        let mut groups: HashMap<GroupKey, Vec<AssetRecord>> = HashMap::new();
        let mut ungrouped: Vec<(usize, AssetRecord)> = Vec::new();

        for (index, asset) in assets.into_iter().enumerate() {
            match resolve_group_key(&asset, &self.base_folder) {
                Some(key) => groups.entry(key).or_default().push(asset),
                None => {
                    tracing::debug!(
                        public_id = %asset.public_id,
                        "Asset resolves to no event folder, keeping as standalone entry"
                    );
                    ungrouped.push((index, asset));
                }
            }
        }

        let mut entries = Vec::with_capacity(groups.len() + ungrouped.len());

        for (key, group) in groups {
            // Non-empty by construction, but the selector's contract is
            // Option either way.
            let Some(cover) = select_thumbnail(&group).cloned() else {
                continue;
            };
            let title = format_title(key.as_str());
            let description = cover.caption().unwrap_or_else(|| title.clone());
            entries.push(EventGalleryEntry {
                key,
                title,
                description,
                cover,
                position: 0,
            });
        }

        for (index, asset) in ungrouped {
            let caption = asset.caption();
            let title = caption
                .clone()
                .unwrap_or_else(|| strip_extension(asset.public_id_filename()).to_string());
            entries.push(EventGalleryEntry {
                key: GroupKey::synthetic(index),
                title,
                description: caption.unwrap_or_default(),
                cover: asset,
                position: 0,
            });
        }

        entries.sort_by_key(|entry| std::cmp::Reverse(created_or_epoch(&entry.cover)));
        for (index, entry) in entries.iter_mut().enumerate() {
            entry.position = index + 1;
        }

        tracing::info!(count = entries.len(), "Built event gallery listing");
        Ok(entries)
    }

    /// Collection-based listing: the collection's own order is preserved
    /// and the first asset seen per event becomes its cover.
    async fn list_from_collection(&self, collection: &str) -> Result<Vec<EventGalleryEntry>> {
        let assets = self
            .store
            .fetch_collection(collection, self.max_results)
            .await
            .map_err(|e| Error::Remote(e.to_string()))?;

        let mut entries: Vec<EventGalleryEntry> = Vec::new();
        for asset in assets {
            let Some(key) = resolve_group_key(&asset, &self.base_folder) else {
                tracing::debug!(public_id = %asset.public_id, "Collection asset has no event folder, skipping");
                continue;
            };
            if entries.iter().any(|entry| entry.key == key) {
                continue;
            }
            let title = format_title(key.as_str());
            let description = asset.caption().unwrap_or_else(|| title.clone());
            let position = entries.len() + 1;
            entries.push(EventGalleryEntry {
                key,
                title,
                description,
                cover: asset,
                position,
            });
        }

        tracing::info!(
            collection = %collection,
            count = entries.len(),
            "Built event gallery listing from collection"
        );
        Ok(entries)
    }

    /// Every image belonging to one named event, designated thumbnails
    /// first, then newest first.
    ///
    /// The scoped query is tried first; if it errors or comes back empty
    /// the broad base-prefix query is retried and filtered client-side.
    /// Failures during that second chance degrade to an empty set rather
    /// than failing the caller.
    pub async fn list_event_images(&self, key: &GroupKey) -> Result<EventImageSet> {
        let title = format_title(key.as_str());

        // Synthetic keys have no folder behind them; nothing to expand.
        if key.is_synthetic() {
            tracing::debug!(key = %key, "Synthetic pseudo-group is not expandable");
            return Ok(EventImageSet {
                key: key.clone(),
                title,
                images: Vec::new(),
            });
        }

        let event_path = format!("{}/{}", self.base_folder, key);
        let scoped = expr_exact_folder(&event_path);

        let assets = match self.store.search(&scoped, &SEARCH_FIELDS, self.max_results).await {
            Ok(assets) if !assets.is_empty() => assets,
            Ok(_) => {
                tracing::debug!(key = %key, "Scoped event search empty, retrying broad search");
                self.broad_search_filtered(key, &event_path).await
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Scoped event search failed, retrying broad search");
                self.broad_search_filtered(key, &event_path).await
            }
        };

        let mut images: Vec<EventImage> = assets
            .into_iter()
            .map(|asset| EventImage {
                is_thumbnail: asset.is_thumbnail(),
                asset,
            })
            .collect();

        images.sort_by(|a, b| {
            b.is_thumbnail
                .cmp(&a.is_thumbnail)
                .then_with(|| created_or_epoch(&b.asset).cmp(&created_or_epoch(&a.asset)))
        });

        tracing::info!(key = %key, count = images.len(), "Built event image set");
        Ok(EventImageSet {
            key: key.clone(),
            title,
            images,
        })
    }

    /// Second-chance strategy: broad base-prefix search filtered to the
    /// event client-side. Errors here are absorbed; a partial gallery
    /// beats a hard failure for one event's sub-view.
    async fn broad_search_filtered(&self, key: &GroupKey, event_path: &str) -> Vec<AssetRecord> {
        let expression = expr_under_folder(&self.base_folder);
        match self.store.search(&expression, &SEARCH_FIELDS, self.max_results).await {
            Ok(assets) => assets
                .into_iter()
                .filter(|asset| asset_belongs_to_event(asset, key, event_path))
                .collect(),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Broad retry failed, treating as no images");
                Vec::new()
            }
        }
    }
}

/// Client-side match of an asset against an event folder, across all the
/// fields that may carry placement
fn asset_belongs_to_event(asset: &AssetRecord, key: &GroupKey, event_path: &str) -> bool {
    let infix = format!("/{}/", key);
    let suffix = format!("/{}", key);

    if let Some(folder) = asset.asset_folder.as_deref() {
        return folder == event_path || folder.contains(&infix) || folder.ends_with(&suffix);
    }
    if let Some(folder) = asset.folder.as_deref() {
        return folder == event_path || folder.contains(&infix) || folder.ends_with(&suffix);
    }
    asset.public_id.contains(&infix) || asset.public_id.starts_with(&format!("{}/", event_path))
}

fn created_or_epoch(asset: &AssetRecord) -> DateTime<Utc> {
    asset.created_at.unwrap_or(DateTime::<Utc>::MIN_UTC)
}
