//! Notable figure resolution
//!
//! Figures live one per folder under the figures prefix: a portrait image
//! plus a JSON sidecar carrying the structured fields the image cannot
//! hold. The resolver pairs the two by folder and resolves the sidecar's
//! associated-figure references into bounded summary projections.

use crate::model::{strip_extension, AssetRecord, FigureProfile, FigureSummary, GroupKey};
use crate::services::store_client::{expr_exact_folder, expr_with_kind, MediaStore, ResourceKind};
use futures::future::{join_all, BoxFuture};
use mosaic_common::{Error, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

const SEARCH_FIELDS: [&str; 2] = ["context", "metadata"];
/// A figure folder holds a handful of files at most
const SCOPED_MAX_RESULTS: u32 = 10;
/// Associated figures are resolved to summaries only; nothing below this
/// depth is fetched
const MAX_ASSOCIATION_DEPTH: usize = 1;

/// Concurrency strategy for resolving a figure's associations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOut {
    /// All associations fetched in one concurrent join
    Parallel,
    /// One association at a time, visited set accumulating across siblings
    Sequential,
}

/// JSON sidecar schema; every field optional
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
struct FigureSidecar {
    name: Option<String>,
    native_name: Option<String>,
    nickname: Option<String>,
    era: Option<String>,
    category: Option<String>,
    birthplace: Option<String>,
    biography: Option<String>,
    education: Option<String>,
    sort_order: Option<i64>,
    associated_figures: Vec<String>,
}

/// Resolves figure profiles out of the media store
pub struct FigureResolver {
    store: Arc<dyn MediaStore>,
    base_folder: String,
    max_results: u32,
    fan_out: FanOut,
}

impl FigureResolver {
    pub fn new(store: Arc<dyn MediaStore>, base_folder: impl Into<String>, max_results: u32) -> Self {
        Self {
            store,
            base_folder: base_folder.into(),
            max_results,
            fan_out: FanOut::Parallel,
        }
    }

    pub fn with_fan_out(mut self, fan_out: FanOut) -> Self {
        self.fan_out = fan_out;
        self
    }

    /// All figures, ordered by explicit sidecar sort order, ties broken
    /// alphabetically by resolved name. Associations are listed as raw
    /// slugs only; the list view never resolves them.
    pub async fn list_figures(&self) -> Result<Vec<FigureProfile>> {
        let scope = format!("{}/*", self.base_folder);
        let image_expr = expr_with_kind(ResourceKind::Image, &expr_exact_folder(&scope));
        let images = self
            .store
            .search(&image_expr, &SEARCH_FIELDS, self.max_results)
            .await
            .map_err(|e| Error::Remote(e.to_string()))?;

        if images.is_empty() {
            tracing::warn!(folder = %self.base_folder, "No figure images found");
            return Ok(Vec::new());
        }

        // Group strictly by folder metadata. Unlike the gallery there is
        // no flat-media fallback: an image without a folder cannot be
        // paired with its sidecar.
        let mut groups: HashMap<String, Vec<AssetRecord>> = HashMap::new();
        for image in images {
            let Some(folder) = image.asset_folder.as_deref().or(image.folder.as_deref()) else {
                tracing::warn!(public_id = %image.public_id, "Figure image has no folder info, dropping");
                continue;
            };
            let key = folder.rsplit('/').next().unwrap_or(folder).to_string();
            groups.entry(key).or_default().push(image);
        }

        // Pair each folder with its sidecar asset.
        let raw_expr = expr_with_kind(ResourceKind::Raw, &expr_exact_folder(&scope));
        let raw_assets = self
            .store
            .search(&raw_expr, &[], self.max_results)
            .await
            .map_err(|e| Error::Remote(e.to_string()))?;

        let mut sidecar_assets: HashMap<String, AssetRecord> = HashMap::new();
        for raw in raw_assets {
            let Some(folder) = raw.asset_folder.as_deref().or(raw.folder.as_deref()) else {
                continue;
            };
            let key = folder.rsplit('/').next().unwrap_or(folder).to_string();
            sidecar_assets.entry(key).or_insert(raw);
        }

        // Fetch every sidecar body concurrently; a failed branch leaves
        // that figure with defaults rather than failing the listing.
        let fetches: Vec<_> = groups
            .keys()
            .filter_map(|key| {
                sidecar_assets.get(key).map(|asset| {
                    let key = key.clone();
                    let url = asset.url.clone();
                    async move { (key, self.fetch_sidecar(&url).await) }
                })
            })
            .collect();

        let mut sidecars: HashMap<String, FigureSidecar> = HashMap::new();
        for (key, sidecar) in join_all(fetches).await {
            if let Some(sidecar) = sidecar {
                sidecars.insert(key, sidecar);
            }
        }

        let mut figures: Vec<FigureProfile> = Vec::with_capacity(groups.len());
        for (key, group) in groups {
            let Some(portrait) = primary_image(&group, &key) else {
                continue;
            };
            let sidecar = sidecars.remove(&key).unwrap_or_default();
            figures.push(build_profile(GroupKey::new(key), portrait.clone(), sidecar));
        }

        figures.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));

        tracing::info!(count = figures.len(), "Built figure listing");
        Ok(figures)
    }

    /// Resolve one figure by folder slug. Zero matching assets is a
    /// legitimate not-found, returned as `None` rather than an error.
    pub async fn get_figure(&self, slug: &str) -> Result<Option<FigureProfile>> {
        let mut visited = HashSet::new();
        visited.insert(slug.to_string());
        self.resolve_figure(slug.to_string(), visited, 0).await
    }

    fn resolve_figure(
        &self,
        slug: String,
        visited: HashSet<String>,
        depth: usize,
    ) -> BoxFuture<'_, Result<Option<FigureProfile>>> {
        Box::pin(async move {
            let folder = format!("{}/{}", self.base_folder, slug);
            let image_expr = expr_with_kind(ResourceKind::Image, &expr_exact_folder(&folder));
            let images = self
                .store
                .search(&image_expr, &SEARCH_FIELDS, SCOPED_MAX_RESULTS)
                .await
                .map_err(|e| Error::Remote(e.to_string()))?;

            if images.is_empty() {
                tracing::debug!(slug = %slug, "No figure image found");
                return Ok(None);
            }

            let portrait = primary_image(&images, &slug)
                .cloned()
                .unwrap_or_else(|| images[0].clone());

            let raw_expr = expr_with_kind(ResourceKind::Raw, &expr_exact_folder(&folder));
            let raw_assets = self
                .store
                .search(&raw_expr, &[], SCOPED_MAX_RESULTS)
                .await
                .map_err(|e| Error::Remote(e.to_string()))?;

            // Prefer the raw file named after the slug when the folder
            // holds several.
            let sidecar_asset = raw_assets
                .iter()
                .find(|raw| raw.public_id_filename().contains(&slug))
                .or_else(|| raw_assets.first());

            let sidecar = match sidecar_asset {
                Some(asset) => self.fetch_sidecar(&asset.url).await.unwrap_or_default(),
                None => {
                    tracing::warn!(slug = %slug, "No sidecar found, text fields default to empty");
                    FigureSidecar::default()
                }
            };

            let mut profile = build_profile(GroupKey::new(slug.clone()), portrait, sidecar);

            if depth < MAX_ASSOCIATION_DEPTH && !profile.associated_slugs.is_empty() {
                let slugs = profile.associated_slugs.clone();
                profile.associated = self.resolve_associations(&slugs, &visited, depth).await;
            }

            tracing::info!(slug = %slug, "Resolved figure");
            Ok(Some(profile))
        })
    }

    /// Resolve association slugs into summaries. A slug already in the
    /// visited set (self-reference or cycle) resolves to a stub without
    /// re-fetching. Individual failures drop that association only.
    async fn resolve_associations(
        &self,
        slugs: &[String],
        visited: &HashSet<String>,
        depth: usize,
    ) -> Vec<FigureSummary> {
        match self.fan_out {
            FanOut::Parallel => {
                let branches: Vec<_> = slugs
                    .iter()
                    .map(|slug| {
                        let slug = slug.clone();
                        let mut child_visited = visited.clone();
                        let already_seen = !child_visited.insert(slug.clone());
                        async move {
                            self.resolve_association_branch(slug, child_visited, already_seen, depth)
                                .await
                        }
                    })
                    .collect();
                join_all(branches).await.into_iter().flatten().collect()
            }
            FanOut::Sequential => {
                let mut visited = visited.clone();
                let mut summaries = Vec::new();
                for slug in slugs {
                    let already_seen = !visited.insert(slug.clone());
                    if let Some(summary) = self
                        .resolve_association_branch(slug.clone(), visited.clone(), already_seen, depth)
                        .await
                    {
                        summaries.push(summary);
                    }
                }
                summaries
            }
        }
    }

    async fn resolve_association_branch(
        &self,
        slug: String,
        visited: HashSet<String>,
        already_seen: bool,
        depth: usize,
    ) -> Option<FigureSummary> {
        if already_seen {
            tracing::debug!(slug = %slug, "Association already visited, returning stub");
            return Some(stub_summary(&slug));
        }
        match self.resolve_figure(slug.clone(), visited, depth + 1).await {
            Ok(Some(profile)) => Some(summarize(&profile)),
            Ok(None) => {
                tracing::warn!(slug = %slug, "Associated figure not found, skipping");
                None
            }
            Err(e) => {
                tracing::warn!(slug = %slug, error = %e, "Could not resolve associated figure, skipping");
                None
            }
        }
    }

    /// Fetch and parse one sidecar body; failures degrade to `None`
    async fn fetch_sidecar(&self, url: &str) -> Option<FigureSidecar> {
        match self.store.fetch_json_body(url).await {
            Ok(body) => match serde_json::from_value::<FigureSidecar>(body) {
                Ok(sidecar) => Some(sidecar),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Malformed sidecar, using defaults");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Failed to fetch sidecar, using defaults");
                None
            }
        }
    }
}

/// The figure's portrait is the first image named after its folder
/// (exactly or as a prefix), with the group's first image as fallback
fn primary_image<'a>(group: &'a [AssetRecord], key: &str) -> Option<&'a AssetRecord> {
    group
        .iter()
        .find(|image| {
            let stem = strip_extension(image.public_id_filename());
            stem == key || stem.starts_with(key)
        })
        .or_else(|| group.first())
}

fn build_profile(slug: GroupKey, portrait: AssetRecord, sidecar: FigureSidecar) -> FigureProfile {
    let position_hint = portrait.position_hint();
    FigureProfile {
        name: sidecar.name.unwrap_or_else(|| slug.to_string()),
        native_name: sidecar.native_name,
        nickname: sidecar.nickname,
        era: sidecar.era,
        category: sidecar.category,
        birthplace: sidecar.birthplace,
        biography: sidecar.biography,
        education: sidecar.education,
        sort_order: sidecar.sort_order.unwrap_or(0),
        associated_slugs: sidecar.associated_figures,
        associated: Vec::new(),
        position_hint,
        portrait,
        slug,
    }
}

/// Project a resolved profile down to its summary fields
fn summarize(profile: &FigureProfile) -> FigureSummary {
    FigureSummary {
        slug: profile.slug.clone(),
        name: profile.name.clone(),
        native_name: profile.native_name.clone(),
        era: profile.era.clone(),
        category: profile.category.clone(),
        birthplace: profile.birthplace.clone(),
        portrait_url: Some(profile.portrait.url.clone()),
        position_hint: profile.position_hint.clone(),
    }
}

/// Placeholder summary for a slug already on the resolution path
fn stub_summary(slug: &str) -> FigureSummary {
    FigureSummary {
        slug: GroupKey::new(slug),
        name: slug.to_string(),
        native_name: None,
        era: None,
        category: None,
        birthplace: None,
        portrait_url: None,
        position_hint: None,
    }
}
