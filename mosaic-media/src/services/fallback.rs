//! Dual-source fallback orchestration
//!
//! Each public operation prefers the media store (when enabled and
//! credentialed) and falls back to the relational store on any failure.
//! Sources are never merged: the first source that answers without
//! failing wins the whole call, and a constant placeholder steps in for
//! the operations that define one when even the fallback has nothing.

use crate::model::{
    AssetRecord, EventGalleryEntry, EventImageSet, FigureProfile, FigureSummary, GroupKey,
};
use crate::services::event_gallery::EventGalleryAggregator;
use crate::services::figures::FigureResolver;
use crate::services::store_client::{MediaStore, MediaStoreClient};
use crate::services::title::format_title;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use mosaic_common::config::MediaStoreConfig;
use mosaic_common::db::models::{EventRow, FigureRow, GalleryImageRow};
use mosaic_common::db::queries;
use mosaic_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::future::Future;
use std::sync::Arc;

/// Which source actually served a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Remote,
    Local,
    Default,
}

/// A result tagged with the source that produced it
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    pub source: Source,
    pub value: T,
}

/// Try the preferred source first; on any failure, log and fall through
/// to the secondary. Success (even an empty result) wins the call.
pub async fn first_success<T, P, S>(
    operation: &str,
    preferred: Option<P>,
    secondary: S,
) -> Result<Resolved<T>>
where
    P: Future<Output = Result<T>>,
    S: Future<Output = Result<T>>,
{
    if let Some(preferred) = preferred {
        match preferred.await {
            Ok(value) => {
                return Ok(Resolved {
                    source: Source::Remote,
                    value,
                })
            }
            Err(e) => tracing::warn!(
                operation,
                error = %e,
                "Preferred source failed, falling back to relational store"
            ),
        }
    } else {
        tracing::debug!(operation, "Preferred source disabled, using relational store");
    }

    Ok(Resolved {
        source: Source::Local,
        value: secondary.await?,
    })
}

/// Event row enriched with a gallery cover
#[derive(Debug, Clone, Serialize)]
pub struct EventWithCover {
    #[serde(flatten)]
    pub event: EventRow,
    pub cover_url: Option<String>,
}

/// Calendar projection of an event
#[derive(Debug, Clone, Serialize)]
pub struct CalendarEvent {
    pub id: i64,
    pub title: String,
    pub start: DateTime<Utc>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: String,
    pub cover_url: Option<String>,
}

/// Policy layer choosing which backing source answers each request
pub struct FallbackOrchestrator {
    db: SqlitePool,
    gallery: Option<EventGalleryAggregator>,
    figures: Option<FigureResolver>,
}

impl FallbackOrchestrator {
    /// Wire the orchestrator with an explicit store handle (or none).
    /// The per-section toggles decide which aggregators come up.
    pub fn new(
        db: SqlitePool,
        config: &MediaStoreConfig,
        store: Option<Arc<dyn MediaStore>>,
    ) -> Self {
        let gallery = match &store {
            Some(store) if config.gallery_enabled => {
                let mut aggregator = EventGalleryAggregator::new(
                    store.clone(),
                    &config.gallery_folder,
                    config.max_results,
                );
                if config.use_collection {
                    aggregator = aggregator.with_collection(&config.collection_name);
                }
                Some(aggregator)
            }
            _ => None,
        };

        let figures = match &store {
            Some(store) if config.figures_enabled => Some(FigureResolver::new(
                store.clone(),
                &config.figures_folder,
                config.max_results,
            )),
            _ => None,
        };

        Self { db, gallery, figures }
    }

    /// Construct from configuration, building the HTTP client when any
    /// section wants the media store. Missing credentials leave the
    /// store out entirely; every call then goes to the relational store.
    pub fn from_config(db: SqlitePool, config: &MediaStoreConfig) -> Self {
        let store: Option<Arc<dyn MediaStore>> =
            if config.gallery_active() || config.figures_active() {
                match MediaStoreClient::new(config) {
                    Ok(client) => Some(Arc::new(client)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Media store unavailable, relational store only");
                        None
                    }
                }
            } else {
                None
            };
        Self::new(db, config, store)
    }

    /// One thumbnail per event. Falls back to the relational gallery
    /// rows, and to a constant placeholder when even those are empty.
    pub async fn list_event_thumbnails(&self) -> Result<Resolved<Vec<EventGalleryEntry>>> {
        let preferred = self.gallery.as_ref().map(|g| g.list_event_thumbnails());
        let secondary = async {
            let rows = queries::gallery_images(&self.db).await?;
            Ok(rows
                .into_iter()
                .enumerate()
                .map(|(index, row)| gallery_row_to_entry(row, index + 1))
                .collect::<Vec<_>>())
        };

        let resolved = first_success("list_event_thumbnails", preferred, secondary).await?;
        if resolved.source == Source::Local && resolved.value.is_empty() {
            return Ok(Resolved {
                source: Source::Default,
                value: placeholder_gallery(),
            });
        }
        Ok(resolved)
    }

    /// All images for one named event. The relational store keeps no
    /// per-event folder grouping, so its answer is always the empty set.
    pub async fn list_event_images(&self, key: &GroupKey) -> Result<Resolved<EventImageSet>> {
        let preferred = self.gallery.as_ref().map(|g| g.list_event_images(key));
        let secondary = async {
            tracing::debug!(key = %key, "Relational store has no per-event grouping, returning empty set");
            Ok(EventImageSet {
                key: key.clone(),
                title: format_title(key.as_str()),
                images: Vec::new(),
            })
        };
        first_success("list_event_images", preferred, secondary).await
    }

    /// All figure profiles
    pub async fn list_figures(&self) -> Result<Resolved<Vec<FigureProfile>>> {
        let preferred = self.figures.as_ref().map(|f| f.list_figures());
        let secondary = async {
            let rows = queries::all_figures(&self.db).await?;
            Ok(rows
                .into_iter()
                .map(|row| figure_row_to_profile(row, Vec::new()))
                .collect::<Vec<_>>())
        };
        first_success("list_figures", preferred, secondary).await
    }

    /// One figure by slug. Zero matches is `None`, never an error.
    pub async fn get_figure(&self, slug: &str) -> Result<Resolved<Option<FigureProfile>>> {
        let preferred = self.figures.as_ref().map(|f| f.get_figure(slug));
        let secondary = async {
            let Some(row) = queries::figure_by_slug(&self.db, slug).await? else {
                return Ok(None);
            };
            let associated = queries::associated_figures(&self.db, slug)
                .await?
                .iter()
                .map(figure_row_to_summary)
                .collect();
            Ok(Some(figure_row_to_profile(row, associated)))
        };
        first_success("get_figure", preferred, secondary).await
    }

    /// Upcoming events, each enriched with a gallery cover when the
    /// media store is available
    pub async fn upcoming_events(&self, limit: i64) -> Result<Vec<EventWithCover>> {
        let rows = queries::upcoming_events(&self.db, limit).await?;
        Ok(self.attach_covers(rows).await)
    }

    /// Past events, newest first, enriched the same way
    pub async fn past_events(&self, limit: i64) -> Result<Vec<EventWithCover>> {
        let rows = queries::past_events(&self.db, limit).await?;
        Ok(self.attach_covers(rows).await)
    }

    /// Single event by id
    pub async fn event_by_id(&self, id: i64) -> Result<Option<EventWithCover>> {
        let Some(row) = queries::event_by_id(&self.db, id).await? else {
            return Ok(None);
        };
        let cover_url = self.event_cover(&row.title).await;
        Ok(Some(EventWithCover {
            event: row,
            cover_url,
        }))
    }

    /// All events (optionally date-bounded) in calendar projection
    pub async fn calendar_events(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<CalendarEvent>> {
        let rows = queries::calendar_events(&self.db, start, end).await?;
        let enriched = self.attach_covers(rows).await;
        Ok(enriched
            .into_iter()
            .map(|entry| CalendarEvent {
                url: format!("/events/{}", entry.event.id),
                id: entry.event.id,
                title: entry.event.title,
                start: entry.event.event_date,
                description: entry.event.description,
                location: entry.event.location,
                cover_url: entry.cover_url,
            })
            .collect())
    }

    /// Cover lookups fan out in parallel; a failed branch leaves that one
    /// event uncovered instead of failing the listing.
    async fn attach_covers(&self, rows: Vec<EventRow>) -> Vec<EventWithCover> {
        let covers = join_all(rows.iter().map(|row| self.event_cover(&row.title))).await;
        rows.into_iter()
            .zip(covers)
            .map(|(event, cover_url)| EventWithCover { event, cover_url })
            .collect()
    }

    async fn event_cover(&self, title: &str) -> Option<String> {
        let gallery = self.gallery.as_ref()?;
        let key = GroupKey::new(title_to_folder(title));
        match gallery.list_event_images(&key).await {
            Ok(set) => set
                .images
                .iter()
                .find(|image| image.is_thumbnail)
                .or_else(|| set.images.first())
                .map(|image| image.asset.url.clone()),
            Err(e) => {
                tracing::warn!(title = %title, error = %e, "Cover lookup failed, leaving event uncovered");
                None
            }
        }
    }
}

/// Event title to gallery folder slug: whitespace runs become hyphens,
/// case preserved
fn title_to_folder(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Constant "no data" gallery placeholder
fn placeholder_gallery() -> Vec<EventGalleryEntry> {
    vec![EventGalleryEntry {
        key: GroupKey::new("placeholder"),
        title: "Gallery".to_string(),
        description: "No gallery content available".to_string(),
        cover: asset_from_url(
            "placeholder",
            "placeholder",
            "/assets/images/gallery/placeholder.jpg",
        ),
        position: 1,
    }]
}

/// Minimal asset record synthesized from a materialized fallback URL
fn asset_from_url(id: &str, public_id: &str, url: &str) -> AssetRecord {
    AssetRecord {
        id: id.to_string(),
        public_id: public_id.to_string(),
        url: url.to_string(),
        folder: None,
        asset_folder: None,
        filename: None,
        display_name: None,
        context: serde_json::Value::Null,
        metadata: serde_json::Value::Null,
        created_at: None,
        width: None,
        height: None,
        format: None,
        bytes: None,
    }
}

fn gallery_row_to_entry(row: GalleryImageRow, position: usize) -> EventGalleryEntry {
    let title = row
        .event_title
        .clone()
        .unwrap_or_else(|| format_title(&row.image_slug));
    EventGalleryEntry {
        key: GroupKey::new(row.image_slug.clone()),
        title,
        description: row.description.unwrap_or_default(),
        cover: asset_from_url(&row.id.to_string(), &row.image_slug, &row.image_url),
        position,
    }
}

fn figure_row_to_profile(row: FigureRow, associated: Vec<FigureSummary>) -> FigureProfile {
    let portrait = asset_from_url(&row.id, &row.image_slug, &row.image_url);
    FigureProfile {
        slug: GroupKey::new(row.id),
        name: row.name,
        native_name: row.native_name,
        nickname: row.nickname,
        era: row.era,
        category: row.category,
        birthplace: row.birthplace,
        biography: row.biography,
        education: row.education,
        portrait,
        position_hint: None,
        sort_order: row.sort_order,
        associated_slugs: associated.iter().map(|s| s.slug.to_string()).collect(),
        associated,
    }
}

fn figure_row_to_summary(row: &FigureRow) -> FigureSummary {
    FigureSummary {
        slug: GroupKey::new(row.id.as_str()),
        name: row.name.clone(),
        native_name: row.native_name.clone(),
        era: row.era.clone(),
        category: row.category.clone(),
        birthplace: row.birthplace.clone(),
        portrait_url: Some(row.image_url.clone()),
        position_hint: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_to_folder_hyphenates_whitespace() {
        assert_eq!(title_to_folder("First Executive Meeting"), "First-Executive-Meeting");
        assert_eq!(title_to_folder("  spaced   out  "), "spaced-out");
    }

    #[test]
    fn placeholder_is_constant() {
        let a = placeholder_gallery();
        let b = placeholder_gallery();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].cover.url, b[0].cover.url);
        assert_eq!(a[0].cover.url, "/assets/images/gallery/placeholder.jpg");
    }
}
