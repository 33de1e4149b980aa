//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row from the events table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub location: Option<String>,
    pub sort_order: i64,
}

/// One gallery image row, event-linked or standalone
///
/// `image_url` is materialized at query time from a static base path, so
/// consumers see the same shape the media store path produces.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GalleryImageRow {
    pub id: i64,
    pub image_slug: String,
    pub description: Option<String>,
    pub sort_order: i64,
    pub event_title: Option<String>,
    pub image_url: String,
}

/// One row from the figures table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FigureRow {
    pub id: String,
    pub name: String,
    pub native_name: Option<String>,
    pub nickname: Option<String>,
    pub era: Option<String>,
    pub category: Option<String>,
    pub birthplace: Option<String>,
    pub biography: Option<String>,
    pub education: Option<String>,
    pub image_slug: String,
    pub sort_order: i64,
    pub image_url: String,
}
