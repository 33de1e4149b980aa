//! Read-only fallback queries
//!
//! Every query materializes image URLs by concatenating a static base path
//! with the stored slug, matching the shape the media store path returns.

use crate::db::models::{EventRow, FigureRow, GalleryImageRow};
use crate::Result;
use sqlx::SqlitePool;

const EVENT_IMAGE_BASE: &str = "/assets/images/events/";
const GALLERY_IMAGE_BASE: &str = "/assets/images/gallery/";
const FIGURE_IMAGE_BASE: &str = "/assets/images/notable-figures/";

/// Upcoming events, soonest first
pub async fn upcoming_events(pool: &SqlitePool, limit: i64) -> Result<Vec<EventRow>> {
    let rows = sqlx::query_as::<_, EventRow>(
        r#"
        SELECT id, title, description, event_date, location, sort_order
        FROM events
        WHERE datetime(event_date) >= datetime('now')
        ORDER BY datetime(event_date) ASC, sort_order ASC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Past events, most recent first
pub async fn past_events(pool: &SqlitePool, limit: i64) -> Result<Vec<EventRow>> {
    let rows = sqlx::query_as::<_, EventRow>(
        r#"
        SELECT id, title, description, event_date, location, sort_order
        FROM events
        WHERE datetime(event_date) < datetime('now')
        ORDER BY datetime(event_date) DESC, sort_order ASC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Single event by id
pub async fn event_by_id(pool: &SqlitePool, id: i64) -> Result<Option<EventRow>> {
    let row = sqlx::query_as::<_, EventRow>(
        r#"
        SELECT id, title, description, event_date, location, sort_order
        FROM events
        WHERE id = ?
        LIMIT 1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// All events, optionally bounded by an inclusive date range
pub async fn calendar_events(
    pool: &SqlitePool,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Vec<EventRow>> {
    let mut query = String::from(
        "SELECT id, title, description, event_date, location, sort_order FROM events WHERE 1=1",
    );
    if start.is_some() {
        query.push_str(" AND datetime(event_date) >= datetime(?)");
    }
    if end.is_some() {
        query.push_str(" AND datetime(event_date) <= datetime(?)");
    }
    query.push_str(" ORDER BY datetime(event_date) ASC, sort_order ASC");

    let mut q = sqlx::query_as::<_, EventRow>(&query);
    if let Some(start) = start {
        q = q.bind(start);
    }
    if let Some(end) = end {
        q = q.bind(end);
    }
    Ok(q.fetch_all(pool).await?)
}

/// Gallery images attached to an event
async fn event_linked_images(pool: &SqlitePool) -> Result<Vec<GalleryImageRow>> {
    let rows = sqlx::query_as::<_, GalleryImageRow>(&format!(
        r#"
        SELECT
            ei.id, ei.image_slug, ei.description, ei.sort_order,
            e.title AS event_title,
            '{EVENT_IMAGE_BASE}' || ei.image_slug || '.jpg' AS image_url
        FROM event_images ei
        LEFT JOIN events e ON ei.event_id = e.id
        ORDER BY ei.sort_order ASC, datetime(e.event_date) DESC
        "#,
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Standalone gallery images (no event link)
async fn standalone_gallery_images(pool: &SqlitePool) -> Result<Vec<GalleryImageRow>> {
    let rows = sqlx::query_as::<_, GalleryImageRow>(&format!(
        r#"
        SELECT
            id, image_slug, description, sort_order,
            NULL AS event_title,
            '{GALLERY_IMAGE_BASE}' || image_slug || '.jpg' AS image_url
        FROM gallery
        ORDER BY sort_order ASC
        "#,
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Combined gallery listing: event-linked rows plus standalone rows,
/// merged and ordered by sort_order
pub async fn gallery_images(pool: &SqlitePool) -> Result<Vec<GalleryImageRow>> {
    let (mut linked, standalone) =
        (event_linked_images(pool).await?, standalone_gallery_images(pool).await?);
    linked.extend(standalone);
    linked.sort_by_key(|row| row.sort_order);
    Ok(linked)
}

const FIGURE_COLUMNS: &str = "id, name, native_name, nickname, era, category, birthplace, \
     biography, education, image_slug, sort_order";

/// All figures ordered by explicit sort order
pub async fn all_figures(pool: &SqlitePool) -> Result<Vec<FigureRow>> {
    let rows = sqlx::query_as::<_, FigureRow>(&format!(
        r#"
        SELECT {FIGURE_COLUMNS},
            '{FIGURE_IMAGE_BASE}' || image_slug || '.jpg' AS image_url
        FROM figures
        ORDER BY sort_order ASC, name ASC
        "#,
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Single figure by slug
pub async fn figure_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<FigureRow>> {
    let row = sqlx::query_as::<_, FigureRow>(&format!(
        r#"
        SELECT {FIGURE_COLUMNS},
            '{FIGURE_IMAGE_BASE}' || image_slug || '.jpg' AS image_url
        FROM figures
        WHERE id = ?
        LIMIT 1
        "#,
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Figures associated with the given figure, alphabetical by name
pub async fn associated_figures(pool: &SqlitePool, slug: &str) -> Result<Vec<FigureRow>> {
    let rows = sqlx::query_as::<_, FigureRow>(&format!(
        r#"
        SELECT f.id, f.name, f.native_name, f.nickname, f.era, f.category,
            f.birthplace, f.biography, f.education, f.image_slug, f.sort_order,
            '{FIGURE_IMAGE_BASE}' || f.image_slug || '.jpg' AS image_url
        FROM figures f
        INNER JOIN figure_associations fa ON f.id = fa.associated_figure_id
        WHERE fa.figure_id = ?
        ORDER BY f.name ASC
        "#,
    ))
    .bind(slug)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
