//! # Mosaic Media Engine
//!
//! Asset aggregation and fallback resolution for the Mosaic content
//! backend. Reconstructs hierarchical domain entities (event galleries,
//! notable figure profiles) out of a flat, unordered media store listing,
//! and arbitrates per call between the media store and the relational
//! fallback.
//!
//! Read-only and best-effort: results are built fresh per request, never
//! cached, and the two sources are never merged within one call.

pub mod model;
pub mod services;

pub use model::{
    AssetRecord, EventGalleryEntry, EventImage, EventImageSet, FigureProfile, FigureSummary,
    GroupKey,
};
pub use services::event_gallery::EventGalleryAggregator;
pub use services::fallback::{
    first_success, CalendarEvent, EventWithCover, FallbackOrchestrator, Resolved, Source,
};
pub use services::figures::{FanOut, FigureResolver};
pub use services::folder_key::{resolve_group_key, FolderKeyStrategy};
pub use services::store_client::{MediaStore, MediaStoreClient, StoreError};
pub use services::thumbnail::select_thumbnail;
pub use services::title::format_title;
