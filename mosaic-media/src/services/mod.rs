//! Engine services
//!
//! Leaves first: the store client and the pure helpers (folder key, title,
//! thumbnail), then the aggregators built on them, then the fallback
//! orchestrator wrapping everything with the relational alternative.

pub mod event_gallery;
pub mod fallback;
pub mod figures;
pub mod folder_key;
pub mod store_client;
pub mod thumbnail;
pub mod title;
