//! Domain entities reconstructed from the flat media store
//!
//! Everything here is built fresh per request from remote query responses
//! (or synthesized from fallback rows) and discarded after serialization;
//! nothing is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix used for synthetic per-index pseudo-group keys
const SYNTHETIC_KEY_PREFIX: &str = "image-";

/// One raw asset as returned by the media store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Stable identifier (asset id when present, else the public id)
    pub id: String,
    /// Path-like, slash-separated public identifier
    pub public_id: String,
    /// Direct delivery URL
    pub url: String,
    /// Folder path as reported by the older API field
    pub folder: Option<String>,
    /// Folder path as reported by the newer API field
    pub asset_folder: Option<String>,
    /// Filename field, when the store reports one
    pub filename: Option<String>,
    /// Display name field, sometimes used instead of filename
    pub display_name: Option<String>,
    /// Free-form context map (captions, positioning hints)
    #[serde(default)]
    pub context: serde_json::Value,
    /// Free-form structured metadata
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: Option<DateTime<Utc>>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: Option<String>,
    pub bytes: Option<u64>,
}

impl AssetRecord {
    /// Final `/`-segment of the public identifier
    pub fn public_id_filename(&self) -> &str {
        self.public_id.rsplit('/').next().unwrap_or(&self.public_id)
    }

    /// Whether this asset is a designated thumbnail: filename (extension
    /// stripped, lower-cased) equals exactly "thumbnail". The filename
    /// field is checked first, then display name, then the public id.
    pub fn is_thumbnail(&self) -> bool {
        if let Some(name) = &self.filename {
            if strip_extension(name).eq_ignore_ascii_case("thumbnail") {
                return true;
            }
        }
        if let Some(name) = &self.display_name {
            if strip_extension(name).eq_ignore_ascii_case("thumbnail") {
                return true;
            }
        }
        strip_extension(self.public_id_filename()).eq_ignore_ascii_case("thumbnail")
    }

    /// Caption/description, checked across the fields stores use:
    /// context custom caption, context custom description, context alt,
    /// then metadata caption.
    pub fn caption(&self) -> Option<String> {
        let custom = self.context.get("custom");
        custom
            .and_then(|c| c.get("caption"))
            .or_else(|| custom.and_then(|c| c.get("description")))
            .or_else(|| self.context.get("alt"))
            .or_else(|| self.metadata.get("caption"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    /// Per-image positioning hint (`object_position`), from context custom
    /// fields or structured metadata
    pub fn position_hint(&self) -> Option<String> {
        self.context
            .get("custom")
            .and_then(|c| c.get("object_position"))
            .or_else(|| self.metadata.get("object_position"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}

/// Strip a trailing `.ext` from a filename, if any
pub(crate) fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) if pos > 0 => &name[..pos],
        _ => name,
    }
}

/// Derived identifier tying multiple assets together into one logical
/// entity (one event, one figure). Never stored; recomputed
/// deterministically from each asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(String);

impl GroupKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Per-index placeholder key for an asset that belongs to no folder
    pub fn synthetic(index: usize) -> Self {
        Self(format!("{}{}", SYNTHETIC_KEY_PREFIX, index + 1))
    }

    /// Synthetic keys are non-expandable: there is no folder behind them
    pub fn is_synthetic(&self) -> bool {
        self.0.starts_with(SYNTHETIC_KEY_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// One entry in the event gallery listing: a group key, its formatted
/// title and the representative asset chosen for it
#[derive(Debug, Clone, Serialize)]
pub struct EventGalleryEntry {
    pub key: GroupKey,
    pub title: String,
    pub description: String,
    pub cover: AssetRecord,
    /// Ordinal position in the final listing (1-based)
    pub position: usize,
}

/// One asset within an event, tagged for sort tie-break only
#[derive(Debug, Clone, Serialize)]
pub struct EventImage {
    pub asset: AssetRecord,
    pub is_thumbnail: bool,
}

/// All images belonging to one event
#[derive(Debug, Clone, Serialize)]
pub struct EventImageSet {
    pub key: GroupKey,
    pub title: String,
    pub images: Vec<EventImage>,
}

/// A biographical figure profile paired from an image and its sidecar
#[derive(Debug, Clone, Serialize)]
pub struct FigureProfile {
    /// Folder slug, doubles as the figure's identifier
    pub slug: GroupKey,
    pub name: String,
    pub native_name: Option<String>,
    pub nickname: Option<String>,
    pub era: Option<String>,
    pub category: Option<String>,
    pub birthplace: Option<String>,
    pub biography: Option<String>,
    pub education: Option<String>,
    pub portrait: AssetRecord,
    pub position_hint: Option<String>,
    pub sort_order: i64,
    /// Raw associated-figure slugs from the sidecar, not yet resolved
    pub associated_slugs: Vec<String>,
    /// Resolved associated-figure summaries (never nested further)
    pub associated: Vec<FigureSummary>,
}

/// Summary projection of an associated figure: no biography, no education,
/// no nested associations
#[derive(Debug, Clone, Serialize)]
pub struct FigureSummary {
    pub slug: GroupKey,
    pub name: String,
    pub native_name: Option<String>,
    pub era: Option<String>,
    pub category: Option<String>,
    pub birthplace: Option<String>,
    pub portrait_url: Option<String>,
    pub position_hint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(public_id: &str) -> AssetRecord {
        AssetRecord {
            id: public_id.to_string(),
            public_id: public_id.to_string(),
            url: format!("https://media.example.com/{}", public_id),
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

    #[test]
    fn thumbnail_detection_from_public_id() {
        assert!(asset("gallery/first-meeting/thumbnail.jpg").is_thumbnail());
        assert!(asset("gallery/first-meeting/Thumbnail.JPG").is_thumbnail());
        assert!(!asset("gallery/first-meeting/img1.jpg").is_thumbnail());
        // "thumbnail" must match exactly, not as a prefix
        assert!(!asset("gallery/first-meeting/thumbnail-old.jpg").is_thumbnail());
    }

    #[test]
    fn thumbnail_detection_prefers_filename_field() {
        let mut a = asset("gallery/first-meeting/xyz123");
        a.filename = Some("thumbnail.jpg".to_string());
        assert!(a.is_thumbnail());
    }

    #[test]
    fn caption_priority_chain() {
        let mut a = asset("gallery/x/img");
        a.metadata = serde_json::json!({"caption": "from metadata"});
        assert_eq!(a.caption().as_deref(), Some("from metadata"));

        a.context = serde_json::json!({"alt": "alt text"});
        assert_eq!(a.caption().as_deref(), Some("alt text"));

        a.context = serde_json::json!({"alt": "alt text", "custom": {"caption": "the caption"}});
        assert_eq!(a.caption().as_deref(), Some("the caption"));
    }

    #[test]
    fn synthetic_keys() {
        let key = GroupKey::synthetic(0);
        assert_eq!(key.as_str(), "image-1");
        assert!(key.is_synthetic());
        assert!(!GroupKey::new("first-meeting").is_synthetic());
    }

    #[test]
    fn strip_extension_handles_dotless_names() {
        assert_eq!(strip_extension("thumbnail.jpg"), "thumbnail");
        assert_eq!(strip_extension("thumbnail"), "thumbnail");
        assert_eq!(strip_extension(".hidden"), ".hidden");
    }
}
