//! Folder key resolution
//!
//! Derives the logical group key (one event, one figure) for a single
//! asset. The store reports folder placement through several inconsistent
//! fields, so resolution is an explicit ordered list of strategies, each a
//! pure function; the first strategy producing a key wins.

use crate::model::{AssetRecord, GroupKey};

/// One way of deriving a group key from an asset record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderKeyStrategy {
    /// Newer API field carrying the full folder path
    AssetFolderField,
    /// Older API folder field
    FolderField,
    /// Positional segment of the slash-separated public identifier
    PublicIdSegments,
}

/// Priority order: asset_folder beats folder beats public id inference
pub const STRATEGY_ORDER: [FolderKeyStrategy; 3] = [
    FolderKeyStrategy::AssetFolderField,
    FolderKeyStrategy::FolderField,
    FolderKeyStrategy::PublicIdSegments,
];

impl FolderKeyStrategy {
    /// Apply this strategy alone. `base` is the root collection prefix
    /// (e.g. "gallery"); an asset sitting directly under it has no key.
    pub fn apply(&self, asset: &AssetRecord, base: &str) -> Option<GroupKey> {
        match self {
            FolderKeyStrategy::AssetFolderField => {
                key_from_folder_path(asset.asset_folder.as_deref()?, base)
            }
            FolderKeyStrategy::FolderField => {
                key_from_folder_path(asset.folder.as_deref()?, base)
            }
            FolderKeyStrategy::PublicIdSegments => {
                let segments: Vec<&str> = asset.public_id.split('/').collect();
                if segments.len() >= 3 {
                    // base/<group>/<file...>: the segment directly under
                    // the base prefix is the group
                    Some(GroupKey::new(segments[1]))
                } else {
                    // base/<file>: standalone, ungrouped asset
                    None
                }
            }
        }
    }
}

/// Last segment of a folder path, unless the path is just the base prefix
fn key_from_folder_path(path: &str, base: &str) -> Option<GroupKey> {
    match path.rsplit_once('/') {
        Some((_, last)) if !last.is_empty() => Some(GroupKey::new(last)),
        Some(_) => None,
        None if !path.is_empty() && path != base => Some(GroupKey::new(path)),
        None => None,
    }
}

/// Derive the group key for an asset, trying each strategy in priority
/// order. Returns `None` for assets sitting directly under the base
/// prefix with no sub-grouping.
pub fn resolve_group_key(asset: &AssetRecord, base: &str) -> Option<GroupKey> {
    STRATEGY_ORDER
        .iter()
        .find_map(|strategy| strategy.apply(asset, base))
}
