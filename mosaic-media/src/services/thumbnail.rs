//! Representative-image selection for one asset group

use crate::model::AssetRecord;
use chrono::{DateTime, Utc};

/// Pick the representative asset for a group.
///
/// A designated thumbnail (filename exactly "thumbnail") wins immediately;
/// with several designated thumbnails the first one encountered is taken.
/// Otherwise the newest asset by creation timestamp wins. Empty input
/// yields no selection.
pub fn select_thumbnail(assets: &[AssetRecord]) -> Option<&AssetRecord> {
    if let Some(designated) = assets.iter().find(|a| a.is_thumbnail()) {
        return Some(designated);
    }
    assets.iter().max_by_key(|a| created_or_epoch(a))
}

/// Missing timestamps sort oldest
fn created_or_epoch(asset: &AssetRecord) -> DateTime<Utc> {
    asset.created_at.unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn asset(public_id: &str, created_secs: Option<i64>) -> AssetRecord {
        AssetRecord {
            id: public_id.to_string(),
            public_id: public_id.to_string(),
            url: String::new(),
            folder: None,
            asset_folder: None,
            filename: None,
            display_name: None,
            context: serde_json::Value::Null,
            metadata: serde_json::Value::Null,
            created_at: created_secs.map(|s| Utc.timestamp_opt(s, 0).unwrap()),
            width: None,
            height: None,
            format: None,
            bytes: None,
        }
    }

    #[test]
    fn designated_thumbnail_wins_regardless_of_age() {
        let group = vec![
            asset("gallery/e/a.jpg", Some(100)),
            asset("gallery/e/thumbnail.jpg", Some(0)),
            asset("gallery/e/b.jpg", Some(200)),
        ];
        let selected = select_thumbnail(&group).unwrap();
        assert_eq!(selected.public_id, "gallery/e/thumbnail.jpg");
    }

    #[test]
    fn newest_wins_without_designated_thumbnail() {
        let group = vec![
            asset("gallery/e/a.jpg", Some(100)),
            asset("gallery/e/b.jpg", Some(300)),
            asset("gallery/e/c.jpg", Some(200)),
        ];
        let selected = select_thumbnail(&group).unwrap();
        assert_eq!(selected.public_id, "gallery/e/b.jpg");
    }

    #[test]
    fn missing_timestamps_lose_to_dated_assets() {
        let group = vec![asset("gallery/e/a.jpg", None), asset("gallery/e/b.jpg", Some(1))];
        let selected = select_thumbnail(&group).unwrap();
        assert_eq!(selected.public_id, "gallery/e/b.jpg");
    }

    #[test]
    fn empty_group_selects_nothing() {
        assert!(select_thumbnail(&[]).is_none());
    }

    #[test]
    fn exactly_one_of_multiple_thumbnails() {
        let group = vec![
            asset("gallery/e/thumbnail.jpg", Some(0)),
            asset("gallery/e/sub/thumbnail.png", Some(5)),
        ];
        assert!(select_thumbnail(&group).is_some());
    }
}
