//! Figure resolution: image/sidecar pairing, associations, cycle guards

mod common;

use common::{foldered_asset, FakeStore};
use mosaic_media::{FanOut, FigureResolver, GroupKey};
use serde_json::json;
use std::sync::Arc;

fn resolver(store: FakeStore) -> FigureResolver {
    FigureResolver::new(Arc::new(store), "notable-figures", 500)
}

/// One figure folder: a portrait image, a JSON sidecar, and the sidecar
/// body registered under the raw asset's delivery URL.
fn add_figure(store: &mut FakeStore, slug: &str, sidecar: serde_json::Value) {
    let folder = format!("notable-figures/{}", slug);
    store
        .images
        .push(foldered_asset(&format!("{}/{}.jpg", folder, slug), &folder, 100));
    let raw = foldered_asset(&format!("{}/{}.json", folder, slug), &folder, 100);
    store.sidecar_bodies.insert(raw.url.clone(), sidecar);
    store.raws.push(raw);
}

#[tokio::test]
async fn listing_sorted_by_sort_order_then_name() {
    let mut store = FakeStore::default();
    add_figure(&mut store, "zara", json!({"name": "Aaa Zara", "sort_order": 2}));
    add_figure(&mut store, "mir", json!({"name": "Mir Jaladet", "sort_order": 1}));
    add_figure(&mut store, "bey", json!({"name": "Bedirxan Bey", "sort_order": 2}));

    let figures = resolver(store).list_figures().await.unwrap();
    let names: Vec<&str> = figures.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["Mir Jaladet", "Aaa Zara", "Bedirxan Bey"]);
}

#[tokio::test]
async fn listing_leaves_associations_unresolved() {
    let mut store = FakeStore::default();
    add_figure(
        &mut store,
        "ahmad-khani",
        json!({"name": "Ahmad Khani", "associated_figures": ["mir"]}),
    );
    add_figure(&mut store, "mir", json!({"name": "Mir Jaladet"}));

    let figures = resolver(store).list_figures().await.unwrap();
    let khani = figures.iter().find(|f| f.slug.as_str() == "ahmad-khani").unwrap();
    assert_eq!(khani.associated_slugs, ["mir"]);
    assert!(khani.associated.is_empty());
}

#[tokio::test]
async fn missing_sidecar_falls_back_to_defaults() {
    let mut store = FakeStore::default();
    let folder = "notable-figures/unknown-poet";
    store
        .images
        .push(foldered_asset("notable-figures/unknown-poet/unknown-poet.jpg", folder, 100));

    let figures = resolver(store).list_figures().await.unwrap();
    assert_eq!(figures.len(), 1);
    assert_eq!(figures[0].name, "unknown-poet");
    assert_eq!(figures[0].sort_order, 0);
    assert!(figures[0].biography.is_none());
}

#[tokio::test]
async fn malformed_sidecar_falls_back_to_defaults() {
    let mut store = FakeStore::default();
    add_figure(&mut store, "ahmad-khani", json!(["not", "an", "object"]));

    let profile = resolver(store).get_figure("ahmad-khani").await.unwrap().unwrap();
    assert_eq!(profile.name, "ahmad-khani");
    assert!(profile.era.is_none());
}

#[tokio::test]
async fn portrait_prefers_image_named_after_slug() {
    let mut store = FakeStore::default();
    let folder = "notable-figures/ahmad-khani";
    store
        .images
        .push(foldered_asset("notable-figures/ahmad-khani/group-photo.jpg", folder, 100));
    store
        .images
        .push(foldered_asset("notable-figures/ahmad-khani/ahmad-khani.jpg", folder, 50));

    let profile = resolver(store).get_figure("ahmad-khani").await.unwrap().unwrap();
    assert_eq!(profile.portrait.public_id, "notable-figures/ahmad-khani/ahmad-khani.jpg");
}

#[tokio::test]
async fn get_figure_resolves_associations_to_summaries() {
    let mut store = FakeStore::default();
    add_figure(
        &mut store,
        "ahmad-khani",
        json!({
            "name": "Ahmad Khani",
            "biography": "Poet and philosopher.",
            "associated_figures": ["mir", "bey"]
        }),
    );
    add_figure(&mut store, "mir", json!({"name": "Mir Jaladet", "era": "20th century"}));
    add_figure(&mut store, "bey", json!({"name": "Bedirxan Bey"}));

    let profile = resolver(store).get_figure("ahmad-khani").await.unwrap().unwrap();
    assert_eq!(profile.name, "Ahmad Khani");
    assert_eq!(profile.associated.len(), 2);

    let mir = profile.associated.iter().find(|s| s.slug.as_str() == "mir").unwrap();
    assert_eq!(mir.name, "Mir Jaladet");
    assert_eq!(mir.era.as_deref(), Some("20th century"));
    assert!(mir.portrait_url.is_some());
}

#[tokio::test]
async fn self_reference_resolves_to_stub_without_recursing() {
    let mut store = FakeStore::default();
    add_figure(
        &mut store,
        "ahmad-khani",
        json!({"name": "Ahmad Khani", "associated_figures": ["ahmad-khani"]}),
    );

    let profile = resolver(store).get_figure("ahmad-khani").await.unwrap().unwrap();
    assert_eq!(profile.associated.len(), 1);
    let stub = &profile.associated[0];
    assert_eq!(stub.slug, GroupKey::new("ahmad-khani"));
    assert_eq!(stub.name, "ahmad-khani");
    assert!(stub.portrait_url.is_none());
}

#[tokio::test]
async fn mutual_references_stay_bounded() {
    let mut store = FakeStore::default();
    add_figure(&mut store, "a", json!({"name": "A", "associated_figures": ["b"]}));
    add_figure(&mut store, "b", json!({"name": "B", "associated_figures": ["a"]}));

    let profile = resolver(store).get_figure("a").await.unwrap().unwrap();
    assert_eq!(profile.associated.len(), 1);
    assert_eq!(profile.associated[0].name, "B");
}

#[tokio::test]
async fn unresolvable_association_is_skipped() {
    let mut store = FakeStore::default();
    add_figure(
        &mut store,
        "ahmad-khani",
        json!({"name": "Ahmad Khani", "associated_figures": ["no-such-figure", "mir"]}),
    );
    add_figure(&mut store, "mir", json!({"name": "Mir Jaladet"}));

    let profile = resolver(store).get_figure("ahmad-khani").await.unwrap().unwrap();
    assert_eq!(profile.associated.len(), 1);
    assert_eq!(profile.associated[0].name, "Mir Jaladet");
}

#[tokio::test]
async fn sequential_fan_out_dedupes_repeated_slugs() {
    let mut store = FakeStore::default();
    add_figure(
        &mut store,
        "ahmad-khani",
        json!({"name": "Ahmad Khani", "associated_figures": ["mir", "mir"]}),
    );
    add_figure(&mut store, "mir", json!({"name": "Mir Jaladet"}));

    let resolver = resolver(store).with_fan_out(FanOut::Sequential);
    let profile = resolver.get_figure("ahmad-khani").await.unwrap().unwrap();
    assert_eq!(profile.associated.len(), 2);
    // First occurrence fully resolved, repeat collapses to a stub.
    assert_eq!(profile.associated[0].name, "Mir Jaladet");
    assert_eq!(profile.associated[1].name, "mir");
}

#[tokio::test]
async fn unknown_slug_is_not_found_not_an_error() {
    let store = FakeStore::default();
    let result = resolver(store).get_figure("nobody").await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn search_failure_propagates() {
    let store = FakeStore {
        fail_search: true,
        ..Default::default()
    };
    assert!(resolver(store).get_figure("ahmad-khani").await.is_err());
}
