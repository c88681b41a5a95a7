//! Context built from configuration, feed files and a JSON roster

use std::fs;
use std::path::Path;
use tempfile::tempdir;
use zipcover_config::ZipcoverConfig;
use zipcover_services::{CoverageContext, EntityStore, JsonFileEntityStore};
use zipcover_structures::{BoundingBox, EntityId};

fn write_feed(path: &Path) {
    fs::write(
        path,
        r#"{
          "type": "FeatureCollection",
          "features": [
            {"type": "Feature",
             "properties": {"zip": "60452", "city": "Oak Forest", "STATE": "IL"},
             "geometry": {"type": "Polygon", "coordinates": [[[-87.8,41.58],[-87.74,41.58],[-87.74,41.62],[-87.8,41.62],[-87.8,41.58]]]}},
            {"type": "Feature",
             "properties": {"ZIP_CODE": 60453, "PO_NAME": "Oak Lawn", "state": "IL"},
             "geometry": {"type": "Polygon", "coordinates": [[[-87.74,41.58],[-87.68,41.58],[-87.68,41.62],[-87.74,41.62],[-87.74,41.58]]]}},
            {"type": "Feature",
             "properties": {"zip": "90210", "city": "Beverly Hills", "STATE": "CA"},
             "geometry": {"type": "Polygon", "coordinates": [[[-118.43,34.07],[-118.38,34.07],[-118.38,34.11],[-118.43,34.11],[-118.43,34.07]]]}}
          ]
        }"#,
    )
    .unwrap();
}

#[test]
fn test_context_from_config_with_missing_feed() {
    let dir = tempdir().unwrap();
    let feed = dir.path().join("zips.geojson");
    write_feed(&feed);

    let mut config = ZipcoverConfig::default();
    config.catalog.feeds = vec![feed, dir.path().join("absent.geojson")];
    config.entities.store_path = Some(dir.path().join("techs.json"));

    let ctx = CoverageContext::from_config(&config).unwrap();
    assert_eq!(ctx.catalog().len(), 3);

    let view = ctx.select_rectangle(&BoundingBox::from_wsen(-87.79, 41.59, -87.70, 41.60).unwrap());
    assert_eq!(view.selection.codes, vec!["60452", "60453"]);
    assert_eq!(view.selection.summary(), "Found 2 ZIPs.");
    assert_eq!(view.plan.display_lines[1], "60453 - Oak Lawn (IL)");
    assert!(view.union.geometry.is_some());
}

#[test]
fn test_roster_edits_persist() {
    let dir = tempdir().unwrap();
    let feed = dir.path().join("zips.geojson");
    write_feed(&feed);
    let roster_path = dir.path().join("techs.json");

    let mut config = ZipcoverConfig::default();
    config.catalog.feeds = vec![feed];
    config.entities.store_path = Some(roster_path.clone());

    let ctx = CoverageContext::from_config(&config).unwrap();
    // seed roster until something is saved
    assert_eq!(ctx.entities().len(), 5);

    let added = ctx.add_entity("Riley", "", "60452 90210").unwrap();
    let stored = JsonFileEntityStore::new(&roster_path).load().unwrap();
    assert_eq!(stored.len(), 6);
    assert_eq!(stored[5].id, added.id);

    let reopened = CoverageContext::from_config(&config).unwrap();
    let view = reopened.highlight_entity(&added.id).unwrap();
    assert!(view.missing.is_empty());
    assert_eq!(view.plan.codes, vec!["60452", "90210"]);

    reopened.reset_entities().unwrap();
    assert!(reopened.highlight_entity(&added.id).is_err());
    assert!(reopened.highlight_entity(&EntityId::from(1u64)).is_ok());
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = ZipcoverConfig::default();
    config.union.selection_chunk_size = 0;
    assert!(CoverageContext::from_config(&config).is_err());
}
