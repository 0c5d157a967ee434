//! End-to-end scenario tests spanning collection, filter, geo, migration, and
//! vacuum — each one exercises a whole subsystem through its public API
//! rather than an internal unit.

use gigavector_core::migration::{Migration, MigrationConfig};
use gigavector_core::{Collection, DistanceMetric, Filter, GeoIndex, IndexType, VacuumConfig, VacuumManager};
use parking_lot::Mutex;
use std::sync::Arc;

#[test]
fn filtered_kdtree_search_returns_only_matching_color() {
    let mut db = Collection::open(None, 2, IndexType::KdTree);
    db.add_vector_with_metadata(vec![0.0, 1.0], "color", "red").unwrap();
    db.add_vector_with_metadata(vec![0.0, 2.0], "color", "blue").unwrap();
    db.add_vector_with_metadata(vec![0.0, 3.0], "color", "red").unwrap();

    let results = db
        .search_with_filter_expr(&[0.0, 1.1], 3, DistanceMetric::Euclidean, r#"color == "red""#)
        .unwrap();
    assert!(!results.is_empty());
    for r in &results {
        assert_eq!(r.metadata.get("color").map(String::as_str), Some("red"));
    }
}

#[test]
fn single_vector_metadata_roundtrips_through_search() {
    let mut db = Collection::open(None, 2, IndexType::KdTree);
    let id = db.add_vector_with_metadata(vec![1.0, 2.0], "tag", "test").unwrap();
    let results = db.search(&[1.0, 2.0], 1, DistanceMetric::Euclidean).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, id);
    assert_eq!(results[0].metadata.get("tag").map(String::as_str), Some("test"));
}

#[test]
fn filter_parses_boolean_combinators_and_rejects_garbage() {
    assert!(Filter::parse(r#"(country == "US" OR country == "CA") AND NOT status == "deleted""#).is_ok());
    assert!(Filter::parse("invalid syntax !@#$").is_err());
}

#[test]
fn geo_bbox_and_radius_search_find_nearby_city() {
    let mut idx = GeoIndex::new();
    const NYC: (f64, f64) = (40.7128, -74.0060);
    const LA: (f64, f64) = (34.0522, -118.2437);
    const LONDON: (f64, f64) = (51.5074, -0.1278);
    idx.insert(1, NYC.0, NYC.1);
    idx.insert(2, LA.0, LA.1);
    idx.insert(3, LONDON.0, LONDON.1);

    let bbox = gigavector_core::geo::BoundingBox {
        min_lat: 39.0,
        min_lng: -76.0,
        max_lat: 42.0,
        max_lng: -72.0,
    };
    let bbox_hits = idx.bbox_search(&bbox);
    assert!(bbox_hits.iter().any(|p| p.id == 1));

    let radius_hits = idx.radius_search(NYC.0, NYC.1, 50.0);
    assert!(!radius_hits.is_empty() && radius_hits.len() <= 2);
}

#[test]
fn migration_over_random_vectors_completes_and_transfers_ownership_once() {
    use gigavector_core::record::{Metadata, VectorRecord};

    let records: Vec<VectorRecord> = (0..100)
        .map(|i| {
            let v = vec![(i as f32 * 0.37).sin(), (i as f32 * 1.11).cos(), i as f32, -(i as f32)];
            VectorRecord::new(i, v, Metadata::new())
        })
        .collect();

    let migration = Migration::start(
        records,
        4,
        IndexType::Flat,
        DistanceMetric::Euclidean,
        Some(MigrationConfig {
            chunk_size: 10,
            reason: None,
        }),
    );
    migration.wait();
    let info = migration.get_info();
    assert_eq!(info.status, gigavector_core::MigrationStatus::Completed);
    assert!(info.progress >= 0.99);
    assert_eq!(info.vectors_migrated, 100);

    assert!(migration.take_index().is_some());
    assert!(migration.take_index().is_none());
}

#[test]
fn vacuum_removes_deleted_ids_and_clears_fragmentation() {
    let mut coll = Collection::open(None, 2, IndexType::Flat);
    for i in 0..4u64 {
        coll.add_vector(vec![i as f32, i as f32]).unwrap();
    }
    coll.delete_vector_by_index(1).unwrap();
    coll.delete_vector_by_index(3).unwrap();

    let coll = Arc::new(Mutex::new(coll));
    let vacuum = VacuumManager::new(
        Arc::clone(&coll),
        VacuumConfig {
            min_deleted_count: 1,
            min_fragmentation_ratio: 0.0,
            ..VacuumConfig::default()
        },
    );
    vacuum.run().unwrap();
    assert!((vacuum.fragmentation() - 0.0).abs() < 1e-9);

    let locked = coll.lock();
    assert_eq!(locked.stats().deleted_count, 0);
    for id in [1u64, 3u64] {
        let results = locked
            .search(&[id as f32, id as f32], 10, DistanceMetric::Euclidean)
            .unwrap();
        assert!(results.iter().all(|r| r.distance > 1e-6));
    }
}
