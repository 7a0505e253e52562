//! End-to-end runs of the feature store against an in-memory SQLite database:
//! ingest → validate → refresh → read features → record a training run.

use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use featurestore::entity::raw_interaction;
use featurestore::quality::{self, QualityPolicy};
use featurestore::refresh::FeatureJob;
use featurestore::runs::{ModelRegistry, RunRecord};
use featurestore::{StoreError, demo, lookup, metadata, raw};
use migration::{Migrator, MigratorTrait};
use rand::SeedableRng;
use rand::rngs::StdRng;
use sea_orm::{Database, DatabaseConnection};

async fn setup() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

async fn ingest(db: &DatabaseConnection, seed: u64, n: usize) -> Vec<raw_interaction::Model> {
    let at = Utc.with_ymd_and_hms(2026, 10, 3, 6, 0, 0).unwrap();
    let rows = demo::generate_interactions(&mut StdRng::seed_from_u64(seed), n, at);
    raw::append_interactions(db, &rows).await.unwrap();
    raw::append_products(db, &demo::product_catalog()).await.unwrap();
    rows
}

#[tokio::test]
async fn test_feature_rows_match_raw_pairs() {
    let db = setup().await;
    let rows = ingest(&db, 11, 250).await;

    let job = FeatureJob::new(db.clone(), QualityPolicy::strict());
    let report = job.refresh(None).await.unwrap();

    let raw_pairs: BTreeSet<(i64, i64)> = rows.iter().map(|r| (r.user_id, r.item_id)).collect();
    let features = lookup::read_feature_store(&db).await.unwrap();
    let feature_pairs: BTreeSet<(i64, i64)> =
        features.iter().map(|r| (r.user_id, r.item_id)).collect();

    assert_eq!(raw_pairs, feature_pairs);
    assert_eq!(features.len(), feature_pairs.len(), "one row per pair");
    assert_eq!(report.rows_written, features.len() as u64);

    let total: i64 = features.iter().map(|r| r.co_occurrence_count).sum();
    assert_eq!(total, rows.len() as i64);
}

#[tokio::test]
async fn test_repeated_refresh_is_idempotent() {
    let db = setup().await;
    ingest(&db, 5, 120).await;
    let job = FeatureJob::new(db.clone(), QualityPolicy::default());

    job.refresh(None).await.unwrap();
    let first = serde_json::to_string(&lookup::read_feature_store(&db).await.unwrap()).unwrap();
    job.refresh(None).await.unwrap();
    let second = serde_json::to_string(&lookup::read_feature_store(&db).await.unwrap()).unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_validate_reports_demo_items_without_products() {
    let db = setup().await;
    let rows = ingest(&db, 3, 200).await;

    let report = quality::validate(&db, &QualityPolicy::strict()).await.unwrap();
    assert_eq!(report.interaction_rows, rows.len() as u64);
    assert_eq!(report.product_rows, 5);
    assert_eq!(report.rejected_interactions(), 0);

    // The demo catalog only covers items 1..=5.
    let uncovered: BTreeSet<i64> = rows
        .iter()
        .map(|r| r.item_id)
        .filter(|id| *id > 5)
        .collect();
    assert_eq!(report.items_without_product, uncovered.len() as u64);
}

#[tokio::test]
async fn test_training_step_round_trip() {
    let db = setup().await;
    ingest(&db, 8, 60).await;
    FeatureJob::new(db.clone(), QualityPolicy::default())
        .refresh(None)
        .await
        .unwrap();

    let registered = metadata::list_feature_metadata(&db).await.unwrap();
    let ratings = lookup::get_feature(&db, "avg_item_rating", &[]).await.unwrap();
    assert!(!ratings.is_empty());

    let registry = ModelRegistry::new(db.clone());
    let record = RunRecord {
        run_id: "nightly-2026-10-03".into(),
        training_date: Utc::now().naive_utc(),
        rmse: Some(0.92),
        n_features: (registered.len() - 2) as i32,
        model_type: "Collaborative SVD".into(),
    };
    registry.record_run(record.clone()).await.unwrap();

    let err = registry.record_run(record).await.unwrap_err();
    assert!(matches!(err, StoreError::Integrity(_)), "got {err:?}");
    assert_eq!(registry.list_runs().await.unwrap().len(), 1);
}
