//! Read side of the feature store, for the training step and ad-hoc queries.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use crate::entity::feature_row;
use crate::error::{StoreError, StoreResult};
use crate::features;
use crate::metadata;

/// A single feature value. Counts stay integral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Float(f64),
    Count(i64),
    Timestamp(chrono::NaiveDateTime),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSample {
    pub user_id: i64,
    pub item_id: i64,
    pub value: FeatureValue,
}

/// The whole feature store ordered by `(user_id, item_id)`.
pub async fn read_feature_store<C: ConnectionTrait>(conn: &C) -> StoreResult<Vec<feature_row::Model>> {
    Ok(feature_row::Entity::find()
        .order_by_asc(feature_row::Column::UserId)
        .order_by_asc(feature_row::Column::ItemId)
        .all(conn)
        .await?)
}

/// Rows for the given users; every user when `user_ids` is empty.
pub async fn features_for_users<C: ConnectionTrait>(
    conn: &C,
    user_ids: &[i64],
) -> StoreResult<Vec<feature_row::Model>> {
    let mut query = feature_row::Entity::find();
    if !user_ids.is_empty() {
        query = query.filter(feature_row::Column::UserId.is_in(user_ids.iter().copied()));
    }
    Ok(query
        .order_by_asc(feature_row::Column::UserId)
        .order_by_asc(feature_row::Column::ItemId)
        .all(conn)
        .await?)
}

/// Names registered in `feature_metadata`.
pub async fn list_features<C: ConnectionTrait>(conn: &C) -> StoreResult<Vec<String>> {
    Ok(metadata::list_feature_metadata(conn)
        .await?
        .into_iter()
        .map(|m| m.feature_name)
        .collect())
}

/// One named feature for the given users.
///
/// The name must be a known non-key column and registered in
/// `feature_metadata`; otherwise [`StoreError::UnknownFeature`].
pub async fn get_feature<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    user_ids: &[i64],
) -> StoreResult<Vec<FeatureSample>> {
    let def = features::definition(name)
        .filter(|d| !d.is_key)
        .ok_or_else(|| StoreError::UnknownFeature(name.to_string()))?;
    if metadata::get_feature_metadata(conn, def.name).await?.is_none() {
        return Err(StoreError::UnknownFeature(name.to_string()));
    }

    let rows = features_for_users(conn, user_ids).await?;
    rows.into_iter()
        .map(|row| {
            let value = column_value(&row, def.name)
                .ok_or_else(|| StoreError::UnknownFeature(name.to_string()))?;
            Ok(FeatureSample {
                user_id: row.user_id,
                item_id: row.item_id,
                value,
            })
        })
        .collect()
}

fn column_value(row: &feature_row::Model, name: &str) -> Option<FeatureValue> {
    Some(match name {
        "avg_user_rating" => FeatureValue::Float(row.avg_user_rating),
        "avg_item_rating" => FeatureValue::Float(row.avg_item_rating),
        "user_activity_count" => FeatureValue::Count(row.user_activity_count),
        "co_occurrence_count" => FeatureValue::Count(row.co_occurrence_count),
        "last_updated" => FeatureValue::Timestamp(row.last_updated),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::raw_interaction;
    use crate::quality::QualityPolicy;
    use crate::raw;
    use crate::refresh::FeatureJob;
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection};

    async fn setup() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn refreshed(rows: &[(i64, i64, i64)]) -> DatabaseConnection {
        let db = setup().await;
        let at = Utc::now().fixed_offset();
        let rows: Vec<_> = rows
            .iter()
            .map(|&(user_id, item_id, rating)| raw_interaction::Model {
                user_id,
                item_id,
                rating: Some(rating),
                ingested_at: at,
            })
            .collect();
        raw::append_interactions(&db, &rows).await.unwrap();
        let job = FeatureJob::new(db.clone(), QualityPolicy::default());
        job.refresh(None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_get_feature_filters_users() {
        let db = refreshed(&[(1, 10, 4), (1, 11, 2), (2, 10, 5), (3, 12, 1)]).await;

        let samples = get_feature(&db, "avg_user_rating", &[1, 3]).await.unwrap();
        let got: Vec<_> = samples.iter().map(|s| (s.user_id, s.item_id, s.value)).collect();
        assert_eq!(
            got,
            vec![
                (1, 10, FeatureValue::Float(3.0)),
                (1, 11, FeatureValue::Float(3.0)),
                (3, 12, FeatureValue::Float(1.0)),
            ]
        );
    }

    #[tokio::test]
    async fn test_get_feature_counts_are_integral() {
        let db = refreshed(&[(1, 10, 4), (1, 10, 2)]).await;

        let samples = get_feature(&db, "co_occurrence_count", &[]).await.unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, FeatureValue::Count(2));
        assert_eq!(serde_json::to_value(samples[0].value).unwrap(), serde_json::json!(2));
    }

    #[tokio::test]
    async fn test_unknown_feature_rejected() {
        let db = refreshed(&[(1, 10, 4)]).await;
        let err = get_feature(&db, "category_encoded", &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownFeature(ref n) if n == "category_encoded"));
    }

    #[tokio::test]
    async fn test_key_column_is_not_a_feature() {
        let db = refreshed(&[(1, 10, 4)]).await;
        let err = get_feature(&db, "user_id", &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownFeature(_)));
    }

    #[tokio::test]
    async fn test_unregistered_feature_rejected_before_first_refresh() {
        let db = setup().await;
        let err = get_feature(&db, "avg_item_rating", &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownFeature(_)));
        assert!(list_features(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_features_after_refresh() {
        let db = refreshed(&[(1, 10, 4)]).await;
        let names = list_features(&db).await.unwrap();
        assert_eq!(names.len(), features::FEATURE_DEFINITIONS.len());
        assert!(names.contains(&"co_occurrence_count".to_string()));
    }
}
