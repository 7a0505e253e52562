//! Feature metadata registry: one row per `feature_store` column.

use chrono::NaiveDateTime;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QueryOrder, Set};

use crate::entity::feature_metadata;
use crate::error::{StoreError, StoreResult};
use crate::features::FeatureDefinition;

const MAX_NAME_LEN: usize = 50;
const MAX_SOURCE_LEN: usize = 50;
const MAX_TRANSFORMATION_LEN: usize = 200;

/// Insert the definition, or update `source_table`, `transformation` and
/// `last_updated` in place when the name is already registered.
pub async fn upsert_feature_metadata<C: ConnectionTrait>(
    conn: &C,
    def: &FeatureDefinition,
    now: NaiveDateTime,
) -> StoreResult<feature_metadata::Model> {
    check_len("feature_name", def.name, MAX_NAME_LEN)?;
    check_len("source_table", def.source_table, MAX_SOURCE_LEN)?;
    check_len("transformation", def.transformation, MAX_TRANSFORMATION_LEN)?;

    let existing = feature_metadata::Entity::find_by_id(def.name.to_string())
        .one(conn)
        .await?;

    let model = if let Some(existing) = existing {
        let mut active: feature_metadata::ActiveModel = existing.into();
        active.source_table = Set(def.source_table.to_string());
        active.transformation = Set(def.transformation.to_string());
        active.last_updated = Set(now);
        active.update(conn).await?
    } else {
        feature_metadata::ActiveModel {
            feature_name: Set(def.name.to_string()),
            source_table: Set(def.source_table.to_string()),
            transformation: Set(def.transformation.to_string()),
            last_updated: Set(now),
        }
        .insert(conn)
        .await?
    };
    Ok(model)
}

pub async fn upsert_all<C: ConnectionTrait>(
    conn: &C,
    defs: &[FeatureDefinition],
    now: NaiveDateTime,
) -> StoreResult<usize> {
    for def in defs {
        upsert_feature_metadata(conn, def, now).await?;
    }
    Ok(defs.len())
}

pub async fn get_feature_metadata<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> StoreResult<Option<feature_metadata::Model>> {
    Ok(feature_metadata::Entity::find_by_id(name.to_string())
        .one(conn)
        .await?)
}

pub async fn list_feature_metadata<C: ConnectionTrait>(
    conn: &C,
) -> StoreResult<Vec<feature_metadata::Model>> {
    Ok(feature_metadata::Entity::find()
        .order_by_asc(feature_metadata::Column::FeatureName)
        .all(conn)
        .await?)
}

fn check_len(field: &str, value: &str, max: usize) -> StoreResult<()> {
    if value.is_empty() {
        return Err(StoreError::InvalidInput(format!("{field} must not be empty")));
    }
    if value.chars().count() > max {
        return Err(StoreError::InvalidInput(format!(
            "{field} exceeds {max} characters"
        )));
    }
    Ok(())
}
