use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Materialized features for one (user, item) pair.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "feature_store")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub item_id: i64,
    pub avg_user_rating: f64,
    pub avg_item_rating: f64,
    pub user_activity_count: i64,
    pub co_occurrence_count: i64,
    /// Latest `ingested_at` (UTC) of the interactions behind this row.
    pub last_updated: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
