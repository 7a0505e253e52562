use sea_orm::entity::prelude::*;
use serde::Serialize;

/// One ingested user/item event. The table has no key: the same event may be
/// appended more than once, so the declared primary key is only used by SeaORM
/// to address rows and is not enforced by the schema.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "raw_interactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub item_id: i64,
    /// NULL ratings are a data-quality problem handled by the refresh job.
    pub rating: Option<i64>,
    pub ingested_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
