use sea_orm::entity::prelude::*;
use serde::Serialize;

/// One completed training run. Rows are never updated after insert.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "model_metadata")]
pub struct Model {
    #[sea_orm(
        primary_key,
        auto_increment = false,
        column_type = "String(StringLen::N(50))"
    )]
    pub run_id: String,
    pub training_date: DateTime,
    /// NULL when the run was evaluated with a different metric.
    pub rmse: Option<f64>,
    pub n_features: i32,
    #[sea_orm(column_type = "String(StringLen::N(50))")]
    pub model_type: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
