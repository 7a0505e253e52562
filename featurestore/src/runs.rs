//! Model metadata recorder ("record model run").

use chrono::NaiveDateTime;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use serde::Serialize;

use crate::entity::model_metadata;
use crate::error::{StoreError, StoreResult};

const MAX_RUN_ID_LEN: usize = 50;
const MAX_MODEL_TYPE_LEN: usize = 50;

/// Result of one completed training run, as reported by the training step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub run_id: String,
    pub training_date: NaiveDateTime,
    pub rmse: Option<f64>,
    pub n_features: i32,
    pub model_type: String,
}

impl RunRecord {
    fn validate(&self) -> StoreResult<()> {
        check_label("run_id", &self.run_id, MAX_RUN_ID_LEN)?;
        check_label("model_type", &self.model_type, MAX_MODEL_TYPE_LEN)?;
        if self.n_features < 0 {
            return Err(StoreError::InvalidInput(format!(
                "n_features must be non-negative, got {}",
                self.n_features
            )));
        }
        if let Some(rmse) = self.rmse
            && (!rmse.is_finite() || rmse < 0.0)
        {
            return Err(StoreError::InvalidInput(format!(
                "rmse must be a finite non-negative number, got {rmse}"
            )));
        }
        Ok(())
    }
}

fn check_label(field: &str, value: &str, max: usize) -> StoreResult<()> {
    if value.trim().is_empty() {
        return Err(StoreError::InvalidInput(format!("{field} must not be empty")));
    }
    if value.chars().count() > max {
        return Err(StoreError::InvalidInput(format!(
            "{field} exceeds {max} characters"
        )));
    }
    Ok(())
}

pub struct ModelRegistry {
    db: DatabaseConnection,
}

impl ModelRegistry {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert one immutable run row.
    ///
    /// A `run_id` that already exists fails with [`StoreError::Integrity`] and
    /// leaves the existing row untouched. The caller decides what to do next;
    /// no new id is invented here.
    pub async fn record_run(&self, run: RunRecord) -> StoreResult<model_metadata::Model> {
        run.validate()?;

        let run_id = run.run_id.clone();
        let model = model_metadata::ActiveModel {
            run_id: Set(run.run_id),
            training_date: Set(run.training_date),
            rmse: Set(run.rmse),
            n_features: Set(run.n_features),
            model_type: Set(run.model_type),
        }
        .insert(&self.db)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Integrity(_) => {
                StoreError::Integrity(format!("run_id '{run_id}' already recorded"))
            }
            other => other,
        })?;

        tracing::info!(
            run_id = %model.run_id,
            model_type = %model.model_type,
            n_features = model.n_features,
            rmse = ?model.rmse,
            "model run recorded"
        );
        Ok(model)
    }

    pub async fn get_run(&self, run_id: &str) -> StoreResult<Option<model_metadata::Model>> {
        Ok(model_metadata::Entity::find_by_id(run_id.to_string())
            .one(&self.db)
            .await?)
    }

    /// Every recorded run, most recent training date first.
    pub async fn list_runs(&self) -> StoreResult<Vec<model_metadata::Model>> {
        Ok(model_metadata::Entity::find()
            .order_by_desc(model_metadata::Column::TrainingDate)
            .order_by_asc(model_metadata::Column::RunId)
            .all(&self.db)
            .await?)
    }
}
