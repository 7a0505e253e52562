//! The feature computation job ("refresh features").
//!
//! One refresh is one transaction: read the raw store, screen it, replace
//! every `feature_store` row and upsert `feature_metadata`. Readers see either
//! the previous feature set or the new one, never a mix, and a failed refresh
//! leaves the previous set in place.

use std::time::Instant;

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, Set, TransactionTrait,
};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::entity::feature_row;
use crate::error::StoreResult;
use crate::features::{self, FEATURE_DEFINITIONS};
use crate::metadata;
use crate::quality::{self, QualityPolicy, QualityReport, Strictness};
use crate::raw::{self, INSERT_CHUNK};

/// What a completed refresh did. Serialized as-is by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub strictness: Strictness,
    pub since: Option<DateTime<Utc>>,
    pub input_rows: u64,
    pub accepted_rows: u64,
    pub skipped_rows: u64,
    pub rows_written: u64,
    pub distinct_users: u64,
    pub distinct_items: u64,
    pub metadata_rows: u64,
    pub refreshed_at: NaiveDateTime,
    pub quality: QualityReport,
}

pub struct FeatureJob {
    db: DatabaseConnection,
    policy: QualityPolicy,
    /// Serializes refreshes issued through this handle.
    writer: Mutex<()>,
}

impl FeatureJob {
    pub fn new(db: DatabaseConnection, policy: QualityPolicy) -> Self {
        Self {
            db,
            policy,
            writer: Mutex::new(()),
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn policy(&self) -> &QualityPolicy {
        &self.policy
    }

    /// Recompute the feature store from the raw tables.
    ///
    /// With `since`, only interactions ingested at or after it form the input
    /// window, and the feature store is replaced by that window's features.
    /// Empty input is not an error: it produces an empty feature store.
    pub async fn refresh(&self, since: Option<DateTime<Utc>>) -> StoreResult<RefreshReport> {
        let _guard = self.writer.lock().await;
        let started = Instant::now();

        let txn = self.db.begin().await?;

        // Other writers wait; readers keep seeing the committed rows.
        if txn.get_database_backend() == DbBackend::Postgres {
            txn.execute_unprepared("LOCK TABLE feature_store IN EXCLUSIVE MODE")
                .await?;
        }

        let interactions = raw::load_interactions(&txn, since).await?;
        let products = raw::load_products(&txn).await?;

        let screened = match quality::screen(&interactions, &products, &self.policy) {
            Ok(screened) => screened,
            Err(e) => {
                txn.rollback().await?;
                tracing::error!(error = %e, "refresh aborted, feature store unchanged");
                return Err(e);
            }
        };

        let rows = features::compute(&screened.accepted);
        // Microseconds: the finest precision Postgres timestamps keep.
        let refreshed_at = Utc::now().naive_utc().trunc_subsecs(6);

        let removed = feature_row::Entity::delete_many().exec(&txn).await?;
        let rows_written = write_rows(&txn, &rows).await?;
        let metadata_rows = metadata::upsert_all(&txn, &FEATURE_DEFINITIONS, refreshed_at).await?;

        txn.commit().await?;

        let distinct_users = count_distinct(rows.iter().map(|r| r.user_id));
        let distinct_items = count_distinct(rows.iter().map(|r| r.item_id));
        let report = RefreshReport {
            strictness: self.policy.strictness,
            since,
            input_rows: screened.report.interaction_rows,
            accepted_rows: screened.accepted.len() as u64,
            skipped_rows: screened.report.rejected_interactions(),
            rows_written,
            distinct_users,
            distinct_items,
            metadata_rows: metadata_rows as u64,
            refreshed_at,
            quality: screened.report,
        };

        tracing::info!(
            input_rows = report.input_rows,
            skipped_rows = report.skipped_rows,
            rows_removed = removed.rows_affected,
            rows_written = report.rows_written,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "feature store refreshed"
        );

        Ok(report)
    }
}

async fn write_rows<C: ConnectionTrait>(conn: &C, rows: &[feature_row::Model]) -> StoreResult<u64> {
    let mut written = 0;
    for chunk in rows.chunks(INSERT_CHUNK) {
        let models = chunk.iter().map(|r| feature_row::ActiveModel {
            user_id: Set(r.user_id),
            item_id: Set(r.item_id),
            avg_user_rating: Set(r.avg_user_rating),
            avg_item_rating: Set(r.avg_item_rating),
            user_activity_count: Set(r.user_activity_count),
            co_occurrence_count: Set(r.co_occurrence_count),
            last_updated: Set(r.last_updated),
        });
        written += feature_row::Entity::insert_many(models)
            .exec_without_returning(conn)
            .await?;
    }
    Ok(written)
}

fn count_distinct(ids: impl Iterator<Item = i64>) -> u64 {
    ids.collect::<std::collections::HashSet<_>>().len() as u64
}
