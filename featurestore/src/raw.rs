//! Append and read access to the raw store.
//!
//! The raw tables are append-only: nothing here updates or deletes.

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entity::{raw_interaction, raw_product};
use crate::error::StoreResult;

/// Rows per INSERT; keeps bound parameters well under SQLite's limit.
pub(crate) const INSERT_CHUNK: usize = 100;

pub async fn append_interactions<C: ConnectionTrait>(
    conn: &C,
    rows: &[raw_interaction::Model],
) -> StoreResult<u64> {
    let mut inserted = 0;
    for chunk in rows.chunks(INSERT_CHUNK) {
        let models = chunk.iter().map(|r| raw_interaction::ActiveModel {
            user_id: Set(r.user_id),
            item_id: Set(r.item_id),
            rating: Set(r.rating),
            ingested_at: Set(r.ingested_at),
        });
        inserted += raw_interaction::Entity::insert_many(models)
            .exec_without_returning(conn)
            .await?;
    }
    tracing::debug!(rows = inserted, "appended raw interactions");
    Ok(inserted)
}

pub async fn append_products<C: ConnectionTrait>(
    conn: &C,
    rows: &[raw_product::Model],
) -> StoreResult<u64> {
    let mut inserted = 0;
    for chunk in rows.chunks(INSERT_CHUNK) {
        let models = chunk.iter().map(|p| raw_product::ActiveModel {
            item_id: Set(p.item_id),
            category: Set(p.category.clone()),
            price: Set(p.price),
        });
        inserted += raw_product::Entity::insert_many(models)
            .exec_without_returning(conn)
            .await?;
    }
    tracing::debug!(rows = inserted, "appended raw products");
    Ok(inserted)
}

/// All interactions, or only those ingested at or after `since`.
pub async fn load_interactions<C: ConnectionTrait>(
    conn: &C,
    since: Option<DateTime<Utc>>,
) -> StoreResult<Vec<raw_interaction::Model>> {
    let mut query = raw_interaction::Entity::find();
    if let Some(since) = since
        && filters_since_in_sql(conn.get_database_backend())
    {
        query = query.filter(raw_interaction::Column::IngestedAt.gte(since));
    }
    let rows = query
        .order_by_asc(raw_interaction::Column::UserId)
        .order_by_asc(raw_interaction::Column::ItemId)
        .all(conn)
        .await?;

    // SQLite stores offsets as text and would compare them lexically, so the
    // window is always (re)applied here.
    Ok(match since {
        Some(since) => rows.into_iter().filter(|r| r.ingested_at >= since).collect(),
        None => rows,
    })
}

/// Whether the backend compares `timestamptz` values natively.
fn filters_since_in_sql(backend: DbBackend) -> bool {
    matches!(backend, DbBackend::Postgres)
}

pub async fn load_products<C: ConnectionTrait>(conn: &C) -> StoreResult<Vec<raw_product::Model>> {
    Ok(raw_product::Entity::find()
        .order_by_asc(raw_product::Column::ItemId)
        .all(conn)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection, PaginatorTrait};

    async fn setup() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    fn interaction(user_id: i64, item_id: i64, at: DateTime<Utc>) -> raw_interaction::Model {
        raw_interaction::Model {
            user_id,
            item_id,
            rating: Some(3),
            ingested_at: at.fixed_offset(),
        }
    }

    #[tokio::test]
    async fn test_append_keeps_duplicates() {
        let db = setup().await;
        let now = Utc::now();
        let rows = vec![interaction(1, 1, now), interaction(1, 1, now)];

        assert_eq!(append_interactions(&db, &rows).await.unwrap(), 2);
        assert_eq!(append_interactions(&db, &rows).await.unwrap(), 2);
        assert_eq!(raw_interaction::Entity::find().count(&db).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_append_more_rows_than_one_chunk() {
        let db = setup().await;
        let now = Utc::now();
        let rows: Vec<_> = (0..(INSERT_CHUNK as i64 * 2 + 7))
            .map(|i| interaction(i, i % 5, now))
            .collect();

        let inserted = append_interactions(&db, &rows).await.unwrap();
        assert_eq!(inserted, rows.len() as u64);
        assert_eq!(load_interactions(&db, None).await.unwrap().len(), rows.len());
    }

    #[tokio::test]
    async fn test_append_empty_is_noop() {
        let db = setup().await;
        assert_eq!(append_interactions(&db, &[]).await.unwrap(), 0);
        assert_eq!(append_products(&db, &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_load_interactions_since_window() {
        let db = setup().await;
        let base = Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap();
        let rows = vec![
            interaction(1, 1, base - Duration::hours(2)),
            interaction(2, 1, base),
            interaction(3, 1, base + Duration::hours(1)),
        ];
        append_interactions(&db, &rows).await.unwrap();

        let window = load_interactions(&db, Some(base)).await.unwrap();
        let users: Vec<i64> = window.iter().map(|r| r.user_id).collect();
        assert_eq!(users, vec![2, 3]);
    }

    #[test]
    fn test_since_pushed_to_sql_only_on_postgres() {
        assert!(filters_since_in_sql(DbBackend::Postgres));
        assert!(!filters_since_in_sql(DbBackend::Sqlite));
        assert!(!filters_since_in_sql(DbBackend::MySql));
    }

    #[test]
    fn test_postgres_query_carries_since_filter() {
        use sea_orm::QueryTrait;

        let since = Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap();
        let sql = raw_interaction::Entity::find()
            .filter(raw_interaction::Column::IngestedAt.gte(since))
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains(r#""ingested_at" >="#), "{sql}");
    }

    #[tokio::test]
    async fn test_products_round_trip_nullable_columns() {
        let db = setup().await;
        let products = vec![
            raw_product::Model {
                item_id: 2,
                category: None,
                price: None,
            },
            raw_product::Model {
                item_id: 1,
                category: Some("Books".into()),
                price: Some(15.5),
            },
        ];
        append_products(&db, &products).await.unwrap();

        let loaded = load_products(&db).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].item_id, 1);
        assert_eq!(loaded[0].category.as_deref(), Some("Books"));
        assert!(loaded[1].price.is_none());
    }
}
