use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // feature_store
        manager
            .create_table(
                Table::create()
                    .table(FeatureStore::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(FeatureStore::UserId).big_integer().not_null())
                    .col(ColumnDef::new(FeatureStore::ItemId).big_integer().not_null())
                    .col(
                        ColumnDef::new(FeatureStore::AvgUserRating)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FeatureStore::AvgItemRating)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FeatureStore::UserActivityCount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FeatureStore::CoOccurrenceCount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FeatureStore::LastUpdated)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // feature_metadata
        manager
            .create_table(
                Table::create()
                    .table(FeatureMetadata::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FeatureMetadata::FeatureName)
                            .string_len(50)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FeatureMetadata::SourceTable)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FeatureMetadata::Transformation)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FeatureMetadata::LastUpdated)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FeatureMetadata::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FeatureStore::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum FeatureStore {
    Table,
    UserId,
    ItemId,
    AvgUserRating,
    AvgItemRating,
    UserActivityCount,
    CoOccurrenceCount,
    LastUpdated,
}

#[derive(Iden)]
enum FeatureMetadata {
    Table,
    FeatureName,
    SourceTable,
    Transformation,
    LastUpdated,
}
