use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .unique()
                    .name("uq_feature_store_user_item")
                    .table(FeatureStore::Table)
                    .col(FeatureStore::UserId)
                    .col(FeatureStore::ItemId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("uq_feature_store_user_item")
                    .table(FeatureStore::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum FeatureStore {
    Table,
    UserId,
    ItemId,
}
