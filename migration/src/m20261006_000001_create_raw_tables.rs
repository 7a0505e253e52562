use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // raw_interactions: append-only, duplicates allowed, no key
        manager
            .create_table(
                Table::create()
                    .table(RawInteractions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RawInteractions::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RawInteractions::ItemId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RawInteractions::Rating).big_integer().null())
                    .col(
                        ColumnDef::new(RawInteractions::IngestedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_raw_interactions_user_item")
                    .table(RawInteractions::Table)
                    .col(RawInteractions::UserId)
                    .col(RawInteractions::ItemId)
                    .to_owned(),
            )
            .await?;

        // raw_products: item_id intentionally not unique
        manager
            .create_table(
                Table::create()
                    .table(RawProducts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RawProducts::ItemId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RawProducts::Category).text().null())
                    .col(ColumnDef::new(RawProducts::Price).double().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RawProducts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RawInteractions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum RawInteractions {
    Table,
    UserId,
    ItemId,
    Rating,
    IngestedAt,
}

#[derive(Iden)]
enum RawProducts {
    Table,
    ItemId,
    Category,
    Price,
}
