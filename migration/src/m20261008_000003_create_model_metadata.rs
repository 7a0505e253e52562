use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ModelMetadata::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ModelMetadata::RunId)
                            .string_len(50)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ModelMetadata::TrainingDate)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ModelMetadata::Rmse).double().null())
                    .col(ColumnDef::new(ModelMetadata::NFeatures).integer().not_null())
                    .col(
                        ColumnDef::new(ModelMetadata::ModelType)
                            .string_len(50)
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ModelMetadata::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ModelMetadata {
    Table,
    RunId,
    TrainingDate,
    Rmse,
    #[iden = "n_features"]
    NFeatures,
    ModelType,
}
