pub use sea_orm_migration::prelude::*;

mod m20261006_000001_create_raw_tables;
mod m20261006_000002_create_feature_tables;
mod m20261008_000003_create_model_metadata;
mod m20261012_000004_add_feature_store_pair_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261006_000001_create_raw_tables::Migration),
            Box::new(m20261006_000002_create_feature_tables::Migration),
            Box::new(m20261008_000003_create_model_metadata::Migration),
            Box::new(m20261012_000004_add_feature_store_pair_index::Migration),
        ]
    }
}
