pub use sea_orm_migration::prelude::*;

mod m20251205_000001_create_collections_table;
mod m20251205_000002_create_applied_steps_table;

/// Bootstraps the tables the schema store itself lives in.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251205_000001_create_collections_table::Migration),
            Box::new(m20251205_000002_create_applied_steps_table::Migration),
        ]
    }
}
