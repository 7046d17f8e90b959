pub use sea_orm_migration::prelude::*;

mod m20250901_000001_create_people;
mod m20250901_000002_create_catalog;
mod m20250901_000003_create_enrollment;
mod m20250901_000004_create_payments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_people::Migration),
            Box::new(m20250901_000002_create_catalog::Migration),
            Box::new(m20250901_000003_create_enrollment::Migration),
            Box::new(m20250901_000004_create_payments::Migration),
        ]
    }
}
