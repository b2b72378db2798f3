pub use sea_orm_migration::prelude::*;

mod m20240101_000001_catalogs;
mod m20240101_000002_employees;
mod m20240102_000003_admin_accounts;
mod seed;

pub use seed::{DEPARTMENT_NAMES, JOB_TITLE_NAMES, seed_catalogs};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_catalogs::Migration),
            Box::new(m20240101_000002_employees::Migration),
            Box::new(m20240102_000003_admin_accounts::Migration),
        ]
    }
}
