//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration.

pub use sea_orm_migration::prelude::*;

mod m20250601_000001_initial;
mod m20250601_000002_tenant_constraints;
mod m20250601_000003_sessions;
mod m20250601_000004_session_tenant_constraints;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_initial::Migration),
            Box::new(m20250601_000002_tenant_constraints::Migration),
            Box::new(m20250601_000003_sessions::Migration),
            Box::new(m20250601_000004_session_tenant_constraints::Migration),
        ]
    }
}
