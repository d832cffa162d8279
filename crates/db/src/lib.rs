//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations, including the tenant isolation guard
//! - Classification of driver errors into `AppError`

pub mod entities;
pub mod error;
pub mod migration;
pub mod repositories;
pub mod tenancy;

pub use repositories::{
    CarePlanRepository, CaseNoteRepository, ClientRepository, InvoiceRepository,
    MedicationRepository, SessionRepository, ShiftRepository, TenantRepository, UserRepository,
};

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use carebase_shared::DatabaseConfig;

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    tracing::info!(
        max_connections = config.max_connections,
        "Database connection pool ready"
    );
    Ok(db)
}
