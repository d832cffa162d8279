//! Re-applies the tenant guard once the sessions table exists.
//!
//! `sessions.user_id` gets the same composite key as every other user
//! reference, so a session can only belong to a user of its own tenant.

use sea_orm_migration::prelude::*;

use crate::tenancy::{apply_tenant_constraints, drop_table_constraints, verify_tenant_constraints};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        let report = apply_tenant_constraints(db).await?;
        tracing::info!(
            applied = report.applied,
            skipped = report.skipped.len(),
            "Tenant constraints re-applied"
        );

        verify_tenant_constraints(db).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        drop_table_constraints(db, "sessions").await
    }
}
