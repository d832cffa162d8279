//! Tenant constraints migration.
//!
//! Replaces single-column cross-table foreign keys with composite
//! `(id, tenant_id)` keys so a row can only reference rows of its own tenant.

use sea_orm_migration::prelude::*;

use crate::tenancy::{apply_tenant_constraints, drop_tenant_constraints, verify_tenant_constraints};

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
            "Tenant constraints applied"
        );

        verify_tenant_constraints(db).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        drop_tenant_constraints(db).await
    }
}
