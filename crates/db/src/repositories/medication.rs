//! Medication administration records.
//!
//! Records are append-only.

use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

use crate::entities::medication_records;

use super::client::client_in_tenant;

/// Error types for medication operations.
#[derive(Debug, thiserror::Error)]
pub enum MedicationError {
    /// Client not found in the tenant.
    #[error("Client not found: {0}")]
    ClientNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for recording an administered medication.
#[derive(Debug, Clone)]
pub struct RecordMedicationInput {
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Client receiving the medication.
    pub client_id: Uuid,
    /// Staff member recording it.
    pub recorded_by: Uuid,
    /// Medication name.
    pub medication_name: String,
    /// Dose given.
    pub dosage: String,
    /// Route of administration (oral, topical...).
    pub route: Option<String>,
    /// When it was given (wall clock).
    pub administered_at: NaiveDateTime,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// Medication record repository.
#[derive(Debug, Clone)]
pub struct MedicationRepository {
    db: DatabaseConnection,
}

impl MedicationRepository {
    /// Creates a new medication repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records an administered medication.
    ///
    /// # Errors
    ///
    /// Returns an error if the client is not in the tenant or the insert fails.
    pub async fn record(
        &self,
        input: RecordMedicationInput,
    ) -> Result<medication_records::Model, MedicationError> {
        if !client_in_tenant(&self.db, input.tenant_id, input.client_id).await? {
            return Err(MedicationError::ClientNotFound(input.client_id));
        }

        let now = Utc::now().into();
        let record = medication_records::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(input.tenant_id),
            client_id: Set(input.client_id),
            recorded_by: Set(Some(input.recorded_by)),
            medication_name: Set(input.medication_name),
            dosage: Set(input.dosage),
            route: Set(input.route),
            administered_at: Set(input.administered_at),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        tracing::debug!(tenant_id = %record.tenant_id, client_id = %record.client_id, "Medication recorded");
        Ok(record)
    }

    /// Lists a client's medication records, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_client(
        &self,
        tenant_id: Uuid,
        client_id: Uuid,
    ) -> Result<Vec<medication_records::Model>, DbErr> {
        medication_records::Entity::find()
            .filter(medication_records::Column::TenantId.eq(tenant_id))
            .filter(medication_records::Column::ClientId.eq(client_id))
            .order_by_desc(medication_records::Column::AdministeredAt)
            .all(&self.db)
            .await
    }
}
