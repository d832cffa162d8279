//! Care support plan repository.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

use carebase_core::records::{self, CarePlanStatus, RecordError};

use crate::entities::{care_plans, sea_orm_active_enums};

use super::client::client_in_tenant;

/// Error types for care plan operations.
#[derive(Debug, thiserror::Error)]
pub enum CarePlanError {
    /// Plan not found in the tenant.
    #[error("Care plan not found: {0}")]
    NotFound(Uuid),

    /// Client not found in the tenant.
    #[error("Client not found: {0}")]
    ClientNotFound(Uuid),

    /// Goals, dates or status rejected.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a care plan. Plans start as drafts.
#[derive(Debug, Clone)]
pub struct CreateCarePlanInput {
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Client the plan supports.
    pub client_id: Uuid,
    /// Author.
    pub author_id: Uuid,
    /// Heading.
    pub title: String,
    /// Overview.
    pub summary: Option<String>,
    /// Support goals.
    pub goals: Vec<String>,
    /// Date the plan takes effect.
    pub start_date: NaiveDate,
    /// Next review.
    pub review_date: Option<NaiveDate>,
}

/// Partial care plan update.
#[derive(Debug, Clone, Default)]
pub struct UpdateCarePlanInput {
    /// Heading.
    pub title: Option<String>,
    /// Overview, or `Some(None)` to clear.
    pub summary: Option<Option<String>>,
    /// Replacement goals.
    pub goals: Option<Vec<String>>,
    /// Start date.
    pub start_date: Option<NaiveDate>,
    /// Review date, or `Some(None)` to clear.
    pub review_date: Option<Option<NaiveDate>>,
}

/// Care plan repository.
#[derive(Debug, Clone)]
pub struct CarePlanRepository {
    db: DatabaseConnection,
}

impl CarePlanRepository {
    /// Creates a new care plan repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a draft plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the client is not in the tenant, the goals or dates
    /// are invalid, or the insert fails.
    pub async fn create(&self, input: CreateCarePlanInput) -> Result<care_plans::Model, CarePlanError> {
        let goals = records::normalize_goals(&input.goals)?;
        records::validate_review_date(input.start_date, input.review_date)?;
        if !client_in_tenant(&self.db, input.tenant_id, input.client_id).await? {
            return Err(CarePlanError::ClientNotFound(input.client_id));
        }

        let now = Utc::now().into();
        let plan = care_plans::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(input.tenant_id),
            client_id: Set(input.client_id),
            author_id: Set(Some(input.author_id)),
            title: Set(input.title),
            summary: Set(input.summary),
            goals: Set(serde_json::json!(goals)),
            status: Set(sea_orm_active_enums::CarePlanStatus::Draft),
            start_date: Set(input.start_date),
            review_date: Set(input.review_date),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        Ok(plan)
    }

    /// Finds a plan within a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<care_plans::Model>, DbErr> {
        care_plans::Entity::find_by_id(id)
            .filter(care_plans::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await
    }

    /// Lists a client's plans, latest start first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_client(
        &self,
        tenant_id: Uuid,
        client_id: Uuid,
    ) -> Result<Vec<care_plans::Model>, DbErr> {
        care_plans::Entity::find()
            .filter(care_plans::Column::TenantId.eq(tenant_id))
            .filter(care_plans::Column::ClientId.eq(client_id))
            .order_by_desc(care_plans::Column::StartDate)
            .order_by_desc(care_plans::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Applies a partial update to a draft or active plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan is missing or archived, or the goals or
    /// dates are invalid.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateCarePlanInput,
    ) -> Result<care_plans::Model, CarePlanError> {
        let existing = self
            .find(tenant_id, id)
            .await?
            .ok_or(CarePlanError::NotFound(id))?;

        let status: CarePlanStatus = existing.status.into();
        if !status.is_editable() {
            return Err(RecordError::Archived.into());
        }

        let start_date = input.start_date.unwrap_or(existing.start_date);
        let review_date = input.review_date.unwrap_or(existing.review_date);
        records::validate_review_date(start_date, review_date)?;

        let mut plan: care_plans::ActiveModel = existing.into();
        if let Some(goals) = input.goals {
            plan.goals = Set(serde_json::json!(records::normalize_goals(&goals)?));
        }
        if let Some(title) = input.title {
            plan.title = Set(title);
        }
        if let Some(summary) = input.summary {
            plan.summary = Set(summary);
        }
        plan.start_date = Set(start_date);
        plan.review_date = Set(review_date);
        plan.updated_at = Set(Utc::now().into());

        Ok(plan.update(&self.db).await?)
    }

    /// Moves a plan to a new status.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan is missing or the move is not allowed.
    pub async fn set_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        to: CarePlanStatus,
    ) -> Result<care_plans::Model, CarePlanError> {
        let existing = self
            .find(tenant_id, id)
            .await?
            .ok_or(CarePlanError::NotFound(id))?;

        let from: CarePlanStatus = existing.status.into();
        let status = from.transition(to)?;

        let mut plan: care_plans::ActiveModel = existing.into();
        plan.status = Set(status.into());
        plan.updated_at = Set(Utc::now().into());

        let plan = plan.update(&self.db).await?;
        tracing::info!(tenant_id = %tenant_id, care_plan_id = %id, from = %from, to = %status, "Care plan status changed");
        Ok(plan)
    }
}
