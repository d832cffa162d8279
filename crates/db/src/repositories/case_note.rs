//! Case note repository.
//!
//! Notes are archived rather than deleted. Archived notes are read-only.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

use carebase_core::records::{self, CaseNoteCategory, RecordError};

use crate::entities::case_notes;

use super::client::client_in_tenant;

/// Error types for case note operations.
#[derive(Debug, thiserror::Error)]
pub enum CaseNoteError {
    /// Note not found in the tenant.
    #[error("Case note not found: {0}")]
    NotFound(Uuid),

    /// Client not found in the tenant.
    #[error("Client not found: {0}")]
    ClientNotFound(Uuid),

    /// Tags or state rejected.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a case note.
#[derive(Debug, Clone)]
pub struct CreateCaseNoteInput {
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Client the note is about.
    pub client_id: Uuid,
    /// Author.
    pub author_id: Uuid,
    /// Shift the note was written during.
    pub shift_id: Option<Uuid>,
    /// Heading.
    pub title: String,
    /// Note text.
    pub body: String,
    /// Category.
    pub category: CaseNoteCategory,
    /// Raw tags, normalised before storage.
    pub tags: Vec<String>,
}

/// Partial case note update.
#[derive(Debug, Clone, Default)]
pub struct UpdateCaseNoteInput {
    /// Heading.
    pub title: Option<String>,
    /// Note text.
    pub body: Option<String>,
    /// Category.
    pub category: Option<CaseNoteCategory>,
    /// Replacement tags.
    pub tags: Option<Vec<String>>,
}

/// Case note repository.
#[derive(Debug, Clone)]
pub struct CaseNoteRepository {
    db: DatabaseConnection,
}

impl CaseNoteRepository {
    /// Creates a new case note repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a case note.
    ///
    /// # Errors
    ///
    /// Returns an error if the client is not in the tenant, the tags are
    /// invalid, or the insert fails. A shift from another tenant is rejected
    /// by the database.
    pub async fn create(&self, input: CreateCaseNoteInput) -> Result<case_notes::Model, CaseNoteError> {
        let tags = records::normalize_tags(&input.tags)?;
        if !client_in_tenant(&self.db, input.tenant_id, input.client_id).await? {
            return Err(CaseNoteError::ClientNotFound(input.client_id));
        }

        let now = Utc::now().into();
        let note = case_notes::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(input.tenant_id),
            client_id: Set(input.client_id),
            author_id: Set(Some(input.author_id)),
            shift_id: Set(input.shift_id),
            title: Set(input.title),
            body: Set(input.body),
            category: Set(input.category.into()),
            tags: Set(serde_json::json!(tags)),
            archived_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        Ok(note)
    }

    /// Finds a case note within a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<case_notes::Model>, DbErr> {
        case_notes::Entity::find_by_id(id)
            .filter(case_notes::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await
    }

    /// Lists a client's notes, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_client(
        &self,
        tenant_id: Uuid,
        client_id: Uuid,
        include_archived: bool,
    ) -> Result<Vec<case_notes::Model>, DbErr> {
        let mut query = case_notes::Entity::find()
            .filter(case_notes::Column::TenantId.eq(tenant_id))
            .filter(case_notes::Column::ClientId.eq(client_id));

        if !include_archived {
            query = query.filter(case_notes::Column::ArchivedAt.is_null());
        }

        query
            .order_by_desc(case_notes::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns an error if the note is missing or archived, or the tags are invalid.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateCaseNoteInput,
    ) -> Result<case_notes::Model, CaseNoteError> {
        let existing = self
            .find(tenant_id, id)
            .await?
            .ok_or(CaseNoteError::NotFound(id))?;

        if existing.archived_at.is_some() {
            return Err(RecordError::Archived.into());
        }

        let mut note: case_notes::ActiveModel = existing.into();
        if let Some(tags) = input.tags {
            note.tags = Set(serde_json::json!(records::normalize_tags(&tags)?));
        }
        if let Some(title) = input.title {
            note.title = Set(title);
        }
        if let Some(body) = input.body {
            note.body = Set(body);
        }
        if let Some(category) = input.category {
            note.category = Set(category.into());
        }
        note.updated_at = Set(Utc::now().into());

        Ok(note.update(&self.db).await?)
    }

    /// Archives a note. Archiving twice keeps the first timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the note is missing or the update fails.
    pub async fn archive(&self, tenant_id: Uuid, id: Uuid) -> Result<case_notes::Model, CaseNoteError> {
        let existing = self
            .find(tenant_id, id)
            .await?
            .ok_or(CaseNoteError::NotFound(id))?;

        if existing.archived_at.is_some() {
            return Ok(existing);
        }

        let now = Utc::now().into();
        let mut note: case_notes::ActiveModel = existing.into();
        note.archived_at = Set(Some(now));
        note.updated_at = Set(now);

        Ok(note.update(&self.db).await?)
    }
}
