//! Tenant repository for database operations.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entities::tenants;

/// Tenant repository.
#[derive(Debug, Clone)]
pub struct TenantRepository {
    db: DatabaseConnection,
}

impl TenantRepository {
    /// Creates a new tenant repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an active tenant by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<tenants::Model>, DbErr> {
        tenants::Entity::find()
            .filter(tenants::Column::Slug.eq(slug.to_lowercase()))
            .filter(tenants::Column::IsActive.eq(true))
            .one(&self.db)
            .await
    }

    /// Finds a tenant by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<tenants::Model>, DbErr> {
        tenants::Entity::find_by_id(id).one(&self.db).await
    }

    /// Creates a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (e.g. duplicate slug).
    pub async fn create(&self, name: &str, slug: &str) -> Result<tenants::Model, DbErr> {
        let now = Utc::now().into();

        tenants::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name.to_string()),
            slug: Set(slug.to_lowercase()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
    }
}
