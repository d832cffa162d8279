//! User repository for database operations.
//!
//! Users belong to exactly one tenant; emails are unique per tenant.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{sea_orm_active_enums::UserRole, users};

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Tenant the user belongs to.
    pub tenant_id: Uuid,
    /// Login email.
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Display name.
    pub full_name: String,
    /// Staff role.
    pub role: UserRole,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email within a tenant. Emails compare case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::TenantId.eq(tenant_id))
            .filter(users::Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID regardless of tenant.
    ///
    /// Only the session guard uses this, to compare the user's tenant with the
    /// session's.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds a user within a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_in_tenant(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id)
            .filter(users::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await
    }

    /// Creates a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (e.g. duplicate email in tenant).
    pub async fn create(&self, input: CreateUserInput) -> Result<users::Model, DbErr> {
        let now = Utc::now().into();

        users::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(input.tenant_id),
            email: Set(input.email.trim().to_lowercase()),
            password_hash: Set(input.password_hash),
            full_name: Set(input.full_name),
            role: Set(input.role),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
    }

    /// Lists a tenant's staff by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_staff(
        &self,
        tenant_id: Uuid,
        active_only: bool,
    ) -> Result<Vec<users::Model>, DbErr> {
        let mut query = users::Entity::find().filter(users::Column::TenantId.eq(tenant_id));
        if active_only {
            query = query.filter(users::Column::IsActive.eq(true));
        }

        query
            .order_by_asc(users::Column::FullName)
            .all(&self.db)
            .await
    }
}
