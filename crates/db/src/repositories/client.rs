//! Client repository for database operations.
//!
//! Clients are never deleted through the API; archiving clears `is_active`.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use carebase_shared::types::{PageRequest, PageResponse};

use crate::entities::clients;

/// Input for creating a client.
#[derive(Debug, Clone)]
pub struct CreateClientInput {
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// NDIS participant number.
    pub ndis_number: Option<String>,
    /// Date of birth.
    pub date_of_birth: Option<NaiveDate>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
}

/// Input for updating a client. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateClientInput {
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// NDIS participant number.
    pub ndis_number: Option<Option<String>>,
    /// Date of birth.
    pub date_of_birth: Option<Option<NaiveDate>>,
    /// Contact phone.
    pub phone: Option<Option<String>>,
    /// Postal address.
    pub address: Option<Option<String>>,
}

/// Filter options for listing clients.
#[derive(Debug, Clone, Default)]
pub struct ClientFilter {
    /// Only active (`true`) or archived (`false`) clients.
    pub is_active: Option<bool>,
    /// Case-insensitive match on name or NDIS number.
    pub search: Option<String>,
}

/// Returns true if the client exists in the tenant.
pub(crate) async fn client_in_tenant<C>(db: &C, tenant_id: Uuid, client_id: Uuid) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let count = clients::Entity::find_by_id(client_id)
        .filter(clients::Column::TenantId.eq(tenant_id))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Client repository.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    db: DatabaseConnection,
}

impl ClientRepository {
    /// Creates a new client repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (e.g. duplicate NDIS number).
    pub async fn create(&self, input: CreateClientInput) -> Result<clients::Model, DbErr> {
        let now = Utc::now().into();

        clients::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(input.tenant_id),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            ndis_number: Set(input.ndis_number),
            date_of_birth: Set(input.date_of_birth),
            phone: Set(input.phone),
            address: Set(input.address),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
    }

    /// Finds a client within a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<clients::Model>, DbErr> {
        clients::Entity::find_by_id(id)
            .filter(clients::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await
    }

    /// Lists clients by name, one page at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: ClientFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<clients::Model>, DbErr> {
        let mut query = clients::Entity::find().filter(clients::Column::TenantId.eq(tenant_id));

        if let Some(is_active) = filter.is_active {
            query = query.filter(clients::Column::IsActive.eq(is_active));
        }

        if let Some(search) = filter.search.filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            query = query.filter(
                Condition::any()
                    .add(clients::Column::FirstName.like(pattern.clone()))
                    .add(clients::Column::LastName.like(pattern.clone()))
                    .add(clients::Column::NdisNumber.like(pattern)),
            );
        }

        let paginator = query
            .order_by_asc(clients::Column::LastName)
            .order_by_asc(clients::Column::FirstName)
            .paginate(&self.db, page.page_size());

        let total = paginator.num_items().await?;
        let data = paginator.fetch_page(page.page_index()).await?;

        Ok(PageResponse::new(data, page, total))
    }

    /// Applies a partial update. Returns `None` if the client is not in the tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateClientInput,
    ) -> Result<Option<clients::Model>, DbErr> {
        let Some(existing) = self.find(tenant_id, id).await? else {
            return Ok(None);
        };

        let mut client: clients::ActiveModel = existing.into();
        if let Some(first_name) = input.first_name {
            client.first_name = Set(first_name);
        }
        if let Some(last_name) = input.last_name {
            client.last_name = Set(last_name);
        }
        if let Some(ndis_number) = input.ndis_number {
            client.ndis_number = Set(ndis_number);
        }
        if let Some(date_of_birth) = input.date_of_birth {
            client.date_of_birth = Set(date_of_birth);
        }
        if let Some(phone) = input.phone {
            client.phone = Set(phone);
        }
        if let Some(address) = input.address {
            client.address = Set(address);
        }
        client.updated_at = Set(Utc::now().into());

        client.update(&self.db).await.map(Some)
    }

    /// Archives a client. Returns `false` if the client is not in the tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn archive(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, DbErr> {
        let result = clients::Entity::update_many()
            .col_expr(clients::Column::IsActive, false.into())
            .col_expr(clients::Column::UpdatedAt, Utc::now().into())
            .filter(clients::Column::Id.eq(id))
            .filter(clients::Column::TenantId.eq(tenant_id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
