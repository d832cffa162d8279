//! Client routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use carebase_db::{
    ClientRepository,
    entities::clients,
    repositories::{ClientFilter, CreateClientInput, UpdateClientInput},
};
use carebase_shared::types::{PageRequest, PageResponse};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthSession,
};

/// Creates the client routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route("/clients/{client_id}", get(get_client).patch(update_client))
        .route("/clients/{client_id}/archive", post(archive_client))
}

/// Query parameters for listing clients.
#[derive(Debug, Deserialize)]
pub struct ListClientsQuery {
    /// Filter by active status.
    pub active: Option<bool>,
    /// Name or NDIS number search.
    pub search: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for creating a client.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateClientRequest {
    /// Given name.
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    /// Family name.
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    /// NDIS participant number.
    #[validate(length(min = 1, max = 20))]
    pub ndis_number: Option<String>,
    /// Date of birth.
    pub date_of_birth: Option<NaiveDate>,
    /// Contact phone.
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    /// Postal address.
    #[validate(length(max = 500))]
    pub address: Option<String>,
}

/// Request body for updating a client. Omitted fields stay unchanged; `null`
/// clears an optional field.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateClientRequest {
    /// Given name.
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    /// Family name.
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    /// NDIS participant number.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub ndis_number: Option<Option<String>>,
    /// Date of birth.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub date_of_birth: Option<Option<NaiveDate>>,
    /// Contact phone.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub phone: Option<Option<String>>,
    /// Postal address.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub address: Option<Option<String>>,
}

/// GET /clients - List clients, one page at a time.
async fn list_clients(
    State(state): State<AppState>,
    auth: AuthSession,
    Query(query): Query<ListClientsQuery>,
) -> ApiResult<Json<PageResponse<clients::Model>>> {
    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };
    let filter = ClientFilter {
        is_active: query.active,
        search: query.search,
    };

    let clients = ClientRepository::new((*state.db).clone())
        .list(auth.tenant_id, filter, &page)
        .await?;
    Ok(Json(clients))
}

/// POST /clients - Create a client.
async fn create_client(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(payload): Json<CreateClientRequest>,
) -> ApiResult<(StatusCode, Json<clients::Model>)> {
    auth.require_roster()?;
    payload.validate()?;

    let client = ClientRepository::new((*state.db).clone())
        .create(CreateClientInput {
            tenant_id: auth.tenant_id,
            first_name: payload.first_name.trim().to_string(),
            last_name: payload.last_name.trim().to_string(),
            ndis_number: payload.ndis_number,
            date_of_birth: payload.date_of_birth,
            phone: payload.phone,
            address: payload.address,
        })
        .await?;

    tracing::info!(tenant_id = %auth.tenant_id, client_id = %client.id, "Client created");
    Ok((StatusCode::CREATED, Json(client)))
}

/// GET /clients/{client_id} - Get a client.
async fn get_client(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(client_id): Path<Uuid>,
) -> ApiResult<Json<clients::Model>> {
    ClientRepository::new((*state.db).clone())
        .find(auth.tenant_id, client_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Client"))
}

/// PATCH /clients/{client_id} - Update a client.
async fn update_client(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<UpdateClientRequest>,
) -> ApiResult<Json<clients::Model>> {
    auth.require_roster()?;
    payload.validate()?;

    let input = UpdateClientInput {
        first_name: payload.first_name,
        last_name: payload.last_name,
        ndis_number: payload.ndis_number,
        date_of_birth: payload.date_of_birth,
        phone: payload.phone,
        address: payload.address,
    };

    ClientRepository::new((*state.db).clone())
        .update(auth.tenant_id, client_id, input)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Client"))
}

/// POST /clients/{client_id}/archive - Archive a client.
async fn archive_client(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(client_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    auth.require_roster()?;

    if ClientRepository::new((*state.db).clone())
        .archive(auth.tenant_id, client_id)
        .await?
    {
        tracing::info!(tenant_id = %auth.tenant_id, client_id = %client_id, "Client archived");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Client"))
    }
}
