//! Staff routes.
//!
//! Listing is open to roster managers; adding staff is admin-only.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use validator::Validate;

use carebase_core::auth::{UserRole, check_password_policy, hash_password};
use carebase_db::{UserRepository, entities::users, repositories::CreateUserInput};

use crate::{AppState, error::ApiResult, middleware::AuthSession};

/// Creates the staff routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/staff", get(list_staff).post(create_staff))
}

/// Query parameters for listing staff.
#[derive(Debug, Default, Deserialize)]
pub struct ListStaffQuery {
    /// Include deactivated accounts.
    #[serde(default)]
    pub include_inactive: bool,
}

/// Request body for adding a staff member.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateStaffRequest {
    /// Login email.
    #[validate(email)]
    pub email: String,
    /// Display name.
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    /// Role.
    pub role: UserRole,
    /// Initial password.
    pub password: String,
}

/// GET /staff - List the tenant's staff.
async fn list_staff(
    State(state): State<AppState>,
    auth: AuthSession,
    Query(query): Query<ListStaffQuery>,
) -> ApiResult<Json<Vec<users::Model>>> {
    auth.require_roster()?;

    let staff = UserRepository::new((*state.db).clone())
        .list_staff(auth.tenant_id, !query.include_inactive)
        .await?;
    Ok(Json(staff))
}

/// POST /staff - Add a staff member.
async fn create_staff(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(payload): Json<CreateStaffRequest>,
) -> ApiResult<(StatusCode, Json<users::Model>)> {
    auth.require_staff()?;
    payload.validate()?;
    check_password_policy(&payload.password)?;

    let user = UserRepository::new((*state.db).clone())
        .create(CreateUserInput {
            tenant_id: auth.tenant_id,
            email: payload.email,
            password_hash: hash_password(&payload.password)?,
            full_name: payload.full_name,
            role: payload.role.into(),
        })
        .await?;

    tracing::info!(tenant_id = %auth.tenant_id, user_id = %user.id, role = %payload.role.as_str(), "Staff member added");
    Ok((StatusCode::CREATED, Json(user)))
}
