//! Authentication routes for login, logout and the current user.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use carebase_core::auth::{UserRole, verify_password};
use carebase_db::{
    SessionRepository, TenantRepository, UserRepository,
    entities::{tenants, users},
};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::{
        AuthSession,
        session::{client_ip, removal_cookie, session_cookie, user_agent},
    },
};

const INVALID_CREDENTIALS: &str = "Invalid organisation, email or password";

/// Creates the public auth routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

/// Creates the auth routes that need a session.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

/// Login request body.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Tenant slug.
    #[validate(length(min = 1, max = 100))]
    pub tenant: String,
    /// Login email.
    #[validate(email)]
    pub email: String,
    /// Password.
    #[validate(length(min = 1))]
    pub password: String,
}

/// Tenant summary returned with the user.
#[derive(Debug, Serialize)]
pub struct TenantSummary {
    /// Tenant ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// URL slug.
    pub slug: String,
}

impl From<tenants::Model> for TenantSummary {
    fn from(tenant: tenants::Model) -> Self {
        Self {
            id: tenant.id,
            name: tenant.name,
            slug: tenant.slug,
        }
    }
}

/// The signed-in user.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// User record.
    pub user: users::Model,
    /// User's tenant.
    pub tenant: TenantSummary,
    /// Role as used for permission checks.
    pub role: UserRole,
}

/// POST /auth/login - Verify credentials and start a session.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;

    let Some(tenant) = TenantRepository::new((*state.db).clone())
        .find_by_slug(&payload.tenant)
        .await?
    else {
        info!(tenant = %payload.tenant, "Login attempt for unknown tenant");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    let Some(user) = UserRepository::new((*state.db).clone())
        .find_by_email(tenant.id, &payload.email)
        .await?
    else {
        info!(tenant_id = %tenant.id, "Login attempt for non-existent user");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    if !user.is_active {
        info!(user_id = %user.id, "Login attempt for deactivated user");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    if !verify_password(&payload.password, &user.password_hash)? {
        info!(user_id = %user.id, "Failed login attempt - invalid password");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let created = SessionRepository::new((*state.db).clone())
        .create(
            tenant.id,
            user.id,
            Duration::hours(state.session.ttl_hours),
            user_agent(&headers),
            client_ip(&headers),
        )
        .await?;

    info!(user_id = %user.id, tenant_id = %tenant.id, "User logged in");

    let role = user.role.into();
    let jar = jar.add(session_cookie(&state.session, created.token));
    Ok((
        jar,
        Json(MeResponse {
            user,
            tenant: tenant.into(),
            role,
        }),
    ))
}

/// POST /auth/logout - End the current session.
async fn logout(
    State(state): State<AppState>,
    auth: AuthSession,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    SessionRepository::new((*state.db).clone())
        .revoke(auth.session_id)
        .await?;

    info!(user_id = %auth.user_id, "User logged out");
    Ok((jar.remove(removal_cookie(&state.session)), StatusCode::NO_CONTENT))
}

/// GET /auth/me - The signed-in user and tenant.
async fn me(State(state): State<AppState>, auth: AuthSession) -> ApiResult<Json<MeResponse>> {
    let user = UserRepository::new((*state.db).clone())
        .find_in_tenant(auth.tenant_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    let tenant = TenantRepository::new((*state.db).clone())
        .find_by_id(auth.tenant_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tenant"))?;

    Ok(Json(MeResponse {
        user,
        tenant: tenant.into(),
        role: auth.role,
    }))
}
