//! Session middleware for protected routes.
//!
//! The session cookie holds a random token. Each request re-loads the user
//! behind the session so a deactivated account, or one that no longer belongs
//! to the session's tenant, is locked out immediately.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::USER_AGENT, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use carebase_core::auth::UserRole;
use carebase_db::{
    SessionRepository, UserRepository,
    entities::{sessions, users},
};
use carebase_shared::SessionConfig;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
};

/// The authenticated caller, stored in request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthSession {
    /// Session row.
    pub session_id: Uuid,
    /// Signed-in user.
    pub user_id: Uuid,
    /// Tenant every query is scoped to.
    pub tenant_id: Uuid,
    /// User's role, as loaded for this request.
    pub role: UserRole,
}

impl AuthSession {
    /// Requires a role that manages rosters.
    ///
    /// # Errors
    ///
    /// Returns 403 otherwise.
    pub fn require_roster(&self) -> ApiResult<()> {
        if self.role.can_manage_roster() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Roster management requires a coordinator or admin"))
        }
    }

    /// Requires a role that manages billing.
    ///
    /// # Errors
    ///
    /// Returns 403 otherwise.
    pub fn require_billing(&self) -> ApiResult<()> {
        if self.role.can_manage_billing() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Billing requires a coordinator or admin"))
        }
    }

    /// Requires a role that manages staff.
    ///
    /// # Errors
    ///
    /// Returns 403 otherwise.
    pub fn require_staff(&self) -> ApiResult<()> {
        if self.role.can_manage_staff() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Staff management requires an admin"))
        }
    }
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Builds the session cookie for a freshly issued token.
#[must_use]
pub fn session_cookie(config: &SessionConfig, token: String) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookie)
        .same_site(SameSite::Lax)
        .build()
}

/// Builds a cookie that clears the session cookie.
#[must_use]
pub fn removal_cookie(config: &SessionConfig) -> Cookie<'static> {
    Cookie::build(config.cookie_name.clone()).path("/").build()
}

/// Reads the client's user agent for the session record.
#[must_use]
pub fn user_agent(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_AGENT).and_then(|v| v.to_str().ok())
}

/// Reads the client address from `X-Forwarded-For`, first hop only.
#[must_use]
pub fn client_ip(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Why a session may no longer be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    UserMissing,
    UserInactive,
    TenantMismatch,
}

impl Rejection {
    const fn as_str(self) -> &'static str {
        match self {
            Self::UserMissing => "user_missing",
            Self::UserInactive => "user_inactive",
            Self::TenantMismatch => "tenant_mismatch",
        }
    }
}

fn check_session_user(
    session: &sessions::Model,
    user: Option<&users::Model>,
) -> Result<UserRole, Rejection> {
    let user = user.ok_or(Rejection::UserMissing)?;
    if user.tenant_id != session.tenant_id {
        return Err(Rejection::TenantMismatch);
    }
    if !user.is_active {
        return Err(Rejection::UserInactive);
    }
    Ok(user.role.into())
}

/// Session middleware.
///
/// 1. Reads the session cookie and loads the active session it names
/// 2. Re-loads the user and checks it exists, is active and is in the session's tenant
/// 3. Stores an [`AuthSession`] in request extensions
///
/// A session failing step 2 is revoked and the cookie cleared.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let unauthorized = |jar: CookieJar, message: &str| {
        (
            jar.remove(removal_cookie(&state.session)),
            ApiError::unauthorized(message),
        )
            .into_response()
    };

    let Some(token) = jar.get(&state.session.cookie_name).map(|c| c.value().to_string()) else {
        return ApiError::unauthorized("Authentication required").into_response();
    };

    let sessions = SessionRepository::new((*state.db).clone());
    let session = match sessions.find_active(&token).await {
        Ok(Some(session)) => session,
        Ok(None) => return unauthorized(jar, "Session expired, please sign in again"),
        Err(e) => return ApiError::from(e).into_response(),
    };

    let user = match UserRepository::new((*state.db).clone())
        .find_by_id(session.user_id)
        .await
    {
        Ok(user) => user,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let role = match check_session_user(&session, user.as_ref()) {
        Ok(role) => role,
        Err(reason) => {
            tracing::warn!(
                session_id = %session.id,
                user_id = %session.user_id,
                session_tenant_id = %session.tenant_id,
                user_tenant_id = ?user.as_ref().map(|u| u.tenant_id),
                reason = reason.as_str(),
                "Session rejected, revoking"
            );
            if let Err(e) = sessions.revoke(session.id).await {
                tracing::error!(error = %e, session_id = %session.id, "Failed to revoke session");
            }
            return unauthorized(jar, "Session is no longer valid");
        }
    };

    request.extensions_mut().insert(AuthSession {
        session_id: session.id,
        user_id: session.user_id,
        tenant_id: session.tenant_id,
        role,
    });

    next.run(request).await
}
