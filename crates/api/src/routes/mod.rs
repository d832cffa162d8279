//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::session_middleware};

pub mod auth;
pub mod care_plans;
pub mod case_notes;
pub mod clients;
pub mod health;
pub mod invoices;
pub mod medications;
pub mod shifts;
pub mod staff;

/// Creates the API router with public routes and session-protected routes.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(clients::routes())
        .merge(case_notes::routes())
        .merge(medications::routes())
        .merge(care_plans::routes())
        .merge(shifts::routes())
        .merge(invoices::routes())
        .merge(staff::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}
