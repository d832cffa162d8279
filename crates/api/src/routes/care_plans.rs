//! Care support plan routes.
//!
//! Plans are written and maintained by coordinators; every staff member can read them.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use carebase_core::records::CarePlanStatus;
use carebase_db::{
    CarePlanRepository,
    entities::care_plans,
    repositories::{CreateCarePlanInput, UpdateCarePlanInput},
};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthSession,
};

/// Creates the care plan routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clients/{client_id}/care-plans", get(list_care_plans))
        .route("/care-support-plans", post(create_care_plan))
        .route(
            "/care-support-plans/{plan_id}",
            get(get_care_plan).patch(update_care_plan),
        )
        .route("/care-support-plans/{plan_id}/status", post(set_care_plan_status))
}

/// Request body for creating a care plan.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCarePlanRequest {
    /// Client the plan supports.
    pub client_id: Uuid,
    /// Heading.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Overview.
    #[validate(length(max = 5000))]
    pub summary: Option<String>,
    /// Support goals.
    #[serde(default)]
    pub goals: Vec<String>,
    /// Date the plan takes effect.
    pub start_date: NaiveDate,
    /// Next review.
    pub review_date: Option<NaiveDate>,
}

/// Request body for updating a care plan.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCarePlanRequest {
    /// Heading.
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    /// Overview, or `null` to clear.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub summary: Option<Option<String>>,
    /// Replacement goals.
    pub goals: Option<Vec<String>>,
    /// Start date.
    pub start_date: Option<NaiveDate>,
    /// Review date, or `null` to clear.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub review_date: Option<Option<NaiveDate>>,
}

/// Request body for a status change.
#[derive(Debug, Deserialize)]
pub struct CarePlanStatusRequest {
    /// Target status: draft, active or archived.
    pub status: CarePlanStatus,
}

/// GET /clients/{client_id}/care-plans - List a client's plans.
async fn list_care_plans(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(client_id): Path<Uuid>,
) -> ApiResult<Json<Vec<care_plans::Model>>> {
    let plans = CarePlanRepository::new((*state.db).clone())
        .list_for_client(auth.tenant_id, client_id)
        .await?;
    Ok(Json(plans))
}

/// POST /care-support-plans - Create a draft plan.
async fn create_care_plan(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(payload): Json<CreateCarePlanRequest>,
) -> ApiResult<(StatusCode, Json<care_plans::Model>)> {
    auth.require_roster()?;
    payload.validate()?;

    let plan = CarePlanRepository::new((*state.db).clone())
        .create(CreateCarePlanInput {
            tenant_id: auth.tenant_id,
            client_id: payload.client_id,
            author_id: auth.user_id,
            title: payload.title,
            summary: payload.summary,
            goals: payload.goals,
            start_date: payload.start_date,
            review_date: payload.review_date,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(plan)))
}

/// GET /care-support-plans/{plan_id} - Get a plan.
async fn get_care_plan(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(plan_id): Path<Uuid>,
) -> ApiResult<Json<care_plans::Model>> {
    CarePlanRepository::new((*state.db).clone())
        .find(auth.tenant_id, plan_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Care plan"))
}

/// PATCH /care-support-plans/{plan_id} - Edit a draft or active plan.
async fn update_care_plan(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(plan_id): Path<Uuid>,
    Json(payload): Json<UpdateCarePlanRequest>,
) -> ApiResult<Json<care_plans::Model>> {
    auth.require_roster()?;
    payload.validate()?;

    let plan = CarePlanRepository::new((*state.db).clone())
        .update(
            auth.tenant_id,
            plan_id,
            UpdateCarePlanInput {
                title: payload.title,
                summary: payload.summary,
                goals: payload.goals,
                start_date: payload.start_date,
                review_date: payload.review_date,
            },
        )
        .await?;
    Ok(Json(plan))
}

/// POST /care-support-plans/{plan_id}/status - Activate or archive a plan.
async fn set_care_plan_status(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(plan_id): Path<Uuid>,
    Json(payload): Json<CarePlanStatusRequest>,
) -> ApiResult<Json<care_plans::Model>> {
    auth.require_roster()?;

    let plan = CarePlanRepository::new((*state.db).clone())
        .set_status(auth.tenant_id, plan_id, payload.status)
        .await?;
    Ok(Json(plan))
}
