//! Medication record routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use carebase_db::{
    MedicationRepository, entities::medication_records, repositories::RecordMedicationInput,
};

use crate::{AppState, error::ApiResult, middleware::AuthSession};

/// Creates the medication routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/clients/{client_id}/medications",
        get(list_medications).post(record_medication),
    )
}

/// Request body for recording a medication.
#[derive(Debug, Deserialize, Validate)]
pub struct RecordMedicationRequest {
    /// Medication name.
    #[validate(length(min = 1, max = 200))]
    pub medication_name: String,
    /// Dose given.
    #[validate(length(min = 1, max = 100))]
    pub dosage: String,
    /// Route of administration.
    #[validate(length(max = 50))]
    pub route: Option<String>,
    /// When it was given.
    pub administered_at: NaiveDateTime,
    /// Notes.
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// GET /clients/{client_id}/medications - List a client's medication records.
async fn list_medications(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(client_id): Path<Uuid>,
) -> ApiResult<Json<Vec<medication_records::Model>>> {
    let records = MedicationRepository::new((*state.db).clone())
        .list_for_client(auth.tenant_id, client_id)
        .await?;
    Ok(Json(records))
}

/// POST /clients/{client_id}/medications - Record an administered medication.
async fn record_medication(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<RecordMedicationRequest>,
) -> ApiResult<(StatusCode, Json<medication_records::Model>)> {
    payload.validate()?;

    let record = MedicationRepository::new((*state.db).clone())
        .record(RecordMedicationInput {
            tenant_id: auth.tenant_id,
            client_id,
            recorded_by: auth.user_id,
            medication_name: payload.medication_name,
            dosage: payload.dosage,
            route: payload.route,
            administered_at: payload.administered_at,
            notes: payload.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}
