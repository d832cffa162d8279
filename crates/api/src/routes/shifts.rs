//! Shift routes: rostering, recurring series and the clash check.
//!
//! Coordinators and admins manage the roster. A support worker may request an
//! open shift, withdraw their own request, and start or complete a shift they
//! are assigned to.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use carebase_core::roster::{
    self, RecurrenceRule, SeriesClash, ShiftStatus, TimeRange, find_clashes, find_series_clashes,
};
use carebase_db::{
    ShiftRepository,
    entities::shifts,
    repositories::{CreateShiftInput, ShiftFilter, UpdateShiftInput},
};
use carebase_shared::types::ShiftId;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthSession,
};

/// Creates the shift routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shifts", get(list_shifts).post(create_shifts))
        .route("/shifts/check-clash", post(check_clash))
        .route("/shifts/series/{series_id}/cancel", post(cancel_series))
        .route("/shifts/{shift_id}", get(get_shift).patch(update_shift))
        .route("/shifts/{shift_id}/status", post(change_status))
}

/// Query parameters for listing shifts.
#[derive(Debug, Default, Deserialize)]
pub struct ListShiftsQuery {
    /// Shifts ending after this time.
    pub from: Option<NaiveDateTime>,
    /// Shifts starting before this time.
    pub to: Option<NaiveDateTime>,
    /// Assigned staff member.
    pub assigned_user_id: Option<Uuid>,
    /// Only the caller's own shifts.
    #[serde(default)]
    pub mine: bool,
    /// Client.
    pub client_id: Option<Uuid>,
    /// Status.
    pub status: Option<ShiftStatus>,
    /// Series.
    pub series_id: Option<Uuid>,
}

/// Request body for creating a shift. With `recurrence` set, the shift is the
/// first of a series.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateShiftRequest {
    /// Short description.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Client receiving support.
    pub client_id: Option<Uuid>,
    /// Staff member rostered on.
    pub assigned_user_id: Option<Uuid>,
    /// Start (wall clock).
    pub start_time: NaiveDateTime,
    /// End (wall clock).
    pub end_time: NaiveDateTime,
    /// Notes.
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    /// Repeat rule.
    pub recurrence: Option<RecurrenceRule>,
}

/// Request body for updating a shift.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateShiftRequest {
    /// Short description.
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    /// Client, or `null` to clear.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub client_id: Option<Option<Uuid>>,
    /// Assignee, or `null` to unassign.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub assigned_user_id: Option<Option<Uuid>>,
    /// Start.
    pub start_time: Option<NaiveDateTime>,
    /// End.
    pub end_time: Option<NaiveDateTime>,
    /// Notes, or `null` to clear.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub notes: Option<Option<String>>,
}

/// Request body for a status change.
#[derive(Debug, Deserialize)]
pub struct ShiftStatusRequest {
    /// Target status.
    pub status: ShiftStatus,
}

/// Request body for cancelling a series.
#[derive(Debug, Default, Deserialize)]
pub struct CancelSeriesRequest {
    /// Cancel shifts starting at or after this time. Defaults to the whole series.
    #[serde(default)]
    pub from: Option<NaiveDateTime>,
}

/// Request body for the clash check.
#[derive(Debug, Deserialize)]
pub struct CheckClashRequest {
    /// Staff member to check.
    pub assigned_user_id: Uuid,
    /// Proposed start.
    pub start_time: NaiveDateTime,
    /// Proposed end.
    pub end_time: NaiveDateTime,
    /// Shift being edited, ignored in the check.
    pub exclude_shift_id: Option<Uuid>,
    /// Check every occurrence of this repeat rule.
    pub recurrence: Option<RecurrenceRule>,
}

/// Result of the clash check.
#[derive(Debug, Serialize)]
pub struct ClashResponse {
    /// True if any clash was found.
    pub has_clash: bool,
    /// Each clash, by proposed occurrence (0 for a single shift).
    pub clashes: Vec<SeriesClash>,
}

/// Created shifts: a single shift, or a whole series.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CreatedShifts {
    /// One shift.
    One(shifts::Model),
    /// A recurring series.
    Series {
        /// Identifier shared by the series.
        series_id: Uuid,
        /// Number of shifts created.
        count: usize,
        /// The shifts in start order.
        shifts: Vec<shifts::Model>,
    },
}

/// Returns true if the caller may move a shift from `current` to `to`.
fn may_change_status(
    auth: &AuthSession,
    assignee: Option<Uuid>,
    current: ShiftStatus,
    to: ShiftStatus,
) -> bool {
    if auth.role.can_manage_roster() {
        return true;
    }

    let own = assignee == Some(auth.user_id);
    match to {
        ShiftStatus::Requested => current == ShiftStatus::Unassigned,
        ShiftStatus::Unassigned => own && current == ShiftStatus::Requested,
        ShiftStatus::InProgress | ShiftStatus::Completed => own,
        ShiftStatus::Assigned | ShiftStatus::Cancelled => false,
    }
}

/// GET /shifts - List shifts in start order.
async fn list_shifts(
    State(state): State<AppState>,
    auth: AuthSession,
    Query(query): Query<ListShiftsQuery>,
) -> ApiResult<Json<Vec<shifts::Model>>> {
    let filter = ShiftFilter {
        from: query.from,
        to: query.to,
        assigned_user_id: if query.mine {
            Some(auth.user_id)
        } else {
            query.assigned_user_id
        },
        client_id: query.client_id,
        status: query.status.map(Into::into),
        series_id: query.series_id,
    };

    let shifts = ShiftRepository::new((*state.db).clone())
        .list(auth.tenant_id, filter)
        .await?;
    Ok(Json(shifts))
}

/// POST /shifts - Create a shift or a recurring series.
async fn create_shifts(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(payload): Json<CreateShiftRequest>,
) -> ApiResult<(StatusCode, Json<CreatedShifts>)> {
    auth.require_roster()?;
    payload.validate()?;

    let repo = ShiftRepository::new((*state.db).clone());
    let input = CreateShiftInput {
        tenant_id: auth.tenant_id,
        title: payload.title,
        client_id: payload.client_id,
        assigned_user_id: payload.assigned_user_id,
        start_time: payload.start_time,
        end_time: payload.end_time,
        notes: payload.notes,
        created_by: Some(auth.user_id),
    };

    let created = match payload.recurrence {
        Some(rule) => {
            let series = repo.create_series(input, rule).await?;
            CreatedShifts::Series {
                series_id: series.series_id,
                count: series.shifts.len(),
                shifts: series.shifts,
            }
        }
        None => CreatedShifts::One(repo.create_one(input).await?),
    };

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /shifts/{shift_id} - Get a shift.
async fn get_shift(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(shift_id): Path<Uuid>,
) -> ApiResult<Json<shifts::Model>> {
    ShiftRepository::new((*state.db).clone())
        .find(auth.tenant_id, shift_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Shift"))
}

/// PATCH /shifts/{shift_id} - Edit a shift.
async fn update_shift(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(shift_id): Path<Uuid>,
    Json(payload): Json<UpdateShiftRequest>,
) -> ApiResult<Json<shifts::Model>> {
    auth.require_roster()?;
    payload.validate()?;

    let shift = ShiftRepository::new((*state.db).clone())
        .update(
            auth.tenant_id,
            shift_id,
            UpdateShiftInput {
                title: payload.title,
                client_id: payload.client_id,
                assigned_user_id: payload.assigned_user_id,
                start_time: payload.start_time,
                end_time: payload.end_time,
                notes: payload.notes,
            },
        )
        .await?;
    Ok(Json(shift))
}

/// POST /shifts/{shift_id}/status - Move a shift through its lifecycle.
async fn change_status(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(shift_id): Path<Uuid>,
    Json(payload): Json<ShiftStatusRequest>,
) -> ApiResult<Json<shifts::Model>> {
    let repo = ShiftRepository::new((*state.db).clone());

    // Permission is judged against the locked row, not an earlier read.
    let shift = repo
        .transition_if(auth.tenant_id, shift_id, payload.status, auth.user_id, |shift| {
            may_change_status(&auth, shift.assigned_user_id, shift.status.into(), payload.status)
        })
        .await?;
    Ok(Json(shift))
}

/// POST /shifts/series/{series_id}/cancel - Cancel the rest of a series.
async fn cancel_series(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(series_id): Path<Uuid>,
    Json(payload): Json<CancelSeriesRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    auth.require_roster()?;
    let repo = ShiftRepository::new((*state.db).clone());

    if !repo.series_exists(auth.tenant_id, series_id).await? {
        return Err(ApiError::not_found("Shift series"));
    }

    let cancelled = repo
        .cancel_series(auth.tenant_id, series_id, payload.from)
        .await?;

    Ok(Json(serde_json::json!({
        "series_id": series_id,
        "cancelled": cancelled,
    })))
}

/// POST /shifts/check-clash - Report overlaps with the staff member's roster.
///
/// Advisory only; creating a shift never checks for clashes.
async fn check_clash(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(payload): Json<CheckClashRequest>,
) -> ApiResult<Json<ClashResponse>> {
    let proposed = TimeRange::new(payload.start_time, payload.end_time)?;
    let repo = ShiftRepository::new((*state.db).clone());

    let clashes = match payload.recurrence {
        Some(rule) => {
            let occurrences =
                roster::expand(proposed.start, proposed.end - proposed.start, rule)?;
            let window_end = occurrences.last().map_or(proposed.end, |o| o.end);
            let booked = repo
                .booked_for_user(auth.tenant_id, payload.assigned_user_id, proposed.start, window_end)
                .await?;
            find_series_clashes(&occurrences, &booked)
        }
        None => {
            let booked = repo
                .booked_for_user(auth.tenant_id, payload.assigned_user_id, proposed.start, proposed.end)
                .await?;
            find_clashes(&proposed, &booked, payload.exclude_shift_id.map(ShiftId::from_uuid))
                .into_iter()
                .map(|shift_id| SeriesClash {
                    occurrence_index: 0,
                    shift_id,
                })
                .collect()
        }
    };

    Ok(Json(ClashResponse {
        has_clash: !clashes.is_empty(),
        clashes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use carebase_core::auth::UserRole;
    use rstest::rstest;

    fn session(role: UserRole) -> AuthSession {
        AuthSession {
            session_id: Uuid::from_u128(1),
            user_id: Uuid::from_u128(2),
            tenant_id: Uuid::from_u128(3),
            role,
        }
    }

    const ME: Option<Uuid> = Some(Uuid::from_u128(2));
    const SOMEONE_ELSE: Option<Uuid> = Some(Uuid::from_u128(9));

    #[rstest]
    #[case(None, ShiftStatus::Unassigned, ShiftStatus::Requested, true)]
    #[case(SOMEONE_ELSE, ShiftStatus::Assigned, ShiftStatus::Requested, false)]
    #[case(ME, ShiftStatus::Requested, ShiftStatus::Unassigned, true)]
    #[case(SOMEONE_ELSE, ShiftStatus::Requested, ShiftStatus::Unassigned, false)]
    #[case(ME, ShiftStatus::Assigned, ShiftStatus::InProgress, true)]
    #[case(ME, ShiftStatus::InProgress, ShiftStatus::Completed, true)]
    #[case(SOMEONE_ELSE, ShiftStatus::Assigned, ShiftStatus::InProgress, false)]
    #[case(ME, ShiftStatus::Requested, ShiftStatus::Assigned, false)]
    #[case(ME, ShiftStatus::Assigned, ShiftStatus::Cancelled, false)]
    fn test_support_worker_status_rules(
        #[case] assignee: Option<Uuid>,
        #[case] current: ShiftStatus,
        #[case] to: ShiftStatus,
        #[case] allowed: bool,
    ) {
        let auth = session(UserRole::SupportWorker);
        assert_eq!(may_change_status(&auth, assignee, current, to), allowed);
    }

    #[rstest]
    #[case(UserRole::Admin)]
    #[case(UserRole::Coordinator)]
    fn test_roster_managers_may_change_any_shift(#[case] role: UserRole) {
        let auth = session(role);
        assert!(may_change_status(&auth, SOMEONE_ELSE, ShiftStatus::Assigned, ShiftStatus::Cancelled));
    }

    #[test]
    fn test_create_request_accepts_recurrence() {
        let payload: CreateShiftRequest = serde_json::from_value(serde_json::json!({
            "title": "Personal care",
            "start_time": "2025-03-03T09:00:00",
            "end_time": "2025-03-03T12:00:00",
            "recurrence": {
                "frequency": "weekly",
                "end": { "type": "after_occurrences", "count": 3 }
            }
        }))
        .unwrap();

        assert!(payload.recurrence.is_some());
        assert!(payload.validate().is_ok());
    }
}
