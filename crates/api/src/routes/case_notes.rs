//! Case note routes.
//!
//! Any staff member may write notes. Editing and archiving are limited to the
//! author and roster managers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use carebase_core::records::CaseNoteCategory;
use carebase_db::{
    CaseNoteRepository,
    entities::case_notes,
    repositories::{CreateCaseNoteInput, UpdateCaseNoteInput},
};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthSession,
};

/// Creates the case note routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clients/{client_id}/case-notes", get(list_case_notes))
        .route("/case-notes", post(create_case_note))
        .route("/case-notes/{note_id}", patch(update_case_note))
        .route("/case-notes/{note_id}/archive", post(archive_case_note))
}

/// Query parameters for listing a client's notes.
#[derive(Debug, Default, Deserialize)]
pub struct ListCaseNotesQuery {
    /// Include archived notes.
    #[serde(default)]
    pub include_archived: bool,
}

/// Request body for creating a case note.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCaseNoteRequest {
    /// Client the note is about.
    pub client_id: Uuid,
    /// Shift the note was written during.
    pub shift_id: Option<Uuid>,
    /// Heading.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Note text.
    #[validate(length(min = 1, max = 20000))]
    pub body: String,
    /// Category (default `general`).
    #[serde(default)]
    pub category: Option<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request body for updating a case note.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCaseNoteRequest {
    /// Heading.
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    /// Note text.
    #[validate(length(min = 1, max = 20000))]
    pub body: Option<String>,
    /// Category.
    pub category: Option<String>,
    /// Replacement tags.
    pub tags: Option<Vec<String>>,
}

fn parse_category(value: Option<&str>) -> ApiResult<Option<CaseNoteCategory>> {
    value
        .map(|s| {
            CaseNoteCategory::parse(s)
                .ok_or_else(|| ApiError::validation(format!("Unknown case note category '{s}'")))
        })
        .transpose()
}

fn ensure_may_edit(auth: &AuthSession, note: &case_notes::Model) -> ApiResult<()> {
    if note.author_id == Some(auth.user_id) || auth.role.can_manage_roster() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Only the author or a coordinator can change this note"))
    }
}

/// GET /clients/{client_id}/case-notes - List a client's notes.
async fn list_case_notes(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(client_id): Path<Uuid>,
    Query(query): Query<ListCaseNotesQuery>,
) -> ApiResult<Json<Vec<case_notes::Model>>> {
    let notes = CaseNoteRepository::new((*state.db).clone())
        .list_for_client(auth.tenant_id, client_id, query.include_archived)
        .await?;
    Ok(Json(notes))
}

/// POST /case-notes - Write a note.
async fn create_case_note(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(payload): Json<CreateCaseNoteRequest>,
) -> ApiResult<(StatusCode, Json<case_notes::Model>)> {
    payload.validate()?;
    let category = parse_category(payload.category.as_deref())?.unwrap_or_default();

    let note = CaseNoteRepository::new((*state.db).clone())
        .create(CreateCaseNoteInput {
            tenant_id: auth.tenant_id,
            client_id: payload.client_id,
            author_id: auth.user_id,
            shift_id: payload.shift_id,
            title: payload.title,
            body: payload.body,
            category,
            tags: payload.tags,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(note)))
}

/// PATCH /case-notes/{note_id} - Edit a note.
async fn update_case_note(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(note_id): Path<Uuid>,
    Json(payload): Json<UpdateCaseNoteRequest>,
) -> ApiResult<Json<case_notes::Model>> {
    payload.validate()?;
    let repo = CaseNoteRepository::new((*state.db).clone());

    let note = repo
        .find(auth.tenant_id, note_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Case note"))?;
    ensure_may_edit(&auth, &note)?;

    let input = UpdateCaseNoteInput {
        title: payload.title,
        body: payload.body,
        category: parse_category(payload.category.as_deref())?,
        tags: payload.tags,
    };

    Ok(Json(repo.update(auth.tenant_id, note_id, input).await?))
}

/// POST /case-notes/{note_id}/archive - Archive a note.
async fn archive_case_note(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(note_id): Path<Uuid>,
) -> ApiResult<Json<case_notes::Model>> {
    let repo = CaseNoteRepository::new((*state.db).clone());

    let note = repo
        .find(auth.tenant_id, note_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Case note"))?;
    ensure_may_edit(&auth, &note)?;

    Ok(Json(repo.archive(auth.tenant_id, note_id).await?))
}
