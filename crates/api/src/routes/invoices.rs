//! Invoice routes. All require a billing role.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use carebase_core::billing::InvoiceStatus;
use carebase_db::{
    InvoiceRepository,
    entities::invoices,
    repositories::{CreateInvoiceInput, InvoiceFilter, InvoiceWithLines},
};
use carebase_shared::types::{PageRequest, PageResponse};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthSession,
};

/// Creates the invoice routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route("/invoices/{invoice_id}", get(get_invoice))
        .route("/invoices/{invoice_id}/status", post(set_invoice_status))
}

/// Query parameters for listing invoices.
#[derive(Debug, Default, Deserialize)]
pub struct ListInvoicesQuery {
    /// Client.
    pub client_id: Option<Uuid>,
    /// Status.
    pub status: Option<InvoiceStatus>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for invoicing a client.
#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    /// Client to invoice.
    pub client_id: Uuid,
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period (inclusive).
    pub period_end: NaiveDate,
}

/// Request body for a status change.
#[derive(Debug, Deserialize)]
pub struct InvoiceStatusRequest {
    /// Target status: issued, paid or void.
    pub status: InvoiceStatus,
}

/// GET /invoices - List invoices, newest first.
async fn list_invoices(
    State(state): State<AppState>,
    auth: AuthSession,
    Query(query): Query<ListInvoicesQuery>,
) -> ApiResult<Json<PageResponse<invoices::Model>>> {
    auth.require_billing()?;

    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };
    let filter = InvoiceFilter {
        client_id: query.client_id,
        status: query.status.map(Into::into),
    };

    let invoices = InvoiceRepository::new((*state.db).clone())
        .list(auth.tenant_id, filter, &page)
        .await?;
    Ok(Json(invoices))
}

/// POST /invoices - Invoice a client's completed shifts for a period.
async fn create_invoice(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(payload): Json<CreateInvoiceRequest>,
) -> ApiResult<(StatusCode, Json<InvoiceWithLines>)> {
    auth.require_billing()?;

    let invoice = InvoiceRepository::new((*state.db).clone())
        .create_from_shifts(CreateInvoiceInput {
            tenant_id: auth.tenant_id,
            client_id: payload.client_id,
            period_start: payload.period_start,
            period_end: payload.period_end,
            created_by: auth.user_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(invoice)))
}

/// GET /invoices/{invoice_id} - Get an invoice with its lines.
async fn get_invoice(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(invoice_id): Path<Uuid>,
) -> ApiResult<Json<InvoiceWithLines>> {
    auth.require_billing()?;

    InvoiceRepository::new((*state.db).clone())
        .find_with_lines(auth.tenant_id, invoice_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Invoice"))
}

/// POST /invoices/{invoice_id}/status - Issue, pay or void an invoice.
async fn set_invoice_status(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<InvoiceStatusRequest>,
) -> ApiResult<Json<invoices::Model>> {
    auth.require_billing()?;

    let invoice = InvoiceRepository::new((*state.db).clone())
        .set_status(auth.tenant_id, invoice_id, payload.status)
        .await?;
    Ok(Json(invoice))
}
