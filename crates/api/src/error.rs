//! API error responses.
//!
//! Every handler error ends up as an `AppError`, rendered as
//! `{"error": "<CODE>", "message": "<text>"}` with the matching status.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde_json::json;
use validator::ValidationErrors;

use carebase_core::{
    auth::PasswordError,
    billing::BillingError,
    records::RecordError,
    roster::{RecurrenceError, ShiftError},
};
use carebase_db::repositories::{
    CarePlanError, CaseNoteError, InvoiceError, MedicationError, ShiftRepoError,
};
use carebase_shared::AppError;

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned by handlers and middleware.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// 401 with the given message.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self(AppError::Unauthorized(message.into()))
    }

    /// 403 with the given message.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self(AppError::Forbidden(message.into()))
    }

    /// 404 for the named resource.
    #[must_use]
    pub fn not_found(what: &str) -> Self {
        Self(AppError::NotFound(format!("{what} not found")))
    }

    /// 400 with the given message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }

    /// 422 with the given message.
    #[must_use]
    pub fn business_rule(message: impl Into<String>) -> Self {
        Self(AppError::BusinessRule(message.into()))
    }

    /// The underlying application error.
    #[must_use]
    pub const fn inner(&self) -> &AppError {
        &self.0
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if self.0.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
            "An internal error occurred".to_string()
        } else {
            match &self.0 {
                AppError::Unauthorized(m)
                | AppError::Forbidden(m)
                | AppError::NotFound(m)
                | AppError::Validation(m)
                | AppError::BusinessRule(m)
                | AppError::Conflict(m)
                | AppError::ServiceUnavailable(m)
                | AppError::Database(m)
                | AppError::Internal(m) => m.clone(),
            }
        };

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": message,
            })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self(carebase_db::error::classify(&err))
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooShort => Self::validation(err.to_string()),
            _ => Self(AppError::Internal(err.to_string())),
        }
    }
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Archived | RecordError::InvalidTransition { .. } => {
                Self::business_rule(err.to_string())
            }
            _ => Self::validation(err.to_string()),
        }
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        Self::business_rule(err.to_string())
    }
}

impl From<ShiftError> for ApiError {
    fn from(err: ShiftError) -> Self {
        match err {
            ShiftError::InvalidTimeRange => Self::validation(err.to_string()),
            _ => Self::business_rule(err.to_string()),
        }
    }
}

impl From<RecurrenceError> for ApiError {
    fn from(err: RecurrenceError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<ShiftRepoError> for ApiError {
    fn from(err: ShiftRepoError) -> Self {
        match err {
            ShiftRepoError::NotFound(_) => Self::not_found("Shift"),
            ShiftRepoError::NotPermitted(_) => Self::forbidden(err.to_string()),
            ShiftRepoError::ClientNotFound(_)
            | ShiftRepoError::AssigneeNotFound(_)
            | ShiftRepoError::Recurrence(_) => Self::validation(err.to_string()),
            ShiftRepoError::AssigneeRequired | ShiftRepoError::AlreadyInvoiced => {
                Self::business_rule(err.to_string())
            }
            ShiftRepoError::Lifecycle(e) => e.into(),
            ShiftRepoError::Database(e) => e.into(),
        }
    }
}

impl From<InvoiceError> for ApiError {
    fn from(err: InvoiceError) -> Self {
        match err {
            InvoiceError::NotFound(_) => Self::not_found("Invoice"),
            InvoiceError::ClientNotFound(_) | InvoiceError::InvalidPeriod { .. } => {
                Self::validation(err.to_string())
            }
            InvoiceError::Billing(e) => e.into(),
            InvoiceError::Database(e) => e.into(),
        }
    }
}

impl From<CaseNoteError> for ApiError {
    fn from(err: CaseNoteError) -> Self {
        match err {
            CaseNoteError::NotFound(_) => Self::not_found("Case note"),
            CaseNoteError::ClientNotFound(_) => Self::validation(err.to_string()),
            CaseNoteError::Record(e) => e.into(),
            CaseNoteError::Database(e) => e.into(),
        }
    }
}

impl From<CarePlanError> for ApiError {
    fn from(err: CarePlanError) -> Self {
        match err {
            CarePlanError::NotFound(_) => Self::not_found("Care plan"),
            CarePlanError::ClientNotFound(_) => Self::validation(err.to_string()),
            CarePlanError::Record(e) => e.into(),
            CarePlanError::Database(e) => e.into(),
        }
    }
}

impl From<MedicationError> for ApiError {
    fn from(err: MedicationError) -> Self {
        match err {
            MedicationError::ClientNotFound(_) => Self::validation(err.to_string()),
            MedicationError::Database(e) => e.into(),
        }
    }
}
