//! Database error classification.
//!
//! Maps `DbErr` onto `AppError` so handlers never inspect driver errors.

use sea_orm::{DbErr, RuntimeErr, SqlErr};

use carebase_shared::AppError;

/// `cannot_connect_now`: the server is starting up or shutting down.
const SQLSTATE_CANNOT_CONNECT_NOW: &str = "57P03";

const TRANSIENT_MESSAGES: [&str; 3] = [
    "the database system is starting up",
    "not yet accepting connections",
    "the database system is shutting down",
];

/// Extracts the `PostgreSQL` SQLSTATE code from a driver error.
#[must_use]
pub fn sqlstate(err: &DbErr) -> Option<String> {
    let runtime = match err {
        DbErr::Exec(e) | DbErr::Query(e) | DbErr::Conn(e) => e,
        _ => return None,
    };

    match runtime {
        RuntimeErr::SqlxError(sqlx::Error::Database(db_err)) => {
            db_err.code().map(std::borrow::Cow::into_owned)
        }
        _ => None,
    }
}

/// Returns true if the error means the database is temporarily unavailable.
///
/// Callers should ask the client to retry rather than treat these as fatal.
#[must_use]
pub fn is_transient(err: &DbErr) -> bool {
    if matches!(err, DbErr::ConnectionAcquire(_)) {
        return true;
    }
    if sqlstate(err).as_deref() == Some(SQLSTATE_CANNOT_CONNECT_NOW) {
        return true;
    }

    let message = err.to_string().to_lowercase();
    TRANSIENT_MESSAGES.iter().any(|m| message.contains(m))
}

/// Classifies a database error into an application error.
#[must_use]
pub fn classify(err: &DbErr) -> AppError {
    if is_transient(err) {
        tracing::warn!(error = %err, "Database temporarily unavailable");
        return AppError::ServiceUnavailable(
            "Database is starting up, please retry shortly".to_string(),
        );
    }

    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            return AppError::Conflict(format!("Record already exists: {detail}"));
        }
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            return AppError::Validation(
                "Referenced record does not exist in this tenant".to_string(),
            );
        }
        _ => {}
    }

    match err {
        DbErr::RecordNotFound(what) => AppError::NotFound(what.clone()),
        _ => {
            tracing::error!(error = %err, "Database error");
            AppError::Database(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ConnAcquireErr;

    #[test]
    fn test_starting_up_is_service_unavailable() {
        let err = DbErr::Conn(RuntimeErr::Internal(
            "FATAL: the database system is starting up".to_string(),
        ));
        assert!(is_transient(&err));
        assert!(matches!(classify(&err), AppError::ServiceUnavailable(_)));
    }

    #[test]
    fn test_not_accepting_connections_is_transient() {
        let err = DbErr::Custom(
            "the database system is not yet accepting connections".to_string(),
        );
        assert!(is_transient(&err));
    }

    #[test]
    fn test_pool_timeout_is_transient() {
        let err = DbErr::ConnectionAcquire(ConnAcquireErr::Timeout);
        assert_eq!(classify(&err).status_code(), 503);
    }

    #[test]
    fn test_record_not_found() {
        let err = DbErr::RecordNotFound("shift".to_string());
        assert!(!is_transient(&err));
        assert!(matches!(classify(&err), AppError::NotFound(_)));
    }

    #[test]
    fn test_other_errors_are_database_errors() {
        let err = DbErr::Custom("syntax error at or near".to_string());
        let app = classify(&err);
        assert_eq!(app.error_code(), "DATABASE_ERROR");
        assert!(app.is_server_error());
    }

    #[test]
    fn test_sqlstate_absent_for_non_driver_errors() {
        assert_eq!(sqlstate(&DbErr::Custom("x".to_string())), None);
    }
}
