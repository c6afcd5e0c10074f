//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// PostgreSQL SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL SQLSTATE for foreign_key_violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("config: {0}")]
    Config(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("database: {0}")]
    Db(sqlx::Error),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl From<sqlx::Error> for AppError {
    /// Uniqueness and foreign-key violations are client errors; everything else stays a database error.
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            match db.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    let what = db.constraint().unwrap_or("unique constraint");
                    return AppError::Conflict(format!("duplicate value violates {}", what));
                }
                Some(FOREIGN_KEY_VIOLATION) => {
                    let what = db.constraint().unwrap_or("foreign key");
                    return AppError::BadRequest(format!("referenced row does not exist ({})", what));
                }
                _ => {}
            }
        }
        AppError::Db(e)
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl AppError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        // Driver messages can leak schema details; keep them in the log only.
        let message = match &self {
            AppError::Db(_) if status.is_server_error() => "internal database error".to_string(),
            _ => self.to_string(),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_unprocessable() {
        let e = AppError::Validation("pressure_atm is required".into());
        assert_eq!(e.status_and_code(), (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"));
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let e = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(e.status_and_code().0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn pool_errors_stay_database_errors() {
        let e = AppError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(e, AppError::Db(_)));
        assert_eq!(e.status_and_code(), (StatusCode::INTERNAL_SERVER_ERROR, "database_error"));
    }
}
