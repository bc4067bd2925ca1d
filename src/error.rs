//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("route already registered: {method} {path}")]
    DuplicateRoute { path: String, method: &'static str },
    #[error("invalid route: {0}")]
    InvalidRoute(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("storage unavailable at {path}: {reason}")]
    StorageUnavailable { path: String, reason: String },
    #[error("query: {0}")]
    Query(#[from] sqlx::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

impl AppError {
    /// True when the driver reports a UNIQUE / PRIMARY KEY / CHECK / FK violation.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            AppError::Query(sqlx::Error::Database(db)) => !matches!(db.kind(), sqlx::error::ErrorKind::Other),
            _ => false,
        }
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

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::StorageUnavailable { .. } => (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable"),
            AppError::Query(sqlx::Error::RowNotFound) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Query(_) if self.is_constraint_violation() => (StatusCode::CONFLICT, "conflict"),
            AppError::Query(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::Http(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            AppError::Io(_) | AppError::Csv(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            AppError::Json(_) => (StatusCode::BAD_REQUEST, "invalid_json"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };
        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_404() {
        let response = AppError::NotFound("kv key: missing".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn storage_unavailable_is_503() {
        let err = AppError::StorageUnavailable {
            path: "/nope/db.sqlite".into(),
            reason: "parent directory does not exist".into(),
        };
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn duplicate_route_message_names_method_and_path() {
        let err = AppError::from(ConfigError::DuplicateRoute {
            path: "/users".into(),
            method: "GET",
        });
        assert_eq!(err.to_string(), "route already registered: GET /users");
        assert!(!err.is_constraint_violation());
    }
}
