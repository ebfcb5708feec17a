use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use shared_database::DatabaseError;

use crate::auth::AccessError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl AppError {
    pub fn not_authenticated() -> Self {
        AppError::Auth("Not authenticated".to_string())
    }
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NotAuthenticated => AppError::not_authenticated(),
            AccessError::Forbidden(msg) => AppError::Forbidden(msg),
        }
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Auth(msg) => AppError::Auth(msg),
            DatabaseError::NotFound(msg) => AppError::NotFound(msg),
            DatabaseError::Conflict(msg) => AppError::Conflict(msg),
            DatabaseError::MissingReference(msg) => AppError::BadRequest(msg),
            other => AppError::Database(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Database(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        if status.is_server_error() {
            tracing::error!("Error: {}: {}", status, message);
        } else {
            tracing::debug!("Rejected request: {}: {}", status, message);
        }

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn database_errors_keep_their_category() {
        assert_matches!(
            AppError::from(DatabaseError::Conflict("slot".into())),
            AppError::Conflict(_)
        );
        assert_matches!(
            AppError::from(DatabaseError::MissingReference("doctor".into())),
            AppError::BadRequest(_)
        );
        assert_matches!(
            AppError::from(DatabaseError::EmptyResponse("appointments".into())),
            AppError::Database(_)
        );
    }

    #[test]
    fn forbidden_maps_to_403() {
        let response = AppError::Forbidden("Unauthorized".into()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = AppError::not_authenticated().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
