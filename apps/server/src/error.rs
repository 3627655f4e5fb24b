//! Error responses for the HTTP facade.
//!
//! Every failure is rendered as `{"code": <status>, "msg": "..."}` with the
//! matching HTTP status. Storage details are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use washwise_core::ValidationError;
use washwise_db::DbError;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "code": status.as_u16(),
            "msg": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        if e.is_not_found() {
            return ApiError::NotFound(e.to_string());
        }
        error!(error = %e, "Database error");
        ApiError::Internal
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(DbError::not_found("Machine", 7)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(DbError::QueryFailed("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_hides_details() {
        let e = ApiError::from(DbError::QueryFailed("secret table".into()));
        assert_eq!(e.to_string(), "Internal server error");
    }

    #[test]
    fn test_validation_is_bad_request() {
        let e = ApiError::from(ValidationError::Required {
            field: "machineId".into(),
        });
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
    }
}
