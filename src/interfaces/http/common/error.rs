//! Mapping of domain errors onto HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use super::ApiResponse;
use crate::domain::{DomainError, FieldError};

pub const VALIDATION_MESSAGE: &str = "The given data was invalid.";

/// Handler error: any `DomainError`, rendered in the `ApiResponse` envelope.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::Storage(_) | DomainError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self.0 {
            DomainError::Validation(failure) => {
                let body = ApiResponse::<Vec<FieldError>>::failure(VALIDATION_MESSAGE, failure.errors);
                (status, Json(body)).into_response()
            }
            DomainError::NotFound { entity, .. } => {
                let body = ApiResponse::<()>::error(format!("{} not found", entity));
                (status, Json(body)).into_response()
            }
            DomainError::Unauthorized(message) => {
                (status, Json(ApiResponse::<()>::error(message))).into_response()
            }
            e @ (DomainError::Storage(_) | DomainError::Internal(_)) => {
                // Details stay in the log.
                error!(error = %e, "Request failed");
                let body = ApiResponse::<()>::error("Internal server error");
                (status, Json(body)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationFailure;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_lists_fields_in_data() {
        let err = ApiError(DomainError::Validation(ValidationFailure::single(
            "email",
            "unique",
            "The email has already been taken.",
        )));
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["data"][0]["field"], "email");
        assert_eq!(body["data"][0]["code"], "unique");
    }

    #[tokio::test]
    async fn storage_details_are_not_leaked() {
        let resp = ApiError(DomainError::Storage("disk I/O error at /var/db".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = ApiError(DomainError::user_not_found("u1"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
