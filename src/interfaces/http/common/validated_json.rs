//! JSON body extractors: [`JsonBody`] and [`ValidatedJson`], which also
//! runs `validator` rules.
//!
//! Body rejections keep axum's status (400 for malformed JSON) and carry
//! the parser message in the envelope. Rule violations go
//! through [`ApiError`] so they produce the same 422 field list as the
//! directory's own validation.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use super::{ApiError, ApiResponse};
use crate::domain::{DomainError, ValidationFailure};

/// ```ignore
/// async fn login(ValidatedJson(body): ValidatedJson<LoginRequest>) { .. }
/// ```
pub struct ValidatedJson<T>(pub T);

fn malformed(rejection: JsonRejection) -> Response {
    let body = ApiResponse::<()>::error(format!("Invalid JSON: {}", rejection.body_text()));
    (rejection.status(), Json(body)).into_response()
}

/// `axum::Json` with rejections wrapped in the response envelope, for
/// bodies whose rules live in the domain layer.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(malformed)?;
        Ok(JsonBody(value))
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(malformed)?;

        if let Err(errors) = value.validate() {
            let failure = ValidationFailure::from(errors);
            return Err(ApiError(DomainError::Validation(failure)).into_response());
        }

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use serde::Deserialize;
    use serde_json::{json, Value};

    #[derive(Debug, Deserialize, Validate)]
    struct Credentials {
        #[validate(email(message = "The email field must be a valid email address."))]
        email: String,
        #[validate(length(min = 1, message = "The password field is required."))]
        password: String,
    }

    async fn accept(ValidatedJson(body): ValidatedJson<Credentials>) -> String {
        body.email
    }

    async fn post_json(body: Body) -> (StatusCode, Vec<u8>) {
        use tower::Service;
        let mut svc = Router::new().route("/login", post(accept)).into_service();
        let req = Request::builder()
            .method("POST")
            .uri("/login")
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let resp = svc.call(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn passes_valid_body_through() {
        let body = json!({"email": "ann@example.com", "password": "x"});
        let (status, bytes) = post_json(Body::from(body.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bytes, b"ann@example.com");
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let (status, bytes) = post_json(Body::from("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn rule_violations_are_422_field_list() {
        let body = json!({"email": "nope", "password": ""});
        let (status, bytes) = post_json(Body::from(body.to_string())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "The given data was invalid.");
        let fields: Vec<&str> = json["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"password"));
    }
}
