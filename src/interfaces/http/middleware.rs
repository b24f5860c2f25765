//! Bearer authentication for the `/api/v1` routes.
//!
//! The token only names a user; the principal's role set is reloaded from
//! storage on every request and handed to handlers as
//! `Extension<Principal>`.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::application::IdentityService;
use crate::domain::DomainError;
use crate::interfaces::http::common::{ApiError, ApiResponse};

#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    MalformedHeader,
    Rejected(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            Self::MissingToken => "Missing authentication token".to_string(),
            Self::MalformedHeader => "Authorization header must be `Bearer <token>`".to_string(),
            Self::Rejected(reason) => reason,
        };
        (StatusCode::UNAUTHORIZED, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

#[derive(Clone)]
pub struct AuthState {
    pub identity: Arc<IdentityService>,
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MalformedHeader)
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Ok(token) => token.to_string(),
        Err(e) => return e.into_response(),
    };

    match state.identity.authenticate_token(&token).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(DomainError::Unauthorized(reason)) => {
            debug!(reason = %reason, "Request rejected by auth middleware");
            AuthError::Rejected(reason).into_response()
        }
        Err(e) => ApiError(e).into_response(),
    }
}
