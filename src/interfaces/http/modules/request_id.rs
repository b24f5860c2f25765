//! `x-request-id` propagation.
//!
//! A caller-supplied id is kept when it is a valid header value of sane
//! length; otherwise a UUID v4 is minted. The id is stored as a request
//! extension, attached to the `http` span every log line of the request
//! runs under, and echoed on the response.

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

/// Available to handlers as `Extension<RequestId>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    fn from_header(value: Option<&HeaderValue>) -> Self {
        value
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
            .map(|v| Self(v.to_string()))
            .unwrap_or_else(|| Self(Uuid::new_v4().to_string()))
    }
}

pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let id = RequestId::from_header(request.headers().get(REQUEST_ID_HEADER));

    let span = tracing::info_span!(
        "http",
        request_id = %id.0,
        method = %request.method(),
        path = %request.uri().path(),
    );
    let header = HeaderValue::from_str(&id.0).ok();
    request.extensions_mut().insert(id);

    let mut response = next.run(request).instrument(span).await;
    if let Some(header) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, header);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_caller_id() {
        let value = HeaderValue::from_static(" trace-42 ");
        assert_eq!(RequestId::from_header(Some(&value)).0, "trace-42");
    }

    #[test]
    fn mints_uuid_for_missing_or_oversized_id() {
        let minted = RequestId::from_header(None);
        assert!(Uuid::parse_str(&minted.0).is_ok());

        let long = HeaderValue::from_str(&"x".repeat(MAX_REQUEST_ID_LEN + 1)).unwrap();
        let replaced = RequestId::from_header(Some(&long));
        assert!(Uuid::parse_str(&replaced.0).is_ok());
    }
}
