//! Responses returned to the caller.
//!
//! A [`GatewayResponse`] is either a backend response passed through or an
//! error synthesized by the gateway. Bodies are opaque bytes in both cases.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::GatewayError;

#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl GatewayResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self { status, headers, body }
    }

    /// Plain-text diagnostic response for a gateway error.
    pub fn from_error(err: &GatewayError) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        Self {
            status: err.status_code(),
            headers,
            body: Bytes::from(err.to_string()),
        }
    }

    /// Add a `WWW-Authenticate: Basic` challenge.
    pub fn with_basic_challenge(mut self, realm: &str) -> Self {
        let challenge = format!("Basic realm=\"{}\"", realm.replace('"', ""));
        if let Ok(value) = HeaderValue::from_str(&challenge) {
            self.headers.insert(header::WWW_AUTHENTICATE, value);
        }
        self
    }
}

impl From<GatewayError> for GatewayResponse {
    fn from(err: GatewayError) -> Self {
        Self::from_error(&err)
    }
}

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
