//! Request-level error taxonomy.
//!
//! Every variant terminates a single request with a locally built response.
//! Statuses returned by a backend are not errors here: they pass through.

use axum::http::StatusCode;
use thiserror::Error;

use crate::http::codec::CodecError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("path {path} is not in canonical form")]
    InvalidPath { path: String },

    #[error("no route matches {path}")]
    NoRouteMatch { path: String },

    #[error("authentication required")]
    Unauthenticated,

    #[error("role '{role}' required")]
    Forbidden { role: String },

    #[error("{0}")]
    Serialization(CodecError),

    #[error("{0}")]
    MalformedBody(CodecError),

    #[error("request body could not be read: {0}")]
    UnreadableBody(String),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("backend '{backend}' unreachable: {reason}")]
    BackendUnreachable { backend: String, reason: String },
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidPath { .. } => StatusCode::BAD_REQUEST,
            GatewayError::NoRouteMatch { .. } => StatusCode::NOT_FOUND,
            GatewayError::Unauthenticated => StatusCode::UNAUTHORIZED,
            GatewayError::Forbidden { .. } => StatusCode::FORBIDDEN,
            GatewayError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            GatewayError::UnreadableBody(_) => StatusCode::BAD_REQUEST,
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::BackendUnreachable { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::InvalidPath { .. } => "invalid_path",
            GatewayError::NoRouteMatch { .. } => "no_route",
            GatewayError::Unauthenticated => "unauthenticated",
            GatewayError::Forbidden { .. } => "forbidden",
            GatewayError::Serialization(_) => "serialization",
            GatewayError::MalformedBody(_) => "malformed_body",
            GatewayError::UnreadableBody(_) => "unreadable_body",
            GatewayError::PayloadTooLarge { .. } => "payload_too_large",
            GatewayError::BackendUnreachable { .. } => "backend_unreachable",
        }
    }
}

impl From<CodecError> for GatewayError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Serialize(_) => GatewayError::Serialization(err),
            CodecError::Malformed(_) => GatewayError::MalformedBody(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GatewayError::NoRouteMatch { path: "/x".into() }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(GatewayError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            GatewayError::Forbidden { role: "ADMIN".into() }.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            GatewayError::BackendUnreachable { backend: "b".into(), reason: "refused".into() }
                .status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_codec_errors_split_by_cause() {
        let malformed = crate::http::codec::decode(b"{").unwrap_err();
        let err = GatewayError::from(malformed);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("not valid JSON"));
    }
}
