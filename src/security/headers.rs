//! Header normalization for both directions of a forwarded exchange.
//!
//! # Responsibilities
//! - Copy inbound headers to the backend request, minus transport-reserved names
//! - Set `Content-Type`/`Content-Length` for re-encoded bodies
//! - Strip connection-level framing headers from backend responses
//!
//! # Design Decisions
//! - Client-supplied `Content-Encoding` is never forwarded; the gateway does no compression
//! - Multi-valued headers keep every value, in order

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method};

/// Request headers the gateway or its outbound client owns.
const RESERVED_REQUEST_HEADERS: &[&str] = &[
    "content-length",
    "content-encoding",
    "host",
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "te",
    "trailer",
    "upgrade",
];

/// Response headers describing the backend connection rather than the payload.
const FRAMING_RESPONSE_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "trailer",
    "upgrade",
];

/// Methods whose bodies are forwarded.
pub fn is_body_bearing(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

// `HeaderName::as_str` is always lowercase.
fn is_reserved_request_header(name: &HeaderName) -> bool {
    RESERVED_REQUEST_HEADERS.contains(&name.as_str())
}

fn is_framing_response_header(name: &HeaderName) -> bool {
    FRAMING_RESPONSE_HEADERS.contains(&name.as_str())
}

/// Build the header set sent to the backend.
///
/// `body_len` is the length of the re-encoded body, if one will be sent.
pub fn build_outbound_headers(
    inbound: &HeaderMap,
    method: &Method,
    body_len: Option<usize>,
    accept_encoding: Option<&HeaderValue>,
) -> HeaderMap {
    let mut outbound = HeaderMap::with_capacity(inbound.len() + 2);

    for (name, value) in inbound.iter() {
        if !is_reserved_request_header(name) {
            outbound.append(name.clone(), value.clone());
        }
    }

    if let (true, Some(len)) = (is_body_bearing(method), body_len) {
        outbound.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        outbound.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }

    if let Some(value) = accept_encoding {
        outbound.insert(header::ACCEPT_ENCODING, value.clone());
    }

    outbound
}

/// Build the header set returned to the caller from a backend response.
pub fn build_response_headers(backend: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(backend.len());
    for (name, value) in backend.iter() {
        if !is_framing_response_header(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}
