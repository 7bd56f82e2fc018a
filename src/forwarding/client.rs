//! Outbound HTTP client abstraction.
//!
//! # Responsibilities
//! - Define the seam between the forwarding engine and the network
//! - Provide a pooled hyper client implementation shared by all requests
//! - Buffer backend response bodies as opaque bytes

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, Request, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::http::request::OutboundRequest;

/// A response received from a backend, body fully buffered.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Failure to obtain any HTTP response from a backend.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid backend URL '{url}'")]
    InvalidUrl {
        url: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },

    #[error("request failed")]
    Request(#[source] hyper_util::client::legacy::Error),

    #[error("reading response body failed")]
    Body(#[source] hyper::Error),

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

impl TransportError {
    /// The error and all of its sources, joined for a diagnostic message.
    pub fn describe(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            message.push_str(": ");
            message.push_str(&err.to_string());
            source = err.source();
        }
        message
    }
}

/// Executes an outbound request against a backend.
#[async_trait]
pub trait BackendClient: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<BackendResponse, TransportError>;
}

#[async_trait]
impl<T: BackendClient + ?Sized> BackendClient for std::sync::Arc<T> {
    async fn send(&self, request: OutboundRequest) -> Result<BackendResponse, TransportError> {
        (**self).send(request).await
    }
}

/// Pooled HTTP/1.1 + HTTP/2 client. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct HyperBackendClient {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HyperBackendClient {
    pub fn new(connect_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        connector.set_keepalive(Some(Duration::from_secs(30)));

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }
}

#[async_trait]
impl BackendClient for HyperBackendClient {
    async fn send(&self, request: OutboundRequest) -> Result<BackendResponse, TransportError> {
        let uri: Uri = request
            .url
            .parse()
            .map_err(|source| TransportError::InvalidUrl {
                url: request.url.clone(),
                source,
            })?;

        let mut req = Request::new(Full::new(request.body.unwrap_or_default()));
        *req.method_mut() = request.method;
        *req.uri_mut() = uri;
        *req.headers_mut() = request.headers;

        let response = self
            .client
            .request(req)
            .await
            .map_err(TransportError::Request)?;

        let (parts, body) = response.into_parts();
        let body = body.collect().await.map_err(TransportError::Body)?.to_bytes();

        Ok(BackendResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }
}
