//! The forwarding engine.
//!
//! One generic path replaces a handler per backend: resolve the route,
//! check authorization, build the outbound request, call the backend once,
//! and map whatever comes back into a [`GatewayResponse`].
//!
//! Everything before the backend call is synchronous and in-memory. The
//! call itself is the only await point; dropping the returned future (for
//! example when the client disconnects) cancels the in-flight request.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::http::HeaderValue;
use serde::Serialize;

use crate::config::schema::GatewayConfig;
use crate::error::GatewayError;
use crate::forwarding::client::{BackendClient, TransportError};
use crate::http::codec;
use crate::http::request::{InboundRequest, OutboundRequest};
use crate::http::response::GatewayResponse;
use crate::observability::metrics;
use crate::routing::{is_canonical_path, Route, RouteTable};
use crate::security::access_control::{AccessGate, Decision, DenyReason};
use crate::security::headers::{build_outbound_headers, build_response_headers, is_body_bearing};

const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_REALM: &str = "api-gateway";

pub struct Forwarder<C> {
    routes: Arc<RouteTable>,
    gate: AccessGate,
    client: C,
    backend_timeout: Duration,
    accept_encoding: Option<HeaderValue>,
    realm: String,
}

impl<C: BackendClient> Forwarder<C> {
    pub fn new(routes: Arc<RouteTable>, gate: AccessGate, client: C) -> Self {
        Self {
            routes,
            gate,
            client,
            backend_timeout: DEFAULT_BACKEND_TIMEOUT,
            accept_encoding: None,
            realm: DEFAULT_REALM.to_string(),
        }
    }

    /// Build an engine wired as the configuration describes.
    pub fn from_config(config: &GatewayConfig, client: C) -> Self {
        let accept_encoding = config
            .outbound
            .accept_encoding
            .as_deref()
            .and_then(|v| match HeaderValue::from_str(v) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(value = %v, "Ignoring invalid outbound.accept_encoding");
                    None
                }
            });

        Self::new(
            Arc::new(RouteTable::from_config(config)),
            AccessGate::new(config.security.mode),
            client,
        )
        .with_backend_timeout(Duration::from_secs(config.timeouts.backend_secs))
        .with_accept_encoding(accept_encoding)
        .with_realm(config.security.realm.clone())
    }

    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = timeout;
        self
    }

    pub fn with_accept_encoding(mut self, value: Option<HeaderValue>) -> Self {
        self.accept_encoding = value;
        self
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Forward one inbound request. Never fails: every outcome is a response.
    pub async fn forward<B: Serialize>(&self, inbound: InboundRequest<B>) -> GatewayResponse {
        let start = Instant::now();
        let prepared = self.prepare(&inbound);
        self.complete(&inbound, prepared, start).await
    }

    /// Forward a request whose body is still raw JSON text.
    ///
    /// The body is decoded only after the route matched and the caller was
    /// admitted, and only for body-bearing methods.
    pub async fn forward_json(&self, inbound: InboundRequest<Bytes>) -> GatewayResponse {
        let start = Instant::now();
        let prepared = self.admit(&inbound).and_then(|route| {
            let body = match &inbound.body {
                Some(raw) if is_body_bearing(&inbound.method) => codec::decode(raw).map_err(|err| {
                    tracing::debug!(request_id = %inbound.request_id(), error = %err, "Rejecting malformed body");
                    GatewayError::from(err)
                })?,
                _ => None,
            };
            let outbound = self.build(route, &inbound, body.as_ref())?;
            Ok((route, outbound))
        });
        self.complete(&inbound, prepared, start).await
    }

    /// Resolve, authorize and build the outbound request. No I/O.
    pub fn prepare<'a, B: Serialize>(
        &'a self,
        inbound: &InboundRequest<B>,
    ) -> Result<(&'a Route, OutboundRequest), GatewayError> {
        let route = self.admit(inbound)?;
        let outbound = self.build(route, inbound, inbound.body.as_ref())?;
        Ok((route, outbound))
    }

    /// Match the route and run the authorization gate.
    fn admit<'a, X>(&'a self, inbound: &InboundRequest<X>) -> Result<&'a Route, GatewayError> {
        let request_id = inbound.request_id();

        // Only canonical paths reach routing and the gate.
        if !is_canonical_path(&inbound.path) {
            tracing::warn!(request_id = %request_id, path = %inbound.path, "Rejecting non-canonical path");
            return Err(GatewayError::InvalidPath {
                path: inbound.path.clone(),
            });
        }

        let route = self.routes.match_path(&inbound.path).ok_or_else(|| {
            tracing::warn!(request_id = %request_id, path = %inbound.path, "No route matched");
            GatewayError::NoRouteMatch {
                path: inbound.path.clone(),
            }
        })?;

        if let Decision::Deny(reason) = self.gate.check(&route.policy, inbound.identity.as_ref()) {
            tracing::info!(
                request_id = %request_id,
                path = %inbound.path,
                policy = %route.policy,
                caller = inbound.identity.as_ref().map(|p| p.name()).unwrap_or("-"),
                reason = reason.as_label(),
                "Access denied"
            );
            metrics::record_denied(reason.as_label());
            return Err(match reason {
                DenyReason::Unauthenticated => GatewayError::Unauthenticated,
                DenyReason::Forbidden { role } => GatewayError::Forbidden { role },
            });
        }

        Ok(route)
    }

    /// Encode the body and normalize headers for an admitted request.
    fn build<X, B: Serialize + ?Sized>(
        &self,
        route: &Route,
        inbound: &InboundRequest<X>,
        body: Option<&B>,
    ) -> Result<OutboundRequest, GatewayError> {
        let request_id = inbound.request_id();

        let body = if is_body_bearing(&inbound.method) {
            codec::encode(body).map_err(|err| {
                tracing::error!(request_id = %request_id, error = %err, "Body serialization failed");
                GatewayError::from(err)
            })?
        } else {
            if body.is_some() {
                tracing::debug!(request_id = %request_id, method = %inbound.method, "Dropping body of non body-bearing method");
            }
            None
        };

        let headers = build_outbound_headers(
            &inbound.headers,
            &inbound.method,
            body.as_ref().map(|b| b.len()),
            self.accept_encoding.as_ref(),
        );

        let outbound = OutboundRequest {
            method: inbound.method.clone(),
            url: route.target_url(&inbound.path, inbound.query.as_deref()),
            headers,
            body,
        };

        tracing::debug!(
            request_id = %request_id,
            method = %outbound.method,
            path = %inbound.path,
            route = %route.pattern,
            url = %outbound.url,
            "Forwarding request"
        );

        Ok(outbound)
    }

    /// Execute a prepared request (if any) and turn the outcome into a response.
    async fn complete<X>(
        &self,
        inbound: &InboundRequest<X>,
        prepared: Result<(&Route, OutboundRequest), GatewayError>,
        start: Instant,
    ) -> GatewayResponse {
        let (backend, outcome) = match prepared {
            Ok((route, outbound)) => (route.backend.as_str(), self.execute(route, outbound).await),
            Err(err) => ("none", Err(err)),
        };

        let response = match outcome {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(request_id = %inbound.request_id(), kind = err.kind(), error = %err, "Request terminated by gateway");
                let response = GatewayResponse::from_error(&err);
                match err {
                    GatewayError::Unauthenticated => response.with_basic_challenge(&self.realm),
                    _ => response,
                }
            }
        };

        metrics::record_request(inbound.method.as_str(), response.status.as_u16(), backend, start);
        response
    }

    async fn execute(
        &self,
        route: &Route,
        outbound: OutboundRequest,
    ) -> Result<GatewayResponse, GatewayError> {
        let target = outbound.url.clone();
        let result = match tokio::time::timeout(self.backend_timeout, self.client.send(outbound)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.backend_timeout)),
        };

        match result {
            Ok(response) => {
                tracing::debug!(url = %target, status = %response.status, bytes = response.body.len(), "Backend responded");
                Ok(GatewayResponse::new(
                    response.status,
                    build_response_headers(&response.headers),
                    response.body,
                ))
            }
            Err(err) => {
                let reason = err.describe();
                tracing::error!(backend = %route.backend, url = %target, error = %reason, "Upstream error");
                Err(GatewayError::BackendUnreachable {
                    backend: route.backend.clone(),
                    reason,
                })
            }
        }
    }
}
