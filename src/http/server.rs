//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Capture the inbound request and hand it to the forwarding engine
//! - Serve until the shutdown signal fires, then drain

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{request::Parts, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use http_body_util::LengthLimitError;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::forwarding::{Forwarder, HyperBackendClient};
use crate::http::request::{InboundRequest, UuidRequestId};
use crate::http::response::GatewayResponse;
use crate::lifecycle::shutdown;
use crate::security::identity::{CredentialStore, IdentityError, IdentityProvider};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder<HyperBackendClient>>,
    pub identity: Arc<dyn IdentityProvider>,
    pub max_body_size: usize,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    /// Create a new server from a validated configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, IdentityError> {
        let client = HyperBackendClient::new(Duration::from_secs(config.timeouts.connect_secs));
        let forwarder = Forwarder::from_config(&config, client);
        let identity = CredentialStore::from_config(&config.security.users)?;
        if identity.is_empty() {
            tracing::warn!("No users configured; only public routes are reachable");
        } else {
            tracing::info!(users = identity.len(), "Credential store loaded");
        }

        tracing::info!(
            routes = forwarder.routes().routes().len(),
            base_path = %forwarder.routes().base_path(),
            "Route table compiled"
        );

        let state = AppState {
            forwarder: Arc::new(forwarder),
            identity: Arc::new(identity),
            max_body_size: config.security.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let max_body_size = state.max_body_size;
        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then finish in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: every path goes through the forwarding engine.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();

    let raw = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(raw) => raw,
        Err(err) => {
            let err = body_error(err, state.max_body_size);
            tracing::warn!(path = %parts.uri.path(), error = %err, "Rejecting request body");
            return GatewayResponse::from_error(&err).into_response();
        }
    };

    let inbound = capture(&state, parts, raw).await;
    state.forwarder.forward_json(inbound).await.into_response()
}

async fn capture(state: &AppState, parts: Parts, raw: Bytes) -> InboundRequest<Bytes> {
    let identity = state.identity.identify(&parts.headers).await;
    let mut inbound = InboundRequest::new(parts.method, parts.uri.path())
        .with_headers(parts.headers)
        .with_identity(identity);
    if let Some(query) = parts.uri.query() {
        inbound = inbound.with_query(query);
    }
    if !raw.is_empty() {
        inbound = inbound.with_body(raw);
    }
    inbound
}

fn body_error(err: axum::Error, limit: usize) -> GatewayError {
    let inner = err.into_inner();
    let root: &(dyn std::error::Error + 'static) = &*inner;
    let mut source = Some(root);
    while let Some(err) = source {
        if err.is::<LengthLimitError>() {
            return GatewayError::PayloadTooLarge { limit };
        }
        source = err.source();
    }
    GatewayError::UnreadableBody(inner.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue, Method, StatusCode};
    use tower::ServiceExt;

    fn server() -> GatewayServer {
        GatewayServer::new(GatewayConfig::default()).unwrap()
    }

    async fn send(request: Request<Body>) -> Response {
        server().router().oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_unmatched_path_is_404_with_request_id() {
        let resp = send(
            Request::builder()
                .uri("/api/bivouacs/3")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(resp.headers().get("x-request-id").is_some());
    }

    #[tokio::test]
    async fn test_client_request_id_is_echoed() {
        let resp = send(
            Request::builder()
                .uri("/nowhere")
                .header("x-request-id", "trace-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(resp.headers().get("x-request-id").unwrap(), "trace-42");
    }

    #[tokio::test]
    async fn test_protected_route_challenges_anonymous_caller() {
        let resp = send(
            Request::builder()
                .uri("/api/reservations/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            HeaderValue::from_static("Basic realm=\"api-gateway\"")
        );
    }

    #[tokio::test]
    async fn test_oversized_body_is_413() {
        let mut config = GatewayConfig::default();
        config.security.max_body_size = 8;
        let router = GatewayServer::new(config).unwrap().router();

        let resp = router
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/reservations")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"guests": 2, "bivouac": 12}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_invalid_user_hash_fails_startup() {
        let mut config = GatewayConfig::default();
        config.security.users.push(crate::config::UserConfig {
            username: "user".into(),
            password_hash: "abc".into(),
            roles: vec![],
        });
        assert!(matches!(
            GatewayServer::new(config),
            Err(IdentityError::InvalidHash(_))
        ));
    }
}
