//! Shared utilities for integration tests.
//!
//! Every server binds `127.0.0.1:0`, so tests never share ports.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use api_gateway::config::{GatewayConfig, RouteConfig, UserConfig};
use api_gateway::lifecycle::Shutdown;
use api_gateway::security::identity::hash_password;
use api_gateway::security::AuthPolicy;
use api_gateway::GatewayServer;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode},
    response::IntoResponse,
    routing::any,
    Router,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// One request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    /// Path and query.
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone)]
struct Reply {
    status: StatusCode,
    body: &'static str,
    seen: Arc<Mutex<Vec<Recorded>>>,
}

/// A running mock backend that records every request it receives.
#[derive(Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    seen: Arc<Mutex<Vec<Recorded>>>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.seen.lock().unwrap().clone()
    }
}

async fn record(State(reply): State<Reply>, request: Request<Body>) -> impl IntoResponse {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    reply.seen.lock().unwrap().push(Recorded {
        method: parts.method,
        uri: parts
            .uri
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_default(),
        headers: parts.headers,
        body,
    });
    (
        reply.status,
        [(header::CONTENT_TYPE, "application/json")],
        reply.body,
    )
}

/// Start a backend answering every request with `status` and a JSON `body`.
pub async fn start_mock_backend(status: u16, body: &'static str) -> MockBackend {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let reply = Reply {
        status: StatusCode::from_u16(status).unwrap(),
        body,
        seen: seen.clone(),
    };
    let app = Router::new()
        .route("/", any(record))
        .route("/{*path}", any(record))
        .with_state(reply);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend { addr, seen }
}

/// Start a backend that accepts connections but never answers.
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// Send a GET with `target` written to the wire verbatim and return the status.
///
/// HTTP clients resolve dot segments before sending; this does not.
pub async fn raw_get_status(addr: SocketAddr, target: &str) -> u16 {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        target, addr
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let response = String::from_utf8_lossy(&response);
    response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap()
}

/// An address with nothing listening on it.
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn route(path: &str, backend: &str, auth: AuthPolicy) -> RouteConfig {
    RouteConfig {
        path: path.into(),
        backend: backend.into(),
        auth,
    }
}

/// Users `user`, `host` and `admin`, each with the password equal to the name.
/// Hashed at the minimum bcrypt cost.
pub fn sample_users() -> Vec<UserConfig> {
    [("user", "USER"), ("host", "HOST"), ("admin", "ADMIN")]
        .into_iter()
        .map(|(name, role)| UserConfig {
            username: name.into(),
            password_hash: hash_password(name, 4).unwrap(),
            roles: vec![role.into()],
        })
        .collect()
}

/// Default config with no backends or routes and the sample users.
pub fn base_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.backends.clear();
    config.routes.clear();
    config.security.users = sample_users();
    config.observability.metrics_enabled = false;
    config
}

/// A running gateway.
pub struct Gateway {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl Gateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_gateway(config: GatewayConfig) -> Gateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = GatewayServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    Gateway { addr, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
