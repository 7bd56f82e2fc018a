//! HTTP API gateway library.
//!
//! Routes requests under a base path to backend services by path prefix.
//! Each route carries an authorization policy checked before the backend is
//! contacted.

pub mod config;
pub mod error;
pub mod forwarding;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use forwarding::Forwarder;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
