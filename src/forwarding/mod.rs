//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! InboundRequest
//!     → engine.rs (route, authorize, encode body, normalize headers)
//!     → client.rs (single backend call, pooled connection)
//!     → engine.rs (map response or transport failure)
//!     → GatewayResponse
//! ```

pub mod client;
pub mod engine;

pub use client::{BackendClient, BackendResponse, HyperBackendClient, TransportError};
pub use engine::Forwarder;
