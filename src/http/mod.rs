//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, body limit, identity)
//!     → request.rs (InboundRequest captured from the wire)
//!     → [forwarding engine: route, authorize, call backend]
//!     → codec.rs (JSON decode/encode of request bodies)
//!     → response.rs (backend response or gateway error)
//!     → Send to client
//! ```

pub mod codec;
pub mod request;
pub mod response;
pub mod server;

pub use request::{InboundRequest, OutboundRequest, UuidRequestId, X_REQUEST_ID};
pub use response::GatewayResponse;
pub use server::GatewayServer;
