//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → identity.rs (resolve a verified Principal, if any)
//!     → access_control.rs (route policy × principal → allow or deny)
//!     → headers.rs (strip reserved headers, set body framing)
//!     → Pass to backend
//! ```
//!
//! # Design Decisions
//! - Fail closed: a route without an explicit policy requires authentication
//! - Denied requests never reach a backend
//! - No trust in client framing headers

pub mod access_control;
pub mod headers;
pub mod identity;

pub use access_control::{AccessGate, AuthPolicy, Decision, DenyReason, Principal};
pub use identity::{CredentialStore, IdentityProvider};
