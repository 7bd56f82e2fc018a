//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound path
//!     → router.rs (strip base path, scan routes by specificity)
//!     → matcher.rs (evaluate path pattern)
//!     → Return: matched Route or None
//!
//! Route Compilation (at startup):
//!     GatewayConfig.routes + GatewayConfig.backends
//!     → Resolve backend base URLs
//!     → Sort by specificity
//!     → Freeze as immutable RouteTable
//! ```

pub mod matcher;
pub mod router;

pub use matcher::{is_canonical_path, PathPattern};
pub use router::{Route, RouteTable};
