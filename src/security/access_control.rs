//! Per-route authorization gate.
//!
//! Evaluates a route's [`AuthPolicy`] against the caller's [`Principal`]
//! before anything is sent to a backend. The gate is pure: it never touches
//! the network and holds no per-request state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::schema::SecurityMode;

/// Authorization requirement attached to a route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthPolicy {
    /// No identity required.
    Public,
    /// Any authenticated caller.
    #[default]
    #[serde(rename = "authenticated")]
    AnyAuthenticated,
    /// Caller must hold the named role.
    #[serde(rename = "role")]
    RoleRequired(String),
}

impl std::fmt::Display for AuthPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthPolicy::Public => write!(f, "public"),
            AuthPolicy::AnyAuthenticated => write!(f, "authenticated"),
            AuthPolicy::RoleRequired(role) => write!(f, "role:{}", role),
        }
    }
}

/// An authenticated caller and the roles it holds.
///
/// Produced by an [`IdentityProvider`](crate::security::identity::IdentityProvider)
/// after it has verified the caller's credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    name: String,
    roles: BTreeSet<String>,
}

impl Principal {
    pub fn new<I, S>(name: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Why a request was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// No identity was presented (or it failed verification).
    Unauthenticated,
    /// Identity present but lacks the required role.
    Forbidden { role: String },
}

impl DenyReason {
    pub fn as_label(&self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "unauthenticated",
            DenyReason::Forbidden { .. } => "forbidden",
        }
    }
}

/// Outcome of evaluating a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

/// Evaluate `policy` for the given caller.
pub fn authorize(policy: &AuthPolicy, identity: Option<&Principal>) -> Decision {
    match (policy, identity) {
        (AuthPolicy::Public, _) => Decision::Allow,
        (_, None) => Decision::Deny(DenyReason::Unauthenticated),
        (AuthPolicy::AnyAuthenticated, Some(_)) => Decision::Allow,
        (AuthPolicy::RoleRequired(role), Some(principal)) => {
            if principal.has_role(role) {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::Forbidden { role: role.clone() })
            }
        }
    }
}

/// The gate as configured for this process.
#[derive(Debug, Clone, Copy)]
pub struct AccessGate {
    mode: SecurityMode,
}

impl AccessGate {
    pub fn new(mode: SecurityMode) -> Self {
        if mode == SecurityMode::PermitAll {
            tracing::warn!("Authorization disabled (security.mode = permit_all); every route is public");
        }
        Self { mode }
    }

    pub fn check(&self, policy: &AuthPolicy, identity: Option<&Principal>) -> Decision {
        match self.mode {
            SecurityMode::Enforce => authorize(policy, identity),
            SecurityMode::PermitAll => Decision::Allow,
        }
    }
}

impl Default for AccessGate {
    fn default() -> Self {
        Self::new(SecurityMode::Enforce)
    }
}
