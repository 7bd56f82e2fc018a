//! Caller identity.
//!
//! The gateway never decides *how* a caller proves who it is; it only asks an
//! [`IdentityProvider`] for a verified [`Principal`]. The bundled provider is
//! an in-memory store of bcrypt hashes checked against HTTP Basic credentials.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use base64::Engine;
use thiserror::Error;

use crate::config::schema::UserConfig;
use crate::security::access_control::Principal;

/// Resolves the caller behind a request.
///
/// Returning `None` means "no verified identity"; the authorization gate
/// decides whether that is acceptable for the matched route.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn identify(&self, headers: &HeaderMap) -> Option<Principal>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("user '{0}' is defined more than once")]
    DuplicateUser(String),

    #[error("password hash for user '{0}' is not a bcrypt hash")]
    InvalidHash(String),
}

struct StoredUser {
    hash: Arc<str>,
    roles: Vec<String>,
}

/// In-memory user store verifying `Authorization: Basic` credentials.
pub struct CredentialStore {
    users: HashMap<String, StoredUser>,
}

impl CredentialStore {
    pub fn from_config(users: &[UserConfig]) -> Result<Self, IdentityError> {
        let mut map = HashMap::with_capacity(users.len());
        for user in users {
            let hash = user.password_hash.trim();
            if !is_bcrypt_hash(hash) {
                return Err(IdentityError::InvalidHash(user.username.clone()));
            }
            let stored = StoredUser {
                hash: Arc::from(hash),
                roles: user.roles.clone(),
            };
            if map.insert(user.username.clone(), stored).is_some() {
                return Err(IdentityError::DuplicateUser(user.username.clone()));
            }
        }
        Ok(Self { users: map })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Check a username/password pair.
    ///
    /// The bcrypt comparison runs on the blocking pool.
    pub async fn verify(&self, username: &str, password: &str) -> Option<Principal> {
        let user = self.users.get(username)?;
        let hash = Arc::clone(&user.hash);
        let password = password.to_string();
        let matched = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .ok()?;
        match matched {
            Ok(true) => Some(Principal::new(username, user.roles.iter().cloned())),
            Ok(false) => None,
            Err(e) => {
                tracing::warn!(username = %username, error = %e, "Stored password hash is unusable");
                None
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for CredentialStore {
    async fn identify(&self, headers: &HeaderMap) -> Option<Principal> {
        let (username, password) = basic_credentials(headers)?;
        let principal = self.verify(&username, &password).await;
        if principal.is_none() {
            tracing::debug!(username = %username, "Rejected credentials");
        }
        principal
    }
}

/// bcrypt hash of `password`, in the form stored in config. `cost` must be 4..=31.
pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// Shape check for a modular-crypt bcrypt hash: `$2b$<cost>$<53 chars>`.
pub fn is_bcrypt_hash(hash: &str) -> bool {
    let Some(rest) = ["$2a$", "$2b$", "$2x$", "$2y$"]
        .iter()
        .find_map(|prefix| hash.strip_prefix(prefix))
    else {
        return false;
    };
    let Some((cost, digest)) = rest.split_once('$') else {
        return false;
    };
    let cost_ok = cost.len() == 2
        && cost
            .parse::<u32>()
            .is_ok_and(|cost| (4..=31).contains(&cost));
    cost_ok
        && digest.len() == 53
        && digest
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'/')
}

/// Decode `Authorization: Basic <base64(user:pass)>`.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    /// bcrypt of "user" at cost 4.
    const USER_HASH: &str = "$2b$04$prRenpgQz1g2zD/dvSgjteQVz.W837t97ZjE7DAsf26mygAqpbpEC";

    fn user(name: &str, password: &str, roles: &[&str]) -> UserConfig {
        UserConfig {
            username: name.into(),
            password_hash: hash_password(password, 4).unwrap(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn store() -> CredentialStore {
        CredentialStore::from_config(&[
            UserConfig {
                username: "user".into(),
                password_hash: USER_HASH.into(),
                roles: vec!["USER".into()],
            },
            user("admin", "admin", &["ADMIN"]),
        ])
        .unwrap()
    }

    fn basic(user: &str, pass: &str) -> HeaderMap {
        let token = base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", user, pass));
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("user", 4).unwrap();
        let second = hash_password("user", 4).unwrap();
        assert_ne!(first, second);
        assert!(is_bcrypt_hash(&first));
        assert!(first.starts_with("$2b$04$"));
    }

    #[test]
    fn test_bcrypt_hash_shape() {
        assert!(is_bcrypt_hash(USER_HASH));
        assert!(is_bcrypt_hash(
            "$2a$10$l254oJ0meZz8nKqnn7AYaeLIWgJP3Svpp6zuDl0iNRFuB5wZdGwkq"
        ));
        // hex SHA-256 of "user"
        assert!(!is_bcrypt_hash(
            "04f8996da763b7a969b1028ee3007569eaf3a635486ddab211d512c85b9df8fb"
        ));
        assert!(!is_bcrypt_hash("$2b$03$prRenpgQz1g2zD/dvSgjteQVz.W837t97ZjE7DAsf26mygAqpbpEC"));
        assert!(!is_bcrypt_hash("$2b$4$prRenpgQz1g2zD/dvSgjteQVz.W837t97ZjE7DAsf26mygAqpbpEC"));
        assert!(!is_bcrypt_hash("$2b$04$prRenpgQz1g2zD/dvSgjte"));
        assert!(!is_bcrypt_hash("$1$04$prRenpgQz1g2zD/dvSgjteQVz.W837t97ZjE7DAsf26mygAqpbpEC"));
    }

    #[tokio::test]
    async fn test_known_hash_verifies() {
        let principal = store().verify("user", "user").await.unwrap();
        assert_eq!(principal.name(), "user");
        assert!(principal.has_role("USER"));
    }

    #[tokio::test]
    async fn test_valid_credentials_yield_principal() {
        let principal = store().identify(&basic("admin", "admin")).await.unwrap();
        assert_eq!(principal.name(), "admin");
        assert!(principal.has_role("ADMIN"));
        assert!(!principal.has_role("USER"));
    }

    #[tokio::test]
    async fn test_wrong_password_yields_nothing() {
        let store = store();
        assert!(store.identify(&basic("admin", "nope")).await.is_none());
        assert!(store.identify(&basic("ghost", "admin")).await.is_none());
        assert!(store.identify(&basic("user", "")).await.is_none());
    }

    #[tokio::test]
    async fn test_missing_or_foreign_scheme_yields_nothing() {
        let store = store();
        assert!(store.identify(&HeaderMap::new()).await.is_none());

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert!(store.identify(&headers).await.is_none());

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic !!notbase64"));
        assert!(store.identify(&headers).await.is_none());
    }

    #[tokio::test]
    async fn test_password_may_contain_colon() {
        let store = CredentialStore::from_config(&[user("svc", "a:b", &[])]).unwrap();
        assert!(store.identify(&basic("svc", "a:b")).await.is_some());
    }

    #[test]
    fn test_rejects_bad_config() {
        let unsalted = UserConfig {
            username: "x".into(),
            password_hash: "04f8996da763b7a969b1028ee3007569eaf3a635486ddab211d512c85b9df8fb".into(),
            roles: vec![],
        };
        assert_eq!(
            CredentialStore::from_config(&[unsalted]).err(),
            Some(IdentityError::InvalidHash("x".into()))
        );

        let user = user("x", "x", &[]);
        assert_eq!(
            CredentialStore::from_config(&[user.clone(), user]).err(),
            Some(IdentityError::DuplicateUser("x".into()))
        );
    }

    #[test]
    fn test_store_counts_users() {
        let store = store();
        assert_eq!(store.len(), 2);
        assert!(!store.is_empty());
        assert!(CredentialStore::from_config(&[]).unwrap().is_empty());
    }
}
