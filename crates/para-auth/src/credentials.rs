//! Signing credentials and credential lookup.
//!
//! [`SigningCredentials`] pairs an app's access key with whatever the caller
//! put in the secret slot, which selects one of three [`AuthMode`]s. The
//! [`CredentialProvider`] trait is the verifier's side: it resolves a secret
//! key from the access key named in an `Authorization` header.

use std::collections::HashMap;
use std::fmt;

use crate::error::AuthError;

/// Prefix that marks a secret as a JWT bearer token.
pub const BEARER_PREFIX: &str = "Bearer ";

/// How a request is authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Secret key blank: `Authorization: Anonymous <access key>`.
    Anonymous,
    /// Full SigV4 signature with the secret key.
    Signature,
    /// Secret holds `Bearer <jwt>`, passed through verbatim.
    Bearer,
}

/// An access key plus the secret slot: a secret key, a bearer token, or nothing.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningCredentials {
    access_key: String,
    secret: Option<String>,
}

impl SigningCredentials {
    /// Credentials with a secret (or `Bearer <token>`) value.
    pub fn new(access_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret: Some(secret.into()),
        }
    }

    /// Credentials without a secret; requests are sent anonymously.
    pub fn anonymous(access_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret: None,
        }
    }

    /// Credentials carrying a JWT access token.
    pub fn bearer(access_key: impl Into<String>, token: &str) -> Self {
        Self::new(access_key, format!("{BEARER_PREFIX}{token}"))
    }

    /// The access key, trimmed.
    #[must_use]
    pub fn access_key(&self) -> &str {
        self.access_key.trim()
    }

    /// The trimmed secret key, or `None` when blank.
    #[must_use]
    pub fn secret_key(&self) -> Option<&str> {
        self.secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The secret slot exactly as supplied, used verbatim in bearer mode.
    #[must_use]
    pub fn raw_secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }

    /// Select the authentication mode from the secret slot.
    ///
    /// # Examples
    ///
    /// ```
    /// use para_auth::{AuthMode, SigningCredentials};
    ///
    /// assert_eq!(SigningCredentials::new("AK", " ").mode(), AuthMode::Anonymous);
    /// assert_eq!(SigningCredentials::new("AK", "SK").mode(), AuthMode::Signature);
    /// assert_eq!(SigningCredentials::new("AK", "Bearer xyz").mode(), AuthMode::Bearer);
    /// ```
    #[must_use]
    pub fn mode(&self) -> AuthMode {
        match self.secret_key() {
            None => AuthMode::Anonymous,
            Some(secret) if is_bearer(secret) => AuthMode::Bearer,
            Some(_) => AuthMode::Signature,
        }
    }
}

impl fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("access_key", &self.access_key)
            .field("mode", &self.mode())
            .finish_non_exhaustive()
    }
}

/// Whether a secret value is a bearer token (`Bearer ` prefix, any case).
#[must_use]
pub fn is_bearer(secret: &str) -> bool {
    secret
        .as_bytes()
        .get(..BEARER_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(BEARER_PREFIX.as_bytes()))
}

/// Trait for looking up secret keys by access key.
///
/// Implementations may back this with a database, configuration file,
/// or any other credential store.
pub trait CredentialProvider: Send + Sync {
    /// Retrieve the secret key for the given access key.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AccessKeyNotFound`] if the access key is not recognized.
    fn get_secret_key(&self, access_key: &str) -> Result<String, AuthError>;
}

/// An in-memory credential provider backed by a `HashMap`.
///
/// # Examples
///
/// ```
/// use para_auth::{CredentialProvider, StaticCredentialProvider};
///
/// let provider = StaticCredentialProvider::new(vec![
///     ("app:blog".to_owned(), "secret".to_owned()),
/// ]);
///
/// assert_eq!(provider.get_secret_key("app:blog").unwrap(), "secret");
/// ```
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credentials: HashMap<String, String>,
}

impl StaticCredentialProvider {
    /// Create a provider from `(access_key, secret_key)` pairs.
    pub fn new(credentials: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            credentials: credentials.into_iter().collect(),
        }
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn get_secret_key(&self, access_key: &str) -> Result<String, AuthError> {
        self.credentials
            .get(access_key)
            .cloned()
            .ok_or_else(|| AuthError::AccessKeyNotFound(access_key.to_owned()))
    }
}
