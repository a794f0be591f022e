//! Client configuration.
//!
//! All configuration can be driven by environment variables, which is what
//! the `para-sign` binary does.

use std::fmt;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Default Para server location.
pub const DEFAULT_ENDPOINT: &str = "https://paraio.com";

/// Default API path prefix.
pub const DEFAULT_API_PATH: &str = "/v1/";

/// Path of the JWT sign-in, refresh and revoke resource.
pub const JWT_PATH: &str = "/jwt_auth";

/// Connection and credential settings for the Para client.
///
/// # Examples
///
/// ```
/// use para_core::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .access_key("app:blog")
///     .secret_key("secret")
///     .build();
/// assert_eq!(config.endpoint(), "https://paraio.com");
/// assert_eq!(config.api_path(), "/v1/");
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Para server URL. Blank means [`DEFAULT_ENDPOINT`].
    #[builder(default = DEFAULT_ENDPOINT.to_owned(), setter(into))]
    pub endpoint: String,

    /// API path prefix. Blank means [`DEFAULT_API_PATH`].
    #[builder(default = DEFAULT_API_PATH.to_owned(), setter(into))]
    pub api_path: String,

    /// App access key, e.g. `app:blog`.
    #[builder(setter(into))]
    pub access_key: String,

    /// App secret key. Blank for anonymous access.
    #[builder(default, setter(into))]
    #[serde(skip_serializing, default)]
    pub secret_key: String,

    /// Log level used when `RUST_LOG` is not set.
    #[builder(default = "info".to_owned(), setter(into))]
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            api_path: DEFAULT_API_PATH.to_owned(),
            access_key: String::new(),
            secret_key: String::new(),
            log_level: "info".to_owned(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("api_path", &self.api_path)
            .field("access_key", &self.access_key)
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `PARA_ENDPOINT` | `https://paraio.com` |
    /// | `PARA_API_PATH` | `/v1/` |
    /// | `PARA_ACCESS_KEY` | empty |
    /// | `PARA_SECRET_KEY` | empty |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("PARA_ENDPOINT") {
            config.endpoint = v;
        }
        if let Ok(v) = std::env::var("PARA_API_PATH") {
            config.api_path = v;
        }
        if let Ok(v) = std::env::var("PARA_ACCESS_KEY") {
            config.access_key = v;
        }
        if let Ok(v) = std::env::var("PARA_SECRET_KEY") {
            config.secret_key = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// The endpoint, falling back to [`DEFAULT_ENDPOINT`] when blank.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            DEFAULT_ENDPOINT
        } else {
            endpoint
        }
    }

    /// The API path, falling back to [`DEFAULT_API_PATH`] and always ending in `/`.
    #[must_use]
    pub fn api_path(&self) -> String {
        let path = self.api_path.trim();
        if path.is_empty() {
            DEFAULT_API_PATH.to_owned()
        } else if path.ends_with('/') {
            path.to_owned()
        } else {
            format!("{path}/")
        }
    }
}
