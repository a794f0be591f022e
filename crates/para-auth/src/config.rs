//! Signer configuration.
//!
//! Provides [`SignerConfig`], loaded from environment variables or built with
//! the typed builder. The credential scope (`us-east-1` / `para`) is not
//! configurable; only the compatibility knobs are.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Signer options.
///
/// # Examples
///
/// ```
/// use para_auth::SignerConfig;
///
/// let config = SignerConfig::default();
/// assert!(config.double_url_encode);
/// assert_eq!(config.clock_offset_secs, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct SignerConfig {
    /// Percent-encode the resource path a second time in the canonical request.
    ///
    /// Existing Para servers expect this. Disable it only for servers that
    /// canonicalize with single encoding.
    #[builder(default = true)]
    pub double_url_encode: bool,

    /// Seconds subtracted from the wall clock when no signing time is given,
    /// to compensate for a local clock running ahead of the server.
    #[builder(default = 0)]
    pub clock_offset_secs: i64,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            double_url_encode: true,
            clock_offset_secs: 0,
        }
    }
}

impl SignerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `PARA_DOUBLE_URL_ENCODE` | `true` |
    /// | `PARA_CLOCK_OFFSET_SECS` | `0` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("PARA_DOUBLE_URL_ENCODE") {
            config.double_url_encode = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("PARA_CLOCK_OFFSET_SECS") {
            if let Ok(n) = v.trim().parse::<i64>() {
                config.clock_offset_secs = n;
            }
        }

        config
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}
