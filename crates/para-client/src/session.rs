//! JWT session state.
//!
//! A signed-in client holds one access token together with its expiry and the
//! earliest time it may be refreshed, all as epoch milliseconds. The session
//! is plain data so callers can persist and restore it.

use anyhow::{Context, anyhow};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use para_core::{ParaError, ParaObject, ParaResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Claims below this are taken to be epoch seconds rather than milliseconds.
const SECONDS_CUTOFF: i64 = 100_000_000_000;

/// Expiry claims read from a JWT payload, in epoch milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JwtClaims {
    /// `exp` claim.
    pub expires: Option<i64>,
    /// `refresh` claim.
    pub next_refresh: Option<i64>,
}

/// The current JWT access token and its timing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtSession {
    token: Option<String>,
    expires: Option<i64>,
    next_refresh: Option<i64>,
}

impl JwtSession {
    /// An empty, signed-out session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The access token, if signed in.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Token expiry in epoch milliseconds.
    #[must_use]
    pub fn expires(&self) -> Option<i64> {
        self.expires
    }

    /// Earliest refresh time in epoch milliseconds.
    #[must_use]
    pub fn next_refresh(&self) -> Option<i64> {
        self.next_refresh
    }

    /// Store a token and read its expiry from the payload.
    ///
    /// A blank token clears the session. A token whose payload cannot be
    /// decoded is kept, but without expiry information.
    pub fn set_access_token(&mut self, token: &str) {
        let token = token.trim();
        if token.is_empty() {
            self.clear();
            return;
        }

        let claims = decode_claims(token).unwrap_or_else(|e| {
            debug!(error = %e, "Could not decode JWT payload");
            JwtClaims::default()
        });
        self.token = Some(token.to_owned());
        self.expires = claims.expires;
        self.next_refresh = claims.next_refresh;
    }

    /// Whether the token should be refreshed now.
    ///
    /// True when a token is present, not yet expired, and either past its
    /// refresh time or carrying a refresh time beyond its expiry.
    ///
    /// # Examples
    ///
    /// ```
    /// use para_client::JwtSession;
    ///
    /// let session: JwtSession = serde_json::from_value(serde_json::json!({
    ///     "token": "t", "expires": 2_000, "nextRefresh": 1_000
    /// })).unwrap();
    /// assert!(!session.needs_refresh(500));
    /// assert!(session.needs_refresh(1_500));
    /// assert!(!session.needs_refresh(2_500));
    /// ```
    #[must_use]
    pub fn needs_refresh(&self, now_ms: i64) -> bool {
        let (Some(_), Some(expires), Some(next_refresh)) =
            (&self.token, self.expires, self.next_refresh)
        else {
            return false;
        };
        expires > now_ms && (next_refresh < now_ms || next_refresh > expires)
    }

    /// Apply a sign-in or refresh response.
    ///
    /// Expects `{"user": {...}, "jwt": {"access_token", "expires", "refresh"}}`.
    /// On success the session is replaced and the user object returned; any
    /// other shape clears the session and returns `None`.
    pub fn apply_auth_response(&mut self, response: &Value) -> Option<ParaObject> {
        let parsed = response.get("user").zip(response.get("jwt")).and_then(|(user, jwt)| {
            let token = jwt.get("access_token")?.as_str()?;
            Some((user, token, jwt))
        });

        let Some((user, token, jwt)) = parsed else {
            debug!("Authentication response has no user or token, clearing session");
            self.clear();
            return None;
        };

        self.token = Some(token.to_owned());
        self.expires = jwt.get("expires").and_then(Value::as_i64);
        self.next_refresh = jwt.get("refresh").and_then(Value::as_i64);

        serde_json::from_value(user.clone())
            .map_err(|e| debug!(error = %e, "Could not read user object"))
            .ok()
    }

    /// Forget the token.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Decode the `exp` and `refresh` claims of a JWT without verifying it.
///
/// Second-based claims are converted to milliseconds.
///
/// # Errors
///
/// Returns [`ParaError::Internal`] if the token has no payload segment or the
/// payload is not base64url-encoded JSON.
pub fn decode_claims(token: &str) -> ParaResult<JwtClaims> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ParaError::Internal(anyhow!("JWT has no payload segment")))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .context("JWT payload is not base64url")?;
    let claims: Value = serde_json::from_slice(&bytes)?;

    Ok(JwtClaims {
        expires: claims.get("exp").and_then(Value::as_i64).map(to_millis),
        next_refresh: claims.get("refresh").and_then(Value::as_i64).map(to_millis),
    })
}

fn to_millis(value: i64) -> i64 {
    if value < SECONDS_CUTOFF {
        value.saturating_mul(1000)
    } else {
        value
    }
}
