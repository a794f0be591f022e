//! Integration tests for the Para client crates.
//!
//! The signing and client tests run offline. The server tests need a running
//! Para server and are marked `#[ignore]` so they don't run during normal
//! `cargo test`.
//!
//! Run them with:
//! ```text
//! PARA_ENDPOINT=http://localhost:8080 PARA_ACCESS_KEY=app:test PARA_SECRET_KEY=... \
//!     cargo test -p para-integration -- --ignored
//! ```

use std::sync::Once;

use anyhow::{Context, Result};
use para_auth::{SignedRequest, SignerConfig};
use para_client::ParaClient;
use para_core::ClientConfig;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
fn endpoint_url() -> String {
    std::env::var("PARA_ENDPOINT").unwrap_or_else(|_| "http://localhost:8080".to_owned())
}

/// Create a client for the Para server under test.
#[must_use]
pub fn para_client() -> ParaClient {
    init_tracing();

    let mut config = ClientConfig::from_env();
    config.endpoint = endpoint_url();
    ParaClient::new(config, SignerConfig::from_env())
}

/// Create a client with the given keys against the server under test.
#[must_use]
pub fn para_client_with_keys(access_key: &str, secret_key: &str) -> ParaClient {
    init_tracing();

    let config = ClientConfig::builder()
        .endpoint(endpoint_url())
        .access_key(access_key)
        .secret_key(secret_key)
        .build();
    ParaClient::new(config, SignerConfig::default())
}

/// Dispatch a signed request and return its status and body.
pub async fn send(request: SignedRequest) -> Result<(http::StatusCode, Vec<u8>)> {
    let request = request
        .into_http_request()
        .context("signed request is not a valid HTTP request")?;
    let (parts, body) = request.into_parts();

    let response = reqwest::Client::new()
        .request(parts.method, parts.uri.to_string())
        .headers(parts.headers)
        .body(body)
        .send()
        .await
        .context("failed to send request")?;

    let status = response.status();
    let body = response.bytes().await.context("failed to read body")?;
    Ok((status, body.to_vec()))
}

/// Generate a unique object name for a test.
#[must_use]
pub fn test_object_name(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("it-{prefix}-{nanos}")
}

mod test_client;
mod test_server;
mod test_signing;
