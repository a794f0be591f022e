//! para-sign - sign a Para API request from the command line.
//!
//! Prints the signed request (method, URL, headers and body) as JSON, ready to
//! be replayed with any HTTP tool.
//!
//! # Usage
//!
//! ```text
//! PARA_ACCESS_KEY=app:blog PARA_SECRET_KEY=... para-sign GET users --param limit=5
//! para-sign POST users --body user.json --date 20240101T000000Z
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PARA_ENDPOINT` | `https://paraio.com` | Para server URL |
//! | `PARA_API_PATH` | `/v1/` | API path prefix for relative paths |
//! | `PARA_ACCESS_KEY` | *(empty)* | App access key |
//! | `PARA_SECRET_KEY` | *(empty)* | Secret key, `Bearer <jwt>`, or empty for anonymous |
//! | `PARA_DOUBLE_URL_ENCODE` | `true` | Double-encode the path when signing |
//! | `PARA_CLOCK_OFFSET_SECS` | `0` | Seconds subtracted from the clock |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use http::Method;
use para_auth::date::parse_aws_date;
use para_auth::{Headers, QueryParams, SignerConfig, SigningRequest};
use para_client::ParaClient;
use para_core::ClientConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Sign a Para API request and print it as JSON.
#[derive(Debug, Parser)]
#[command(name = "para-sign", version)]
#[command(about = "Sign a Para API request and print it as JSON", long_about = None)]
struct Args {
    /// HTTP method, e.g. GET or POST
    method: String,

    /// Resource path, resolved against the API path (`/jwt_auth` is kept as-is)
    path: String,

    /// Query parameter as key=value (repeatable)
    #[arg(long = "param", value_parser = parse_key_value)]
    params: Vec<(String, String)>,

    /// Request header as key=value (repeatable)
    #[arg(long = "header", value_parser = parse_key_value)]
    headers: Vec<(String, String)>,

    /// File holding the JSON request body
    #[arg(long)]
    body: Option<PathBuf>,

    /// Fixed signing time in yyyyMMddTHHmmssZ form
    #[arg(long)]
    date: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = ClientConfig::from_env();
    init_tracing(&config.log_level)?;

    let client = ParaClient::new(config, SignerConfig::from_env());
    let request = build_request(&args, &client)?;

    info!(method = %request.method, path = %request.resource_path, "Signing request");
    let signed = client.invoke_signed_request(&request);

    let output = serde_json::to_string_pretty(&signed).context("failed to render signed request")?;
    println!("{output}");
    Ok(())
}

/// Turn command-line arguments into a [`SigningRequest`].
fn build_request(args: &Args, client: &ParaClient) -> Result<SigningRequest> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method: {}", args.method))?;

    let signing_time = match &args.date {
        Some(date) => match parse_aws_date(date) {
            Some(instant) => Some(instant),
            None => bail!("invalid --date {date}, expected yyyyMMddTHHmmssZ"),
        },
        None => None,
    };

    let body = match &args.body {
        Some(path) => Some(
            std::fs::read(path).with_context(|| format!("failed to read body file {}", path.display()))?,
        ),
        None => None,
    };

    Ok(SigningRequest {
        method,
        endpoint: client.config().endpoint().to_owned(),
        resource_path: client.full_path(&args.path),
        headers: args.headers.iter().cloned().collect::<Headers>(),
        params: args.params.iter().cloned().collect::<QueryParams>(),
        body,
        signing_time,
    })
}

/// Parse a `key=value` argument. The value may contain further `=` signs.
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{s}`"))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((key.trim().to_owned(), value.to_owned()))
}

/// Initialize the tracing subscriber, writing to stderr so stdout stays JSON.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the given log level string.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    Ok(())
}
