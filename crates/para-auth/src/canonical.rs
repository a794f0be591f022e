//! Canonical request construction for Para request signing.
//!
//! The canonical request follows the SigV4 layout:
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! Two details differ from a stock AWS client and must match the Para server
//! byte for byte:
//!
//! - The canonical URI is the wire path percent-encoded a second time when
//!   double encoding is enabled, so `/a b` travels as `/a%20b` but is signed as
//!   `/a%2520b`.
//! - A `POST` without a body but with query parameters signs the encoded
//!   parameters as its payload and leaves the canonical query string empty.
//! - Only the first value of a repeated query parameter is signed (see
//!   [`QueryParams::first_values`]).

use std::collections::BTreeMap;
use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::{Digest, Sha256};

use crate::request::{Headers, QueryParams};
use crate::sigv4::hash_payload;

/// Characters percent-encoded in query keys and values.
///
/// Everything except the RFC 3986 unreserved characters
/// (A-Z, a-z, 0-9, `-`, `_`, `.`, `~`).
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Same as [`URI_ENCODE_SET`] but leaves `/` alone, for resource paths.
const PATH_ENCODE_SET: &AsciiSet = &URI_ENCODE_SET.remove(b'/');

/// Headers that are never part of the signature.
pub const UNSIGNED_HEADERS: &[&str] = &["connection", "x-amzn-trace-id"];

/// Percent-encode a string using the SigV4 rules.
///
/// When `keep_slash` is set, `/` is left as-is so a whole path can be encoded
/// in one pass.
///
/// # Examples
///
/// ```
/// use para_auth::canonical::uri_encode;
///
/// assert_eq!(uri_encode("a b*c~", false), "a%20b%2Ac~");
/// assert_eq!(uri_encode("/v1/a b", true), "/v1/a%20b");
/// assert_eq!(uri_encode("/v1/a b", false), "%2Fv1%2Fa%20b");
/// ```
#[must_use]
pub fn uri_encode(input: &str, keep_slash: bool) -> String {
    let set = if keep_slash {
        PATH_ENCODE_SET
    } else {
        URI_ENCODE_SET
    };
    utf8_percent_encode(input, set).to_string()
}

/// Join the endpoint's own path with a resource path.
///
/// The resource path is percent-encoded once (slashes kept); the base path is
/// taken as it appears in the endpoint URL. Exactly one `/` separates the two.
/// The result is the path sent on the request line.
///
/// # Examples
///
/// ```
/// use para_auth::canonical::append_uri;
///
/// assert_eq!(append_uri("/", "/v1/users/a b"), "/v1/users/a%20b");
/// assert_eq!(append_uri("/api", "v1/users"), "/api/v1/users");
/// assert_eq!(append_uri("", ""), "/");
/// ```
#[must_use]
pub fn append_uri(base_path: &str, resource_path: &str) -> String {
    let mut result = base_path.to_owned();

    if resource_path.is_empty() {
        if !result.ends_with('/') {
            result.push('/');
        }
        return result;
    }

    if resource_path.starts_with('/') {
        if result.ends_with('/') {
            result.pop();
        }
    } else if !result.ends_with('/') {
        result.push('/');
    }
    result.push_str(&uri_encode(resource_path, true));
    result
}

/// Build the canonical URI from the (already single-encoded) wire path.
///
/// Empty paths are normalized to `/`. With `double_encode` the wire path is
/// percent-encoded once more, which is what the Para server expects by default.
///
/// # Examples
///
/// ```
/// use para_auth::canonical::build_canonical_uri;
///
/// assert_eq!(build_canonical_uri("/v1/a%20b", true), "/v1/a%2520b");
/// assert_eq!(build_canonical_uri("/v1/a%20b", false), "/v1/a%20b");
/// assert_eq!(build_canonical_uri("", true), "/");
/// ```
#[must_use]
pub fn build_canonical_uri(wire_path: &str, double_encode: bool) -> String {
    if wire_path.is_empty() {
        return "/".to_owned();
    }

    let value = if double_encode {
        uri_encode(wire_path, true)
    } else {
        wire_path.to_owned()
    };

    if value.starts_with('/') {
        value
    } else {
        format!("/{value}")
    }
}

/// Build the canonical query string.
///
/// Keys and values are encoded, values are sorted within each key and keys are
/// sorted by their encoded form. The output does not depend on input order.
/// The same string is appended to the outgoing URL.
///
/// # Examples
///
/// ```
/// use para_auth::canonical::build_canonical_query_string;
/// use para_auth::QueryParams;
///
/// let params: QueryParams = [("b", "2"), ("a", "x y"), ("a", "1")].into_iter().collect();
/// assert_eq!(build_canonical_query_string(&params), "a=1&a=x%20y&b=2");
/// ```
#[must_use]
pub fn build_canonical_query_string(params: &QueryParams) -> String {
    let mut sorted: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in params.iter() {
        sorted
            .entry(uri_encode(key, false))
            .or_default()
            .push(uri_encode(value, false));
    }

    sorted
        .into_iter()
        .flat_map(|(key, mut values)| {
            values.sort_unstable();
            values.into_iter().map(move |value| format!("{key}={value}"))
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Whether a request signs its query parameters as a form payload.
///
/// This is the case for a `POST` with an empty body and at least one parameter.
#[must_use]
pub fn uses_form_payload(method: &str, body: &[u8], params: &QueryParams) -> bool {
    method.eq_ignore_ascii_case("POST") && body.is_empty() && !params.is_empty()
}

/// Compute the payload hash and canonical query string for a request.
///
/// Returns `(payload_hash, canonical_query_string)`.
#[must_use]
pub fn hash_payload_and_query(method: &str, body: &[u8], params: &QueryParams) -> (String, String) {
    let query = build_canonical_query_string(params);
    if uses_form_payload(method, body, params) {
        (hash_payload(query.as_bytes()), String::new())
    } else {
        (hash_payload(body), query)
    }
}

/// Normalize request headers for signing.
///
/// Names are lowercased, values are trimmed with internal whitespace runs
/// collapsed to a single space. Headers sharing a name (case-insensitively)
/// are joined with commas. [`UNSIGNED_HEADERS`] are dropped.
#[must_use]
pub fn normalize_headers(headers: &Headers) -> BTreeMap<String, String> {
    let mut header_map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let lower_name = collapse_whitespace(name.trim()).to_lowercase();
        if UNSIGNED_HEADERS.contains(&lower_name.as_str()) {
            continue;
        }
        let trimmed_value = collapse_whitespace(value.trim());
        header_map
            .entry(lower_name)
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&trimmed_value);
            })
            .or_insert(trimmed_value);
    }
    header_map
}

/// Build the canonical headers block from normalized headers.
///
/// The result does NOT include a trailing newline; [`CanonicalRequest`] adds
/// the blank line that separates it from the signed header list.
#[must_use]
pub fn build_canonical_headers(headers: &BTreeMap<String, String>) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{name}:{value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the signed headers string as a semicolon-separated list of lowercase header names.
///
/// # Examples
///
/// ```
/// use para_auth::canonical::build_signed_headers_string;
///
/// assert_eq!(
///     build_signed_headers_string(&["x-amz-date", "host"]),
///     "host;x-amz-date"
/// );
/// ```
#[must_use]
pub fn build_signed_headers_string(signed_headers: &[&str]) -> String {
    let mut sorted: Vec<String> = signed_headers.iter().map(|h| h.to_lowercase()).collect();
    sorted.sort_unstable();
    sorted.join(";")
}

/// A fully canonicalized request, computed fresh for every signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    /// Upper-case HTTP method.
    pub http_method: String,
    /// Host header value the signature was computed for.
    pub host: String,
    /// Canonical URI.
    pub path: String,
    /// Canonical query string (may be empty).
    pub canonical_query_string: String,
    /// `name:value` lines, sorted by name, without trailing newline.
    pub canonical_headers: String,
    /// Semicolon-separated lowercase header names.
    pub signed_header_names: String,
    /// Hex SHA-256 of the payload.
    pub payload_hash: String,
}

impl CanonicalRequest {
    /// Assemble a canonical request from normalized components.
    ///
    /// `headers` must already be normalized (see [`normalize_headers`]) and
    /// contain the `host` and `x-amz-date` entries.
    #[must_use]
    pub fn new(
        http_method: &str,
        path: String,
        canonical_query_string: String,
        headers: &BTreeMap<String, String>,
        payload_hash: String,
    ) -> Self {
        let names: Vec<&str> = headers.keys().map(String::as_str).collect();
        Self {
            http_method: http_method.to_ascii_uppercase(),
            host: headers.get("host").cloned().unwrap_or_default(),
            path,
            canonical_query_string,
            canonical_headers: build_canonical_headers(headers),
            signed_header_names: build_signed_headers_string(&names),
            payload_hash,
        }
    }

    /// Hex SHA-256 of the canonical request string.
    #[must_use]
    pub fn hash(&self) -> String {
        hex::encode(Sha256::digest(self.to_string().as_bytes()))
    }
}

impl fmt::Display for CanonicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{}\n{}\n{}\n\n{}\n{}",
            self.http_method,
            self.path,
            self.canonical_query_string,
            self.canonical_headers,
            self.signed_header_names,
            self.payload_hash
        )
    }
}

/// Collapse consecutive whitespace characters in a string to a single space.
fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    result
}
