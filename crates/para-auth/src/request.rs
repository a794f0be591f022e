//! Request descriptors consumed and produced by the [`Signer`](crate::Signer).
//!
//! [`SigningRequest`] is what the client layer hands in: method, endpoint,
//! resource path, headers, parameters and raw body. [`SignedRequest`] is what
//! comes back from [`Signer::invoke_signed_request`](crate::Signer::invoke_signed_request):
//! a final URL, headers with authentication attached and the body bytes, ready
//! for whatever transport the caller uses.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use http::Method;
use serde::{Deserialize, Serialize, Serializer};
use tracing::error;
use typed_builder::TypedBuilder;

use crate::canonical::uri_encode;
use crate::error::AuthError;

/// Header map keyed by header name as supplied by the caller.
pub type Headers = BTreeMap<String, String>;

/// Ordered, multi-valued query parameters.
///
/// A key may appear several times. Order is kept for inspection but does not
/// affect the canonical query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Create an empty parameter list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one value for `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.push((key.into(), value.into()));
        self
    }

    /// Builder-style variant of [`append`](Self::append).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(key, value);
        self
    }

    /// Append every value in `values` under `key`.
    pub fn extend_values<I, V>(&mut self, key: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        for value in values {
            self.append(key, value);
        }
        self
    }

    /// All values recorded for `key`, in insertion order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether no parameter is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of key/value pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The first value recorded for each key, keys in order of first appearance.
    ///
    /// Only these pairs are signed; the URL still carries every value.
    ///
    /// # Examples
    ///
    /// ```
    /// use para_auth::QueryParams;
    ///
    /// let params = QueryParams::new().with("ids", "b").with("limit", "5").with("ids", "a");
    /// assert_eq!(
    ///     params.first_values().iter().collect::<Vec<_>>(),
    ///     vec![("ids", "b"), ("limit", "5")]
    /// );
    /// ```
    #[must_use]
    pub fn first_values(&self) -> Self {
        let mut seen = HashSet::new();
        self.iter().filter(|(key, _)| seen.insert(*key)).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Everything the signer needs to authenticate one outgoing request.
///
/// # Examples
///
/// ```
/// use para_auth::SigningRequest;
///
/// let request = SigningRequest::builder()
///     .method(http::Method::GET)
///     .endpoint("https://api.example.com")
///     .resource_path("/v1/users/123")
///     .build();
/// assert!(request.body.is_none());
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct SigningRequest {
    /// HTTP method.
    #[builder(default = Method::GET)]
    pub method: Method,

    /// Base endpoint, e.g. `https://paraio.com`; `https://` is assumed when no scheme is given.
    #[builder(setter(into))]
    pub endpoint: String,

    /// Resource path relative to the endpoint, unencoded, e.g. `/v1/users/123`.
    #[builder(default, setter(into))]
    pub resource_path: String,

    /// Caller headers. `host` and `x-amz-date` are replaced by the signer.
    #[builder(default)]
    pub headers: Headers,

    /// Query parameters.
    #[builder(default)]
    pub params: QueryParams,

    /// Raw request body; `None` and empty are equivalent.
    #[builder(default, setter(strip_option, into))]
    pub body: Option<Vec<u8>>,

    /// Fixed signing instant. When absent the signer uses a parseable caller
    /// `x-amz-date` header, then the wall clock.
    #[builder(default, setter(strip_option))]
    pub signing_time: Option<DateTime<Utc>>,
}

/// A request with authentication attached, ready to dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedRequest {
    /// HTTP method.
    #[serde(serialize_with = "serialize_method")]
    pub method: Method,
    /// Final URL: endpoint, single-encoded path and canonical query string.
    pub url: String,
    /// Caller headers plus `Authorization` (and `X-Amz-Date` when signed).
    pub headers: Headers,
    /// JSON body bytes; empty when there is no entity.
    #[serde(serialize_with = "serialize_body")]
    pub body: Vec<u8>,
}

impl SignedRequest {
    /// Look up a header value by name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        get_header(&self.headers, name)
    }

    /// Convert into an [`http::Request`] for an HTTP client.
    ///
    /// Adds `Content-Type: application/json` when there is a body and the
    /// caller did not set a content type.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidHeader`] if the URL or a header cannot be
    /// represented by the `http` crate.
    pub fn into_http_request(self) -> Result<http::Request<Vec<u8>>, AuthError> {
        let has_content_type = get_header(&self.headers, "content-type").is_some();
        let mut builder = http::Request::builder()
            .method(self.method)
            .uri(self.url.as_str());

        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !self.body.is_empty() && !has_content_type {
            builder = builder.header(http::header::CONTENT_TYPE, "application/json");
        }

        builder
            .body(self.body)
            .map_err(|e| AuthError::InvalidHeader(e.to_string()))
    }
}

/// Prefix `https://` to an endpoint that has no scheme.
///
/// # Examples
///
/// ```
/// use para_auth::request::normalize_endpoint;
///
/// assert_eq!(normalize_endpoint("paraio.com"), "https://paraio.com");
/// assert_eq!(normalize_endpoint("http://localhost:8080"), "http://localhost:8080");
/// ```
#[must_use]
pub fn normalize_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    if endpoint.contains("://") {
        endpoint.to_owned()
    } else {
        format!("https://{endpoint}")
    }
}

/// Build the final request URL.
///
/// The resource path is percent-encoded once, keeping slashes. Query keys are
/// sorted by their encoded form; the values of a repeated key keep their
/// insertion order, so the first one on the wire is the one that was signed.
///
/// # Examples
///
/// ```
/// use para_auth::request::build_url;
/// use para_auth::QueryParams;
///
/// let params = QueryParams::new().with("q", "a b");
/// assert_eq!(
///     build_url("https://api.example.com", "/v1/search", &params),
///     "https://api.example.com/v1/search?q=a%20b"
/// );
/// ```
#[must_use]
pub fn build_url(endpoint: &str, resource_path: &str, params: &QueryParams) -> String {
    let mut url = normalize_endpoint(endpoint);
    let path = uri_encode(resource_path, true);

    match (url.ends_with('/'), path.starts_with('/')) {
        (true, true) => {
            url.pop();
        }
        (false, false) if !path.is_empty() => url.push('/'),
        _ => {}
    }
    url.push_str(&path);

    let query = encode_query(params);
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query);
    }
    url
}

fn encode_query(params: &QueryParams) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(key, value)| (uri_encode(key, false), uri_encode(value, false)))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Serialize an entity as compact JSON.
///
/// `None` yields an empty body. A serialization failure is logged and also
/// yields an empty body.
#[must_use]
pub fn json_bytes<T: Serialize + ?Sized>(entity: Option<&T>) -> Vec<u8> {
    let Some(entity) = entity else {
        return Vec::new();
    };
    serde_json::to_vec(entity).unwrap_or_else(|e| {
        error!(error = %e, "Object could not be converted to JSON bytes");
        Vec::new()
    })
}

/// Look up a header value by name, ignoring case.
#[must_use]
pub fn get_header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Insert a header, replacing any existing entries with the same name in another case.
pub fn insert_header(headers: &mut Headers, name: &str, value: impl Into<String>) {
    headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
    headers.insert(name.to_owned(), value.into());
}

fn serialize_method<S: Serializer>(method: &Method, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(method.as_str())
}

fn serialize_body<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(body))
}
