//! The Para request signer.
//!
//! [`Signer`] turns a [`SigningRequest`] plus [`SigningCredentials`] into
//! authentication headers. It holds only configuration, so one instance can be
//! shared freely between threads; the signing instant travels with each
//! request instead of living on the signer.

use chrono::{DateTime, TimeDelta, Utc};
use http::Uri;
use tracing::{debug, error};

use crate::canonical::{
    CanonicalRequest, append_uri, build_canonical_uri, hash_payload_and_query, normalize_headers,
};
use crate::config::SignerConfig;
use crate::credentials::{AuthMode, SigningCredentials};
use crate::date::{format_aws_date, format_date_stamp, parse_aws_date};
use crate::error::AuthError;
use crate::request::{
    Headers, SignedRequest, SigningRequest, build_url, get_header, insert_header,
    normalize_endpoint,
};
use crate::sigv4::{
    AUTHORIZATION, HOST, REGION, SERVICE_NAME, X_AMZ_DATE, build_authorization_header,
    build_credential_scope, build_string_to_sign, compute_signature, derive_signing_key,
};

/// Signs outgoing Para API requests.
///
/// # Examples
///
/// ```
/// use para_auth::{Signer, SignerConfig, SigningCredentials, SigningRequest};
///
/// let signer = Signer::new(SignerConfig::default());
/// let request = SigningRequest::builder()
///     .endpoint("https://api.example.com")
///     .resource_path("/v1/users/123")
///     .signing_time(para_auth::date::parse_aws_date("20240101T000000Z").unwrap())
///     .build();
///
/// let headers = signer.sign_request(&request, &SigningCredentials::new("AK", "SK"));
/// assert!(headers["Authorization"].starts_with("AWS4-HMAC-SHA256 Credential=AK/20240101/"));
/// assert_eq!(headers["X-Amz-Date"], "20240101T000000Z");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Signer {
    config: SignerConfig,
}

impl Signer {
    /// Create a signer with the given configuration.
    #[must_use]
    pub fn new(config: SignerConfig) -> Self {
        Self { config }
    }

    /// The signer configuration.
    #[must_use]
    pub fn config(&self) -> &SignerConfig {
        &self.config
    }

    /// Compute a SigV4 signature for the request.
    ///
    /// Returns the caller's headers without any `host` or `x-amz-date`
    /// entries, plus `Host`, `X-Amz-Date` and `Authorization`. The secret slot
    /// is used as the signing key whatever its content; mode selection is
    /// [`sign_request`](Self::sign_request)'s job.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::BlankAccessKey`] or [`AuthError::MissingSecretKey`]
    /// for unusable credentials and [`AuthError::InvalidEndpoint`] when the
    /// endpoint is not an absolute URL with a host.
    pub fn sign(
        &self,
        request: &SigningRequest,
        credentials: &SigningCredentials,
    ) -> Result<Headers, AuthError> {
        let access_key = credentials.access_key();
        if access_key.is_empty() {
            return Err(AuthError::BlankAccessKey);
        }
        let secret_key = credentials
            .secret_key()
            .ok_or_else(|| AuthError::MissingSecretKey(access_key.to_owned()))?;

        let endpoint = parse_endpoint(&request.endpoint)?;
        let instant = self.signing_time(request);
        let timestamp = format_aws_date(instant);
        let date_stamp = format_date_stamp(instant);

        let mut headers = strip_signer_headers(&request.headers);
        headers.insert(HOST.to_owned(), endpoint.host);
        headers.insert(X_AMZ_DATE.to_owned(), timestamp.clone());

        let method = request.method.as_str();
        let body = request.body.as_deref().unwrap_or_default();
        let params = request.params.first_values();
        let (payload_hash, query) = hash_payload_and_query(method, body, &params);
        let wire_path = append_uri(&endpoint.base_path, &request.resource_path);

        let canonical = CanonicalRequest::new(
            method,
            build_canonical_uri(&wire_path, self.config.double_url_encode),
            query,
            &normalize_headers(&headers),
            payload_hash,
        );
        debug!(canonical_request = %canonical, "Built canonical request");

        let credential_scope = build_credential_scope(&date_stamp);
        let string_to_sign = build_string_to_sign(&timestamp, &credential_scope, &canonical.hash());
        debug!(string_to_sign, "Built string to sign");

        let signing_key = derive_signing_key(secret_key, &date_stamp, REGION, SERVICE_NAME);
        let signature = compute_signature(&signing_key, &string_to_sign);

        headers.insert(
            AUTHORIZATION.to_owned(),
            build_authorization_header(
                access_key,
                &credential_scope,
                &canonical.signed_header_names,
                &signature,
            ),
        );
        Ok(headers)
    }

    /// Authenticate a request in whichever mode the credentials select.
    ///
    /// Never fails: a blank access key is logged as an error and a signing
    /// failure is logged at debug level; both return the caller's headers
    /// unchanged so the server rejects the request.
    #[must_use]
    pub fn sign_request(&self, request: &SigningRequest, credentials: &SigningCredentials) -> Headers {
        let access_key = credentials.access_key();
        if access_key.is_empty() {
            error!(
                method = %request.method,
                resource_path = %request.resource_path,
                "Blank access key"
            );
            return request.headers.clone();
        }

        match credentials.mode() {
            AuthMode::Anonymous => {
                debug!(
                    method = %request.method,
                    resource_path = %request.resource_path,
                    "Anonymous request"
                );
                let mut headers = request.headers.clone();
                insert_header(&mut headers, AUTHORIZATION, format!("Anonymous {access_key}"));
                headers
            }
            AuthMode::Bearer => {
                let mut headers = request.headers.clone();
                if let Some(token) = credentials.secret_key() {
                    insert_header(&mut headers, AUTHORIZATION, token);
                }
                headers
            }
            AuthMode::Signature => self.sign(request, credentials).unwrap_or_else(|e| {
                debug!(error = %e, resource_path = %request.resource_path, "Failed to sign request");
                request.headers.clone()
            }),
        }
    }

    /// Assemble a ready-to-dispatch request.
    ///
    /// The URL carries the single-encoded path and the canonical query
    /// string. Bearer tokens go into `Authorization` as-is; in the other modes
    /// `Authorization` and `X-Amz-Date` are taken from
    /// [`sign_request`](Self::sign_request). `Host` is left to the transport.
    #[must_use]
    pub fn invoke_signed_request(
        &self,
        request: &SigningRequest,
        credentials: &SigningCredentials,
    ) -> SignedRequest {
        let url = build_url(&request.endpoint, &request.resource_path, &request.params);
        let mut headers = strip_signer_headers(&request.headers);

        if credentials.mode() == AuthMode::Bearer {
            if let Some(token) = credentials.secret_key() {
                insert_header(&mut headers, AUTHORIZATION, token);
            }
        } else {
            let signed = self.sign_request(request, credentials);
            for name in [AUTHORIZATION, X_AMZ_DATE] {
                if let Some(value) = get_header(&signed, name) {
                    insert_header(&mut headers, name, value);
                }
            }
        }

        SignedRequest {
            method: request.method.clone(),
            url,
            headers,
            body: request.body.clone().unwrap_or_default(),
        }
    }

    /// Resolve the signing instant: explicit time, then caller `x-amz-date`, then the clock.
    fn signing_time(&self, request: &SigningRequest) -> DateTime<Utc> {
        if let Some(instant) = request.signing_time {
            return instant;
        }
        if let Some(instant) = get_header(&request.headers, X_AMZ_DATE).and_then(parse_aws_date) {
            return instant;
        }
        let offset =
            TimeDelta::try_seconds(self.config.clock_offset_secs).unwrap_or_else(TimeDelta::zero);
        Utc::now() - offset
    }
}

/// Host and base path of a parsed endpoint.
#[derive(Debug)]
struct Endpoint {
    host: String,
    base_path: String,
}

fn parse_endpoint(endpoint: &str) -> Result<Endpoint, AuthError> {
    let normalized = normalize_endpoint(endpoint);
    let uri: Uri = normalized
        .parse()
        .map_err(|e: http::uri::InvalidUri| AuthError::InvalidEndpoint(format!("{normalized}: {e}")))?;
    let host = host_header_value(&uri).ok_or_else(|| AuthError::InvalidEndpoint(normalized.clone()))?;

    Ok(Endpoint {
        host,
        base_path: uri.path().to_owned(),
    })
}

/// The `Host` header value for a URI: the host, plus the port when it is not
/// the scheme's default.
pub(crate) fn host_header_value(uri: &Uri) -> Option<String> {
    let host = uri.host().filter(|h| !h.is_empty())?;
    let default_port = match uri.scheme_str() {
        Some("http") => Some(80),
        Some("https") => Some(443),
        _ => None,
    };

    match uri.port_u16() {
        Some(port) if Some(port) != default_port => Some(format!("{host}:{port}")),
        _ => Some(host.to_owned()),
    }
}

/// Copy of the caller headers without `host` and `x-amz-date`, which the signer owns.
fn strip_signer_headers(headers: &Headers) -> Headers {
    headers
        .iter()
        .filter(|(name, _)| !name.eq_ignore_ascii_case(HOST) && !name.eq_ignore_ascii_case(X_AMZ_DATE))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;
    use crate::request::QueryParams;

    const ENDPOINT: &str = "https://api.example.com";

    fn fixed_time() -> DateTime<Utc> {
        parse_aws_date("20240101T000000Z").unwrap()
    }

    fn credentials() -> SigningCredentials {
        SigningCredentials::new("AK", "SK")
    }

    fn get(path: &str) -> SigningRequest {
        SigningRequest::builder()
            .endpoint(ENDPOINT)
            .resource_path(path)
            .signing_time(fixed_time())
            .build()
    }

    fn signature_of(headers: &Headers) -> String {
        let authorization = get_header(headers, AUTHORIZATION).unwrap();
        authorization
            .rsplit_once("Signature=")
            .map(|(_, sig)| sig.to_owned())
            .unwrap()
    }

    fn sign(request: &SigningRequest) -> String {
        signature_of(&Signer::default().sign(request, &credentials()).unwrap())
    }

    #[test]
    fn test_should_match_reference_signature_for_simple_get() {
        let headers = Signer::default().sign(&get("/v1/users/123"), &credentials()).unwrap();

        assert_eq!(
            headers[AUTHORIZATION],
            "AWS4-HMAC-SHA256 Credential=AK/20240101/us-east-1/para/aws4_request, \
             SignedHeaders=host;x-amz-date, \
             Signature=ca11074966b3d1b23d82371ede130f77c3e06fee6291832bc1ca693213ca7276"
        );
        assert_eq!(headers[X_AMZ_DATE], "20240101T000000Z");
        assert_eq!(headers[HOST], "api.example.com");
    }

    #[test]
    fn test_should_double_encode_path_in_signature_only() {
        let request = get("/v1/users/a b");
        assert_eq!(
            sign(&request),
            "cb3a4b65595a4f58e29dc37c62f8fac749e12ab03748a1996bd38572412866af"
        );

        let signed = Signer::default().invoke_signed_request(&request, &credentials());
        assert_eq!(signed.url, "https://api.example.com/v1/users/a%20b");
    }

    #[test]
    fn test_should_sign_single_encoded_path_when_configured() {
        let signer = Signer::new(SignerConfig::builder().double_url_encode(false).build());
        let headers = signer.sign(&get("/v1/users/a b"), &credentials()).unwrap();
        assert_eq!(
            signature_of(&headers),
            "06dc8b2c223b8e4f80df7ee8a2764964805911a06710540669b42c7b01928843"
        );
    }

    #[test]
    fn test_should_match_reference_signature_with_query_parameters() {
        let request = SigningRequest::builder()
            .endpoint(ENDPOINT)
            .resource_path("/v1/search")
            .params(QueryParams::new().with("q", "hello world").with("limit", "10"))
            .signing_time(fixed_time())
            .build();
        assert_eq!(
            sign(&request),
            "d9dab0057d8e0892ff3ea5f1c32b02e7f49bf6567371ede9943a0d61e511edfa"
        );
    }

    #[test]
    fn test_should_sign_only_first_value_of_repeated_parameter() {
        let request = SigningRequest::builder()
            .endpoint(ENDPOINT)
            .resource_path("/v1/_batch")
            .params(QueryParams::new().with("ids", "b").with("ids", "a"))
            .signing_time(fixed_time())
            .build();
        assert_eq!(
            sign(&request),
            "7aef7d5b9dda3697ba4b89f1e462b20f9ed7e2396e6aec9a8907182ac5b65b3a"
        );

        let signed = Signer::default().invoke_signed_request(&request, &credentials());
        assert_eq!(signed.url, "https://api.example.com/v1/_batch?ids=b&ids=a");
    }

    #[test]
    fn test_should_match_reference_signature_for_post_with_body() {
        let request = SigningRequest::builder()
            .method(Method::POST)
            .endpoint(ENDPOINT)
            .resource_path("/v1/users")
            .body(br#"{"name":"test"}"#.to_vec())
            .signing_time(fixed_time())
            .build();
        assert_eq!(
            sign(&request),
            "069781b6aea7d62a5b04076479c7f791733e5b7b39237d9821b9d69b5e3debb9"
        );
    }

    #[test]
    fn test_should_sign_bodyless_post_parameters_as_payload() {
        let request = SigningRequest::builder()
            .method(Method::POST)
            .endpoint(ENDPOINT)
            .resource_path("/v1/users")
            .params(QueryParams::new().with("a", "1"))
            .signing_time(fixed_time())
            .build();
        assert_eq!(
            sign(&request),
            "9ffcde95d49e6db73d5d1bbc6b1e161e730eca7a9a35230a21d71454b1926071"
        );
    }

    #[test]
    fn test_should_include_non_default_port_in_host() {
        let request = SigningRequest::builder()
            .endpoint("https://localhost:8080")
            .resource_path("/v1/users/123")
            .signing_time(fixed_time())
            .build();
        let headers = Signer::default().sign(&request, &credentials()).unwrap();

        assert_eq!(headers[HOST], "localhost:8080");
        assert_eq!(
            signature_of(&headers),
            "04837284eecb2e7f587f153886019bac0a36bd8e633b38d49ffa285b749fc9a2"
        );
    }

    #[test]
    fn test_should_omit_default_port_from_host() {
        let request = SigningRequest::builder()
            .endpoint("https://api.example.com:443")
            .resource_path("/v1/users/123")
            .signing_time(fixed_time())
            .build();
        assert_eq!(
            sign(&request),
            "ca11074966b3d1b23d82371ede130f77c3e06fee6291832bc1ca693213ca7276"
        );
    }

    #[test]
    fn test_should_sign_caller_headers() {
        let mut request = get("/v1/users/123");
        request
            .headers
            .insert("Content-Type".to_owned(), "application/json".to_owned());

        let headers = Signer::default().sign(&request, &credentials()).unwrap();
        assert!(headers[AUTHORIZATION].contains("SignedHeaders=content-type;host;x-amz-date,"));
        assert_eq!(
            signature_of(&headers),
            "096c793f6190ab93d2c4c77d58aa4ea1d98d41ae69a3a74c22bcaf37b4a8f2de"
        );
    }

    #[test]
    fn test_should_not_sign_connection_header() {
        let mut request = get("/v1/users/123");
        request
            .headers
            .insert("Connection".to_owned(), "keep-alive".to_owned());
        assert_eq!(
            sign(&request),
            "ca11074966b3d1b23d82371ede130f77c3e06fee6291832bc1ca693213ca7276"
        );
    }

    #[test]
    fn test_should_replace_caller_host_header() {
        let mut request = get("/v1/users/123");
        request.headers.insert("host".to_owned(), "evil.example.com".to_owned());

        let headers = Signer::default().sign(&request, &credentials()).unwrap();
        assert!(!headers.contains_key("host"));
        assert_eq!(headers[HOST], "api.example.com");
        assert_eq!(
            signature_of(&headers),
            "ca11074966b3d1b23d82371ede130f77c3e06fee6291832bc1ca693213ca7276"
        );
    }

    #[test]
    fn test_should_be_deterministic() {
        let request = get("/v1/users/123");
        let signer = Signer::default();
        assert_eq!(
            signer.sign(&request, &credentials()).unwrap(),
            signer.sign(&request, &credentials()).unwrap()
        );
    }

    #[test]
    fn test_should_change_signature_when_any_input_changes() {
        let base = SigningRequest::builder()
            .method(Method::PUT)
            .endpoint(ENDPOINT)
            .resource_path("/v1/users/123")
            .params(QueryParams::new().with("a", "1"))
            .body(b"x".to_vec())
            .signing_time(fixed_time())
            .build();
        let reference = sign(&base);

        let mut param = base.clone();
        param.params = QueryParams::new().with("a", "2");
        assert_ne!(sign(&param), reference);

        let mut header = base.clone();
        header.headers.insert("X-Custom".to_owned(), "v".to_owned());
        assert_ne!(sign(&header), reference);

        let mut body = base.clone();
        body.body = Some(b"y".to_vec());
        assert_ne!(sign(&body), reference);

        let mut path = base;
        path.resource_path = "/v1/users/124".to_owned();
        assert_ne!(sign(&path), reference);
    }

    #[test]
    fn test_should_ignore_parameter_order() {
        let mut forward = get("/v1/search");
        forward.params = QueryParams::new().with("a", "1").with("b", "2");
        let mut backward = get("/v1/search");
        backward.params = QueryParams::new().with("b", "2").with("a", "1");
        assert_eq!(sign(&forward), sign(&backward));
    }

    #[test]
    fn test_should_use_caller_date_header_as_override() {
        let mut request = SigningRequest::builder()
            .endpoint(ENDPOINT)
            .resource_path("/v1/users/123")
            .build();
        request
            .headers
            .insert("x-amz-date".to_owned(), "20240101T000000Z".to_owned());

        let headers = Signer::default().sign(&request, &credentials()).unwrap();
        assert_eq!(headers[X_AMZ_DATE], "20240101T000000Z");
        assert!(!headers.contains_key("x-amz-date"));
        assert_eq!(
            signature_of(&headers),
            "ca11074966b3d1b23d82371ede130f77c3e06fee6291832bc1ca693213ca7276"
        );
    }

    #[test]
    fn test_should_prefer_explicit_signing_time_over_date_header() {
        let mut request = get("/v1/users/123");
        request
            .headers
            .insert("X-Amz-Date".to_owned(), "20991231T235959Z".to_owned());
        let headers = Signer::default().sign(&request, &credentials()).unwrap();
        assert_eq!(headers[X_AMZ_DATE], "20240101T000000Z");
    }

    #[test]
    fn test_should_apply_clock_offset_to_wall_clock() {
        let signer = Signer::new(SignerConfig::builder().clock_offset_secs(3600).build());
        let request = SigningRequest::builder()
            .endpoint(ENDPOINT)
            .resource_path("/v1")
            .build();

        let before = Utc::now();
        let headers = signer.sign(&request, &credentials()).unwrap();
        let signed_at = parse_aws_date(&headers[X_AMZ_DATE]).unwrap();

        assert!(signed_at <= before - TimeDelta::seconds(3599));
        assert!(signed_at >= before - TimeDelta::seconds(3700));
    }

    #[test]
    fn test_should_send_anonymous_authorization_for_blank_secret() {
        let request = get("/v1/users/123");
        let headers = Signer::default().sign_request(&request, &SigningCredentials::new("AK", ""));
        assert_eq!(headers[AUTHORIZATION], "Anonymous AK");
        assert!(!headers.contains_key(X_AMZ_DATE));
    }

    #[test]
    fn test_should_pass_bearer_token_verbatim() {
        let request = get("/v1/users/123");
        let credentials = SigningCredentials::new("AK", "Bearer xyz");

        let headers = Signer::default().sign_request(&request, &credentials);
        assert_eq!(headers[AUTHORIZATION], "Bearer xyz");
        assert!(!headers.contains_key(X_AMZ_DATE));

        let signed = Signer::default().invoke_signed_request(&request, &credentials);
        assert_eq!(signed.header("authorization"), Some("Bearer xyz"));
        assert_eq!(signed.header(X_AMZ_DATE), None);
    }

    #[test]
    fn test_should_return_headers_unchanged_for_blank_access_key() {
        let mut request = get("/v1/users/123");
        request.headers.insert("X-Custom".to_owned(), "1".to_owned());

        let headers = Signer::default().sign_request(&request, &SigningCredentials::new("  ", "SK"));
        assert_eq!(headers, request.headers);
        assert!(matches!(
            Signer::default().sign(&request, &SigningCredentials::new("", "SK")),
            Err(AuthError::BlankAccessKey)
        ));
    }

    #[test]
    fn test_should_degrade_to_unsigned_for_invalid_endpoint() {
        let request = SigningRequest::builder()
            .endpoint("https://bad host")
            .resource_path("/v1")
            .signing_time(fixed_time())
            .build();

        assert!(matches!(
            Signer::default().sign(&request, &credentials()),
            Err(AuthError::InvalidEndpoint(_))
        ));
        assert!(Signer::default().sign_request(&request, &credentials()).is_empty());
    }

    #[test]
    fn test_should_assemble_signed_request() {
        let request = SigningRequest::builder()
            .method(Method::POST)
            .endpoint("api.example.com")
            .resource_path("/v1/users")
            .params(QueryParams::new().with("b", "2").with("a", "1"))
            .body(br#"{"name":"test"}"#.to_vec())
            .signing_time(fixed_time())
            .build();

        let signed = Signer::default().invoke_signed_request(&request, &credentials());
        assert_eq!(signed.method, Method::POST);
        assert_eq!(signed.url, "https://api.example.com/v1/users?a=1&b=2");
        assert_eq!(signed.body, br#"{"name":"test"}"#);
        assert_eq!(signed.header(X_AMZ_DATE), Some("20240101T000000Z"));
        assert!(
            signed
                .header(AUTHORIZATION)
                .is_some_and(|v| v.starts_with("AWS4-HMAC-SHA256 "))
        );
        assert_eq!(signed.header(HOST), None);
    }
}
