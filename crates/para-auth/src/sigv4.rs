//! SigV4 primitives with the fixed Para credential scope.
//!
//! Para reuses the AWS Signature Version 4 algorithm but never derives the
//! region or service from the endpoint: every signature is scoped to
//! `<date>/us-east-1/para/aws4_request`, wherever the server actually runs.
//!
//! ```text
//! DateKey              = HMAC-SHA256("AWS4" + secret_key, date)
//! DateRegionKey        = HMAC-SHA256(DateKey, "us-east-1")
//! DateRegionServiceKey = HMAC-SHA256(DateRegionKey, "para")
//! SigningKey           = HMAC-SHA256(DateRegionServiceKey, "aws4_request")
//! Signature            = hex(HMAC-SHA256(SigningKey, StringToSign))
//! ```

use hmac::{Hmac, KeyInit, Mac};
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// The only algorithm produced and accepted.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Service name used in every credential scope.
pub const SERVICE_NAME: &str = "para";

/// Region used in every credential scope.
pub const REGION: &str = "us-east-1";

/// Terminator of the credential scope.
pub const SCOPE_TERMINATOR: &str = "aws4_request";

/// SHA-256 of the empty string, the payload hash of bodyless requests.
pub const EMPTY_PAYLOAD_HASH: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Name of the header carrying the signature.
pub const AUTHORIZATION: &str = "Authorization";

/// Name of the header carrying the signing timestamp.
pub const X_AMZ_DATE: &str = "X-Amz-Date";

/// Name of the host header added by the signer.
pub const HOST: &str = "Host";

type HmacSha256 = Hmac<Sha256>;

/// Parsed components of a Para `Authorization` header.
///
/// Format:
/// ```text
/// AWS4-HMAC-SHA256 Credential=AKID/20240101/us-east-1/para/aws4_request,
///   SignedHeaders=host;x-amz-date,
///   Signature=<hex-signature>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAuth {
    /// The access key ID.
    pub access_key_id: String,
    /// The date component of the credential scope (YYYYMMDD).
    pub date: String,
    /// The region from the credential scope.
    pub region: String,
    /// The service from the credential scope.
    pub service: String,
    /// The list of signed header names (lowercase).
    pub signed_headers: Vec<String>,
    /// The hex-encoded signature.
    pub signature: String,
}

/// Compute the SHA-256 hash of a payload and return it as a hex string.
///
/// # Examples
///
/// ```
/// use para_auth::sigv4::{EMPTY_PAYLOAD_HASH, hash_payload};
///
/// assert_eq!(hash_payload(b""), EMPTY_PAYLOAD_HASH);
/// ```
#[must_use]
pub fn hash_payload(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Build the credential scope for a date stamp.
///
/// # Examples
///
/// ```
/// use para_auth::sigv4::build_credential_scope;
///
/// assert_eq!(build_credential_scope("20240101"), "20240101/us-east-1/para/aws4_request");
/// ```
#[must_use]
pub fn build_credential_scope(date_stamp: &str) -> String {
    format!("{date_stamp}/{REGION}/{SERVICE_NAME}/{SCOPE_TERMINATOR}")
}

/// Build the SigV4 string to sign.
///
/// Format:
/// ```text
/// AWS4-HMAC-SHA256\n
/// <ISO8601 basic timestamp>\n
/// <credential_scope>\n
/// <hex(SHA256(canonical_request))>
/// ```
#[must_use]
pub fn build_string_to_sign(
    timestamp: &str,
    credential_scope: &str,
    canonical_request_hash: &str,
) -> String {
    format!("{ALGORITHM}\n{timestamp}\n{credential_scope}\n{canonical_request_hash}")
}

/// Derive the signing key using the four-step HMAC-SHA256 chain.
///
/// `region` and `service` are parameters so the chain can be checked against
/// the published AWS vectors; Para signing always passes [`REGION`] and
/// [`SERVICE_NAME`].
#[must_use]
pub fn derive_signing_key(secret_key: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let date_key = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date.as_bytes());
    let date_region_key = hmac_sha256(&date_key, region.as_bytes());
    let date_region_service_key = hmac_sha256(&date_region_key, service.as_bytes());
    hmac_sha256(&date_region_service_key, SCOPE_TERMINATOR.as_bytes())
}

/// Compute the hex-encoded HMAC-SHA256 signature of `data`.
#[must_use]
pub fn compute_signature(signing_key: &[u8], data: &str) -> String {
    hex::encode(hmac_sha256(signing_key, data.as_bytes()))
}

/// Render the `Authorization` header value for a computed signature.
///
/// # Examples
///
/// ```
/// use para_auth::sigv4::build_authorization_header;
///
/// let value = build_authorization_header(
///     "AK",
///     "20240101/us-east-1/para/aws4_request",
///     "host;x-amz-date",
///     "abc",
/// );
/// assert_eq!(
///     value,
///     "AWS4-HMAC-SHA256 Credential=AK/20240101/us-east-1/para/aws4_request, \
///      SignedHeaders=host;x-amz-date, Signature=abc"
/// );
/// ```
#[must_use]
pub fn build_authorization_header(
    access_key: &str,
    credential_scope: &str,
    signed_headers: &str,
    signature: &str,
) -> String {
    format!(
        "{ALGORITHM} Credential={access_key}/{credential_scope}, \
         SignedHeaders={signed_headers}, Signature={signature}"
    )
}

/// Parse a SigV4 `Authorization` header value into its components.
///
/// Accepts both `", "` and `","` as separators.
///
/// # Errors
///
/// Returns [`AuthError::InvalidAuthHeader`] if the header format is invalid,
/// [`AuthError::UnsupportedAlgorithm`] if the algorithm is not `AWS4-HMAC-SHA256`,
/// or [`AuthError::InvalidCredential`] if the credential scope is malformed.
pub fn parse_authorization_header(header: &str) -> Result<ParsedAuth, AuthError> {
    let (algorithm, rest) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;

    if algorithm != ALGORITHM {
        return Err(AuthError::UnsupportedAlgorithm(algorithm.to_owned()));
    }

    let mut credential = None;
    let mut signed_headers = None;
    let mut signature = None;

    for part in rest.split(',') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("Credential=") {
            credential = Some(value);
        } else if let Some(value) = part.strip_prefix("SignedHeaders=") {
            signed_headers = Some(value);
        } else if let Some(value) = part.strip_prefix("Signature=") {
            signature = Some(value);
        }
    }

    let credential = credential.ok_or(AuthError::InvalidAuthHeader)?;
    let signed_headers = signed_headers.ok_or(AuthError::InvalidAuthHeader)?;
    let signature = signature.ok_or(AuthError::InvalidAuthHeader)?;

    // AKID/date/region/service/aws4_request; the access key itself may not contain '/'.
    let cred_parts: Vec<&str> = credential.splitn(5, '/').collect();
    if cred_parts.len() != 5 || cred_parts[4] != SCOPE_TERMINATOR || cred_parts[0].is_empty() {
        return Err(AuthError::InvalidCredential);
    }

    Ok(ParsedAuth {
        access_key_id: cred_parts[0].to_owned(),
        date: cred_parts[1].to_owned(),
        region: cred_parts[2].to_owned(),
        service: cred_parts[3].to_owned(),
        signed_headers: signed_headers.split(';').map(ToOwned::to_owned).collect(),
        signature: signature.to_owned(),
    })
}

/// Compute HMAC-SHA256 and return the raw bytes.
fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
