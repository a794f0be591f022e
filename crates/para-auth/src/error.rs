//! Error types for Para request signing and verification.
//!
//! Signing failures never escape [`Signer::sign_request`](crate::Signer::sign_request):
//! they are logged and the request goes out unsigned. The lower-level
//! [`Signer::sign`](crate::Signer::sign) and [`verify_signature`](crate::verify_signature)
//! surface them as [`AuthError`].

/// Errors that can occur while signing or verifying a Para request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The access key is empty or whitespace.
    #[error("Blank access key")]
    BlankAccessKey,

    /// The secret key is empty, so no signature can be computed.
    #[error("Missing secret key for access key: {0}")]
    MissingSecretKey(String),

    /// The endpoint could not be parsed as an absolute URL with a host.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// A header name or value could not be carried by an HTTP request.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The `Authorization` header is missing from the request.
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    /// The `Authorization` header could not be parsed.
    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    /// The signing algorithm is not supported (only AWS4-HMAC-SHA256 is supported).
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A required HTTP header referenced in `SignedHeaders` is missing.
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// The `Credential` component does not match
    /// `AKID/date/us-east-1/para/aws4_request`.
    #[error("Invalid credential format")]
    InvalidCredential,

    /// The access key ID was not found in the credential store.
    #[error("Access key not found: {0}")]
    AccessKeyNotFound(String),

    /// The computed signature does not match the provided signature.
    #[error("Signature does not match")]
    SignatureDoesNotMatch,
}
