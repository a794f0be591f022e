//! Request signing for the Para API.
//!
//! Para servers authenticate API calls with AWS Signature Version 4, pinned to
//! the `us-east-1` region and the `para` service whatever the server's real
//! location. This crate produces those signatures on the client side and can
//! verify them on the server side.
//!
//! # Authentication modes
//!
//! The secret slot of [`SigningCredentials`] selects the mode:
//!
//! - blank: `Authorization: Anonymous <access key>`, no signature
//! - `Bearer <jwt>`: the token is sent verbatim
//! - anything else: a full SigV4 signature
//!
//! # Usage
//!
//! ```rust
//! use para_auth::{QueryParams, Signer, SignerConfig, SigningCredentials, SigningRequest};
//!
//! let signer = Signer::new(SignerConfig::default());
//! let request = SigningRequest::builder()
//!     .method(http::Method::GET)
//!     .endpoint("https://paraio.com")
//!     .resource_path("/v1/users")
//!     .params(QueryParams::new().with("limit", "10"))
//!     .build();
//!
//! let signed = signer.invoke_signed_request(&request, &SigningCredentials::new("app:blog", "secret"));
//! assert_eq!(signed.url, "https://paraio.com/v1/users?limit=10");
//! assert!(signed.header("Authorization").is_some());
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Canonical request construction, including the double-encoded path
//! - [`config`] - Signer options
//! - [`credentials`] - Credentials, authentication modes and credential providers
//! - [`date`] - AWS basic ISO 8601 timestamps
//! - [`error`] - Authentication error types
//! - [`request`] - Request descriptors and URL assembly
//! - [`signer`] - The signer itself
//! - [`sigv4`] - SigV4 primitives with the fixed Para scope
//! - [`verify`] - Server-side signature verification

pub mod canonical;
pub mod config;
pub mod credentials;
pub mod date;
pub mod error;
pub mod request;
pub mod signer;
pub mod sigv4;
pub mod verify;

pub use config::SignerConfig;
pub use credentials::{AuthMode, CredentialProvider, SigningCredentials, StaticCredentialProvider};
pub use error::AuthError;
pub use request::{Headers, QueryParams, SignedRequest, SigningRequest};
pub use signer::Signer;
pub use verify::{VerifiedRequest, verify_signature};
