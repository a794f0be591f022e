//! Request construction and JWT session handling for the Para API.
//!
//! [`ParaClient`] resolves resource paths, picks credentials (app secret or
//! JWT) and hands back [`SignedRequest`](para_auth::SignedRequest)s ready for
//! any HTTP transport. [`JwtSession`] tracks the access token between calls.
//!
//! # Sign-in flow
//!
//! 1. Send [`ParaClient::sign_in_request`] and pass the JSON response to
//!    [`ParaClient::apply_sign_in_response`].
//! 2. Before each call, check [`ParaClient::refresh_token_request`]; when it
//!    returns a request, send it and apply the response with
//!    [`ParaClient::apply_refresh_response`].
//! 3. [`ParaClient::sign_out`] forgets the token locally;
//!    [`ParaClient::revoke_all_tokens_request`] invalidates it everywhere.

mod client;
pub mod session;

pub use client::ParaClient;
pub use session::{JwtClaims, JwtSession, decode_claims};
