//! Configuration, domain objects and validation constraints for the Para client.
//!
//! This crate holds the pieces shared by the client and the `para-sign`
//! binary that have nothing to do with signing itself: where the server lives
//! and which keys to use ([`ClientConfig`]), the generic [`ParaObject`], and
//! the [`Constraint`] variants the server's validation API accepts.

mod config;
mod constraint;
mod error;
mod object;

pub use config::{ClientConfig, DEFAULT_API_PATH, DEFAULT_ENDPOINT, JWT_PATH};
pub use constraint::Constraint;
pub use error::{ParaError, ParaResult};
pub use object::{DEFAULT_APPID, DEFAULT_TYPE, ParaObject};
