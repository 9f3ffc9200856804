//! Service-account authentication for Google REST APIs.
//!
//! The [`TokenSource`] trait is the seam between a client and whatever actually produces
//! bearer tokens. [`TokenProvider`] wraps a source and memoizes its first exchange for the
//! lifetime of the provider.

#[macro_use]
extern crate tracing;

use std::future::Future;
use std::pin::Pin;

mod error;
mod provider;
mod scope;
pub mod service_account;
mod token;

pub use error::{Error, ResponseError, SharedError};
pub use provider::TokenProvider;
pub use scope::{Scope, Scopes};
pub use service_account::{ServiceAccount, ServiceAccountKey};
pub use token::{StaticToken, Token};

pub type Result<T> = core::result::Result<T, Error>;

/// Boxed future returned by [`TokenSource::fetch_token`].
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<Token>> + Send + 'a>>;

/// Something that can exchange credentials for a bearer token.
///
/// Implementors perform a single exchange per call, with no caching of their own. Caching
/// is the job of [`TokenProvider`].
pub trait TokenSource: std::fmt::Debug + Send + Sync + 'static {
    /// Human readable name, used in logs and errors.
    fn name(&self) -> &'static str;

    fn fetch_token(&self, scopes: Scopes) -> TokenFuture<'_>;
}
