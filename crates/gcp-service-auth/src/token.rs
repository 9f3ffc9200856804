use std::fmt;
use std::sync::Arc;

use http::HeaderValue;
use time::OffsetDateTime;

use crate::{Error, Scopes, TokenFuture, TokenSource};

/// A bearer token. Cheap to clone.
///
/// The expiry is whatever the token endpoint reported, it's informational only. Nothing in
/// this crate refreshes a token.
#[derive(Clone, PartialEq)]
pub struct Token {
    access_token: Arc<str>,
    expires_at: Option<OffsetDateTime>,
}

/// The body returned by an OAuth token endpoint.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct RawToken {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
}

impl Token {
    pub fn new(access_token: impl Into<Arc<str>>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    pub fn with_expires_at(mut self, expires_at: OffsetDateTime) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub(crate) fn from_raw(raw: RawToken, provider: &'static str) -> Result<Self, Error> {
        let access_token = match raw.access_token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(Error::NoToken { provider }),
        };

        if let Some(token_type) = raw.token_type.as_deref()
            && !token_type.eq_ignore_ascii_case("bearer")
        {
            warn!(message = "unexpected token type", token_type, provider);
        }

        // an expiry past what OffsetDateTime can hold is dropped
        let expires_at = raw.expires_in.and_then(|secs| {
            OffsetDateTime::now_utc().checked_add(time::Duration::seconds(secs))
        });

        Ok(Self {
            access_token: Arc::from(access_token),
            expires_at,
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.expires_at
    }

    /// Builds the `Authorization` header value, `Bearer <token>`.
    pub fn header_value(&self) -> Result<HeaderValue, Error> {
        const BEARER_PREFIX: &str = "Bearer ";

        let mut dst = String::with_capacity(BEARER_PREFIX.len() + self.access_token.len());
        dst.push_str(BEARER_PREFIX);
        dst.push_str(&self.access_token);

        let mut header = HeaderValue::try_from(dst)?;
        header.set_sensitive(true);
        Ok(header)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"...") // dont log tokens
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A [`TokenSource`] that hands out a token obtained elsewhere, e.g. from a cache kept by
/// the host process.
#[derive(Debug, Clone)]
pub struct StaticToken(pub Token);

impl TokenSource for StaticToken {
    fn name(&self) -> &'static str {
        "static token"
    }

    fn fetch_token(&self, _scopes: Scopes) -> TokenFuture<'_> {
        let token = self.0.clone();
        Box::pin(async move { Ok(token) })
    }
}
