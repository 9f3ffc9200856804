use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::{Scopes, SharedError, Token, TokenSource};

type SharedTokenFuture = Shared<BoxFuture<'static, Result<Token, SharedError>>>;

/// Memoizes a single token exchange.
///
/// The exchange future is built once at construction, and shared between every caller of
/// [`TokenProvider::get_token`]. The first poll starts the exchange, and every caller
/// (concurrent or later) sees the same token or the same error. The exchange is never
/// repeated, even if it fails or the first caller is dropped mid-flight. There's no expiry
/// tracking or refreshing, a provider is meant to live as long as one short-lived client.
pub struct TokenProvider {
    source_name: &'static str,
    scopes: Scopes,
    token: SharedTokenFuture,
}

impl fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenProvider")
            .field("source", &self.source_name)
            .field("scopes", &self.scopes)
            .field("resolved", &self.token.peek().is_some())
            .finish()
    }
}

impl TokenProvider {
    pub fn new(source: Arc<dyn TokenSource>, scopes: Scopes) -> Self {
        let source_name = source.name();

        let token = async move {
            match source.fetch_token(scopes).await {
                Ok(token) => {
                    debug!(message = "acquired token", source = source_name, ?token);
                    Ok(token)
                }
                Err(error) => {
                    error!(message = "token exchange failed", source = source_name, %error);
                    Err(Arc::new(error))
                }
            }
        }
        .boxed()
        .shared();

        Self {
            source_name,
            scopes,
            token,
        }
    }

    pub fn scopes(&self) -> Scopes {
        self.scopes
    }

    pub fn source_name(&self) -> &'static str {
        self.source_name
    }

    pub async fn get_token(&self) -> Result<Token, SharedError> {
        self.token.clone().await
    }

    /// Returns the result of the exchange if it already finished.
    pub fn peek(&self) -> Option<Result<Token, SharedError>> {
        self.token.peek().cloned()
    }
}
