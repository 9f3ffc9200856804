use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use bigquery_edge::{BigQuery, Row};
use gcp_service_auth::{Scopes, ServiceAccount, StaticToken, Token, TokenSource};
use time::OffsetDateTime;

use crate::config::Config;
use crate::kv::{KvStore, MemoryKv};

/// The cache key the current access token is stored under.
const TOKEN_KEY: &str = "token";

#[derive(Debug, Clone)]
pub struct AppState {
    source: Arc<dyn TokenSource>,
    cache: Arc<dyn KvStore>,
    token_ttl: Duration,
    base_url: Option<Arc<str>>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, gcp_service_auth::Error> {
        let account = ServiceAccount::new(Arc::clone(&config.credential))?;

        let state = Self::from_parts(
            Arc::new(account),
            Arc::new(MemoryKv::new()),
            config.token_cache_ttl,
        );

        Ok(match config.bigquery_base_url {
            Some(ref base_url) => state.with_base_url(Arc::clone(base_url)),
            None => state,
        })
    }

    pub fn from_parts(
        source: Arc<dyn TokenSource>,
        cache: Arc<dyn KvStore>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            source,
            cache,
            token_ttl,
            base_url: None,
        }
    }

    /// Points the BigQuery clients at something other than the public endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<Arc<str>>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    async fn token(&self) -> Result<Token, HandlerError> {
        if let Some(cached) = self.cache.get(TOKEN_KEY) {
            debug!(message = "using cached token");
            return Ok(Token::new(cached));
        }

        let token = self.source.fetch_token(Scopes::default()).await?;
        let ttl = cache_ttl(&token, self.token_ttl);

        debug!(message = "caching new token", ttl_secs = ttl.as_secs());
        self.cache
            .put(TOKEN_KEY, token.access_token().to_owned(), ttl);

        Ok(token)
    }

    async fn run_query(&self, project: &str, sql: &str) -> Result<Vec<Row>, HandlerError> {
        let token = self.token().await?;

        let mut builder = BigQuery::builder(project).token_source(Arc::new(StaticToken(token)));
        if let Some(ref base_url) = self.base_url {
            builder = builder.base_url(&**base_url);
        }

        let client = builder.build()?;
        client.query(sql).await.map_err(HandlerError::from)
    }
}

/// The configured TTL, cut short if the token itself expires sooner.
fn cache_ttl(token: &Token, configured: Duration) -> Duration {
    let Some(expires_at) = token.expires_at() else {
        return configured;
    };

    let remaining =
        Duration::try_from(expires_at - OffsetDateTime::now_utc()).unwrap_or_default();
    configured.min(remaining)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(query_handler))
        .with_state(state)
}

#[derive(Debug, serde::Deserialize)]
struct QueryParams {
    query: Option<String>,
    project: Option<String>,
}

async fn query_handler(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Response {
    let non_empty = |value: Option<String>| value.filter(|value| !value.is_empty());

    let (Some(sql), Some(project)) = (non_empty(params.query), non_empty(params.project)) else {
        return (StatusCode::BAD_REQUEST, "Missing query or project").into_response();
    };

    match state.run_query(&project, &sql).await {
        Ok(rows) => {
            info!(message = "query succeeded", %project, rows = rows.len());
            Json(rows).into_response()
        }
        Err(error) => error.into_response(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("token exchange failed: {0}")]
    Token(#[from] gcp_service_auth::Error),
    #[error(transparent)]
    BigQuery(#[from] bigquery_edge::Error),
}

impl HandlerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BigQuery(bigquery_edge::Error::Remote(remote))
                if remote.http_status.is_client_error() || remote.http_status.is_server_error() =>
            {
                remote.http_status
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!(message = "query failed", %status, error = %self);

        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
