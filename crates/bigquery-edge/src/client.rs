use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use gcp_service_auth::{Scopes, ServiceAccount, ServiceAccountKey, TokenProvider, TokenSource};
use http::StatusCode;
use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use url::Url;

use crate::dataset::DatasetClient;
use crate::error::{DecodeError, Error, ErrorEnvelope};

/// The v2 REST root, missing the `projects/{project}` components.
pub const DEFAULT_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

const USER_AGENT: &str = "bigquery-edge";

/// The verbs the REST API is called with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
    Patch,
}

impl Method {
    /// Only POST and PATCH ever send a request body.
    #[inline]
    pub const fn carries_body(self) -> bool {
        matches!(self, Self::Post | Self::Patch)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }

    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Delete => reqwest::Method::DELETE,
            Self::Patch => reqwest::Method::PATCH,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A BigQuery client bound to a single project.
///
/// Cloning is cheap, and clones (along with every [`DatasetClient`] and table client derived
/// from them) share the same token. The token is fetched lazily on the first request and
/// never refreshed, so a client is meant to be short-lived.
#[derive(Debug, Clone)]
pub struct BigQuery {
    pub(crate) inner: Arc<InnerClient>,
}

pub(crate) struct InnerClient {
    http: reqwest::Client,
    tokens: TokenProvider,
    project_id: Box<str>,
    /// `{base}/projects/{project}`, validated to be a base url at build time.
    base_url: Url,
}

impl fmt::Debug for InnerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InnerClient")
            .field("project_id", &self.project_id)
            .field("base_url", &self.base_url.as_str())
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl BigQuery {
    /// Builds a client that authenticates with a service account key.
    pub fn new(
        credential: ServiceAccountKey,
        project_id: impl Into<Box<str>>,
    ) -> crate::Result<Self> {
        Self::builder(project_id).credential(credential).build()
    }

    pub fn builder(project_id: impl Into<Box<str>>) -> BigQueryBuilder {
        BigQueryBuilder {
            project_id: project_id.into(),
            source: None,
            scopes: Scopes::default(),
            base_url: None,
            http: None,
        }
    }

    #[inline]
    pub fn project_id(&self) -> &str {
        &self.inner.project_id
    }

    /// A client for a dataset in this project. Operations that need to address a specific
    /// dataset fail with [`Error::Precondition`] when `dataset_id` is `None`.
    pub fn dataset<D>(&self, dataset_id: Option<D>) -> DatasetClient
    where
        D: Into<Box<str>>,
    {
        DatasetClient::from_parts(dataset_id.map(Into::into), Arc::clone(&self.inner))
    }
}

enum Credential {
    Key(ServiceAccountKey),
    Source(Arc<dyn TokenSource>),
}

/// Builder for [`BigQuery`]. One of [`credential`] or [`token_source`] is required.
///
/// [`credential`]: BigQueryBuilder::credential
/// [`token_source`]: BigQueryBuilder::token_source
pub struct BigQueryBuilder {
    project_id: Box<str>,
    source: Option<Credential>,
    scopes: Scopes,
    base_url: Option<String>,
    http: Option<reqwest::Client>,
}

impl fmt::Debug for BigQueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source {
            Some(Credential::Key(_)) => Some("service account key"),
            Some(Credential::Source(ref source)) => Some(source.name()),
            None => None,
        };

        f.debug_struct("BigQueryBuilder")
            .field("project_id", &self.project_id)
            .field("source", &source)
            .field("scopes", &self.scopes)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl BigQueryBuilder {
    pub fn credential(mut self, credential: ServiceAccountKey) -> Self {
        self.source = Some(Credential::Key(credential));
        self
    }

    /// Uses a custom token source in place of the service account exchange.
    pub fn token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.source = Some(Credential::Source(source));
        self
    }

    pub fn scopes(mut self, scopes: impl Into<Scopes>) -> Self {
        self.scopes = scopes.into();
        self
    }

    /// Overrides [`DEFAULT_BASE_URL`], for emulators and tests.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http = Some(client);
        self
    }

    pub fn build(self) -> crate::Result<BigQuery> {
        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder().user_agent(USER_AGENT).build()?,
        };

        let source: Arc<dyn TokenSource> = match self.source {
            Some(Credential::Source(source)) => source,
            Some(Credential::Key(key)) => {
                let account = ServiceAccount::new_with_client(Arc::new(key), http.clone())
                    .map_err(Error::auth)?;
                Arc::new(account)
            }
            None => return Err(Error::Precondition("credential")),
        };

        let base_url = build_base_url(
            self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
            &self.project_id,
        )?;

        Ok(BigQuery {
            inner: Arc::new(InnerClient {
                http,
                tokens: TokenProvider::new(source, self.scopes),
                project_id: self.project_id,
                base_url,
            }),
        })
    }
}

fn build_base_url(base: &str, project_id: &str) -> Result<Url, Error> {
    let mut url = Url::parse(base)?;

    match url.path_segments_mut() {
        Ok(mut segments) => {
            segments.pop_if_empty().extend(["projects", project_id]);
        }
        Err(()) => {
            return Err(Error::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
    }

    Ok(url)
}

impl InnerClient {
    #[inline]
    pub(crate) fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Appends (percent-encoded) path segments to `{base}/projects/{project}`.
    pub(crate) fn make_url<P>(&self, path: P) -> Url
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let mut url = self.base_url.clone();

        // checked by build_base_url, this is never Err
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.extend(path);
        }

        url
    }

    /// Sends an authenticated request, returning the parsed JSON body.
    ///
    /// `body` is only serialized for methods that carry one, and is dropped otherwise.
    pub(crate) async fn send<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> crate::Result<serde_json::Value>
    where
        B: serde::Serialize + ?Sized,
    {
        let token = self.tokens.get_token().await.map_err(Error::Auth)?;
        let auth_header = token.header_value().map_err(Error::auth)?;

        debug!(message = "sending request", %method, %url);

        let mut request = self
            .http
            .request(method.as_reqwest(), url)
            .header(AUTHORIZATION, auth_header)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if method.carries_body()
            && let Some(body) = body
        {
            request = request.body(serde_json::to_vec(body).map_err(Error::Encode)?);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(handle_error(status, bytes));
        }

        parse_body(&bytes)
    }

    /// [`InnerClient::send`], deserializing the body into `T`.
    pub(crate) async fn send_json<B, T>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> crate::Result<T>
    where
        B: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let value = self.send(method, url, body).await?;
        T::deserialize(value).map_err(|error| Error::Decode(DecodeError::Body(error)))
    }
}

fn parse_body(bytes: &Bytes) -> crate::Result<serde_json::Value> {
    // DELETE responds with nothing at all
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::Value::Null);
    }

    serde_json::from_slice(bytes).map_err(|error| Error::Decode(DecodeError::Body(error)))
}

fn handle_error(status: StatusCode, bytes: Bytes) -> Error {
    match serde_json::from_slice::<ErrorEnvelope>(&bytes) {
        Ok(envelope) => Error::Remote(envelope.into_remote_error(status)),
        Err(source) => {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            warn!(message = "unreadable error response", %status, %body);
            Error::Decode(DecodeError::ErrorEnvelope {
                status,
                body,
                source,
            })
        }
    }
}
