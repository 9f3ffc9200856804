//! Synchronous queries through the `projects/{project}/queries` endpoint.
use crate::client::{BigQuery, Method};
use crate::error::{DecodeError, Error};
use crate::schema::TableSchema;

pub mod decode;
mod value;

pub use decode::decode;
pub use value::{Row, Value};

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryRequest<'a> {
    query: &'a str,
    use_legacy_sql: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
}

impl<'a> QueryRequest<'a> {
    pub(crate) fn new(query: &'a str, options: &'a QueryOptions) -> Self {
        Self {
            query,
            use_legacy_sql: false,
            location: options.location.as_deref(),
        }
    }
}

/// Optional knobs for a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Geographic location the query runs in (`"US"`, `"europe-west2"`). Left to the API
    /// when unset.
    pub location: Option<String>,
}

impl QueryOptions {
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// The body of a `jobs.query` response. Fields this crate doesn't use are ignored.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub schema: Option<TableSchema>,
    #[serde(default)]
    pub rows: Option<Vec<TableRow>>,
    #[serde(default)]
    pub job_complete: bool,
    #[serde(default, deserialize_with = "crate::util::int64::optional::deserialize")]
    pub total_rows: Option<u64>,
    #[serde(default, deserialize_with = "crate::util::int64::optional::deserialize")]
    pub total_bytes_processed: Option<u64>,
    #[serde(default)]
    pub job_reference: Option<JobReference>,
    #[serde(default)]
    pub query_id: Option<String>,
    #[serde(default)]
    pub cache_hit: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    pub project_id: String,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// A raw result row, one cell per schema field.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub f: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub v: serde_json::Value,
}

impl BigQuery {
    /// Runs `sql` (standard SQL) and decodes the result rows.
    pub async fn query(&self, sql: &str) -> crate::Result<Vec<Row>> {
        self.query_with(sql, &QueryOptions::default()).await
    }

    pub async fn query_with(
        &self,
        sql: &str,
        options: &QueryOptions,
    ) -> crate::Result<Vec<Row>> {
        let response = self.query_response(sql, options).await?;
        decode(&response).map_err(Error::Decode)
    }

    /// Runs `sql`, then deserializes each decoded row (viewed as a JSON object keyed by
    /// column name) into `T`.
    pub async fn query_as<T>(&self, sql: &str, options: &QueryOptions) -> crate::Result<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let rows = self.query_with(sql, options).await?;

        rows.iter()
            .enumerate()
            .map(|(row, decoded)| {
                decoded
                    .deserialize_into()
                    .map_err(|source| Error::Decode(DecodeError::Row { row, source }))
            })
            .collect()
    }

    /// Runs `sql`, returning the response as-is without decoding any cells.
    pub async fn query_response(
        &self,
        sql: &str,
        options: &QueryOptions,
    ) -> crate::Result<QueryResponse> {
        let url = self.inner.make_url(["queries"]);
        let request = QueryRequest::new(sql, options);

        let response: QueryResponse = self
            .inner
            .send_json(Method::Post, url, Some(&request))
            .await?;

        if !response.job_complete {
            debug!(
                message = "query returned before the job completed",
                job = ?response.job_reference,
            );
        }

        Ok(response)
    }
}
