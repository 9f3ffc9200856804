//! Typed helpers for the BigQuery REST API.
//!
//! A [`BigQuery`] client authenticates once (see [`gcp_service_auth::TokenProvider`]), runs
//! SQL through the `queries` endpoint, and decodes the string-encoded result cells into
//! [`Value`]s according to the result schema. Dataset, table and table-data metadata are
//! reachable through [`BigQuery::dataset`].

#[macro_use]
extern crate tracing;

mod client;
pub mod dataset;
mod error;
pub mod query;
pub mod schema;
pub mod table;
pub mod table_data;
mod util;

#[cfg(test)]
mod test_server;

pub use client::{BigQuery, BigQueryBuilder, DEFAULT_BASE_URL, Method};
pub use dataset::{DatasetClient, DeleteDatasetOptions, ListDatasetsOptions};
pub use error::{CellError, DecodeError, Error, RemoteError, TimestampError};
pub use gcp_service_auth::{Scope, Scopes, ServiceAccountKey, StaticToken, Token, TokenSource};
pub use query::{QueryOptions, QueryResponse, Row, Value};
pub use table::{GetTableOptions, ListTablesOptions, TableClient, TableMetadataView};
pub use table_data::{ListTableDataOptions, TableDataClient};

/// Type alias to [`core::result::Result<T, Error>`].
pub type Result<T> = core::result::Result<T, Error>;
