//! Table metadata, under `projects/{project}/datasets/{dataset}/tables`.
use std::fmt;
use std::sync::Arc;

use crate::client::{InnerClient, Method};
use crate::error::Error;
use crate::table_data::TableDataClient;
use crate::util::{QueryParams, experimental};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListTablesOptions {
    pub max_results: Option<u32>,
    pub page_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetTableOptions {
    /// Comma separated schema fields to return, all of them when unset.
    pub selected_fields: Option<String>,
    pub view: Option<TableMetadataView>,
}

/// How much of the table resource `tables.get` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TableMetadataView {
    /// Let the API decide, which currently means [`TableMetadataView::StorageStats`].
    #[default]
    Unspecified,
    /// Schema and partitioning, without storage statistics. Much cheaper to serve.
    Basic,
    /// [`TableMetadataView::Basic`] plus `numBytes`, `numRows` and friends.
    StorageStats,
    Full,
}

impl TableMetadataView {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "TABLE_METADATA_VIEW_UNSPECIFIED",
            Self::Basic => "BASIC",
            Self::StorageStats => "STORAGE_STATS",
            Self::Full => "FULL",
        }
    }
}

impl fmt::Display for TableMetadataView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct TableClient {
    dataset_id: Box<str>,
    table_id: Option<Box<str>>,
    client: Arc<InnerClient>,
}

impl TableClient {
    pub(crate) fn from_parts(
        dataset_id: Box<str>,
        table_id: Option<Box<str>>,
        client: Arc<InnerClient>,
    ) -> Self {
        Self {
            dataset_id,
            table_id: table_id.filter(|id| !id.is_empty()),
            client,
        }
    }

    #[inline]
    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    #[inline]
    pub fn table_id(&self) -> Option<&str> {
        self.table_id.as_deref()
    }

    fn require_id(&self) -> crate::Result<&str> {
        self.table_id().ok_or(Error::Precondition("table id"))
    }

    pub async fn list(&self, options: &ListTablesOptions) -> crate::Result<serde_json::Value> {
        experimental("TableClient.list");

        let mut url = self.client.make_url(["datasets", &*self.dataset_id, "tables"]);

        QueryParams::new()
            .opt("maxResults", options.max_results)
            .opt("pageToken", options.page_token.as_deref())
            .apply(&mut url);

        self.client.send::<()>(Method::Get, url, None).await
    }

    /// Fetches the table resource (schema, partitioning, stats). Doesn't include any rows,
    /// see [`TableClient::table_data`] for those.
    pub async fn get(&self, options: &GetTableOptions) -> crate::Result<serde_json::Value> {
        experimental("TableClient.get");

        let id = self.require_id()?;
        let mut url = self
            .client
            .make_url(["datasets", &*self.dataset_id, "tables", id]);

        QueryParams::new()
            .opt("selectedFields", options.selected_fields.as_deref())
            .opt("view", options.view)
            .apply(&mut url);

        self.client.send::<()>(Method::Get, url, None).await
    }

    /// Deletes the table along with all of its data.
    pub async fn delete(&self) -> crate::Result<serde_json::Value> {
        experimental("TableClient.delete");

        let id = self.require_id()?;
        let url = self
            .client
            .make_url(["datasets", &*self.dataset_id, "tables", id]);

        self.client.send::<()>(Method::Delete, url, None).await
    }

    pub fn table_data(&self) -> crate::Result<TableDataClient> {
        let table_id = self.require_id()?;

        Ok(TableDataClient::from_parts(
            self.dataset_id.clone(),
            Box::from(table_id),
            Arc::clone(&self.client),
        ))
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;
    use crate::client::tests::test_client;
    use crate::test_server::TestServer;

    #[tokio::test]
    async fn test_missing_table_id_sends_nothing() {
        let server = TestServer::start(StatusCode::OK, "{}").await;
        let client = test_client(&server);
        let table = client.dataset(Some("d")).table::<&str>(None).unwrap();

        assert!(matches!(
            table.get(&GetTableOptions::default()).await,
            Err(Error::Precondition("table id"))
        ));
        assert!(matches!(
            table.delete().await,
            Err(Error::Precondition("table id"))
        ));
        assert!(matches!(
            table.table_data(),
            Err(Error::Precondition("table id"))
        ));

        assert_eq!(server.request_count(), 0);
    }

    #[tokio::test]
    async fn test_list() {
        let server = TestServer::start(StatusCode::OK, r#"{"tables": []}"#).await;
        let client = test_client(&server);
        let table = client.dataset(Some("d")).table::<&str>(None).unwrap();

        table.list(&ListTablesOptions::default()).await.unwrap();
        table
            .list(&ListTablesOptions {
                max_results: Some(50),
                page_token: None,
            })
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests[0].uri, "/projects/test-project/datasets/d/tables");
        assert_eq!(
            requests[1].uri,
            "/projects/test-project/datasets/d/tables?maxResults=50"
        );
    }

    #[tokio::test]
    async fn test_get_with_view() {
        let server = TestServer::start(StatusCode::OK, r#"{"id": "p:d.t"}"#).await;
        let client = test_client(&server);
        let table = client.dataset(Some("d")).table(Some("t")).unwrap();

        let resource = table
            .get(&GetTableOptions {
                selected_fields: Some("a,b".into()),
                view: Some(TableMetadataView::Basic),
            })
            .await
            .unwrap();
        assert_eq!(resource["id"], "p:d.t");

        table
            .get(&GetTableOptions {
                selected_fields: None,
                view: Some(TableMetadataView::Unspecified),
            })
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(
            requests[0].uri,
            "/projects/test-project/datasets/d/tables/t?selectedFields=a%2Cb&view=BASIC"
        );
        assert_eq!(
            requests[1].uri,
            "/projects/test-project/datasets/d/tables/t?view=TABLE_METADATA_VIEW_UNSPECIFIED"
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let server = TestServer::start(StatusCode::NO_CONTENT, "").await;
        let client = test_client(&server);
        let table = client.dataset(Some("d")).table(Some("t")).unwrap();

        assert_eq!(table.delete().await.unwrap(), serde_json::Value::Null);

        let requests = server.requests();
        assert_eq!(requests[0].method, "DELETE");
        assert_eq!(requests[0].uri, "/projects/test-project/datasets/d/tables/t");
    }
}
