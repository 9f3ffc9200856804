//! Raw row access through `tabledata.list`.
use std::sync::Arc;

use crate::client::{InnerClient, Method};
use crate::util::{QueryParams, experimental};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListTableDataOptions {
    /// Zero based index of the first row to return.
    pub start_index: Option<u64>,
    pub max_results: Option<u32>,
    pub page_token: Option<String>,
    /// Comma separated fields to return, nested fields can be addressed as `"a,e.d.f"`.
    pub selected_fields: Option<String>,
    /// Return timestamps as int64 microseconds instead of floating point seconds.
    pub use_int64_timestamp: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct TableDataClient {
    dataset_id: Box<str>,
    table_id: Box<str>,
    client: Arc<InnerClient>,
}

impl TableDataClient {
    pub(crate) fn from_parts(
        dataset_id: Box<str>,
        table_id: Box<str>,
        client: Arc<InnerClient>,
    ) -> Self {
        Self {
            dataset_id,
            table_id,
            client,
        }
    }

    #[inline]
    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    #[inline]
    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    /// Lists a page of rows, returned in the raw `{f: [{v}]}` shape.
    pub async fn list(&self, options: &ListTableDataOptions) -> crate::Result<serde_json::Value> {
        experimental("TableDataClient.list");

        let mut url = self.client.make_url([
            "datasets",
            &*self.dataset_id,
            "tables",
            &*self.table_id,
            "data",
        ]);

        QueryParams::new()
            .opt("startIndex", options.start_index)
            .opt("maxResults", options.max_results)
            .opt("pageToken", options.page_token.as_deref())
            .opt("selectedFields", options.selected_fields.as_deref())
            .opt("formatOptions.useInt64Timestamp", options.use_int64_timestamp)
            .apply(&mut url);

        self.client.send::<()>(Method::Get, url, None).await
    }
}
