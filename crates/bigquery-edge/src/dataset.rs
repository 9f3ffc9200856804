//! Dataset metadata, under `projects/{project}/datasets`.
use std::sync::Arc;

use crate::client::{InnerClient, Method};
use crate::error::Error;
use crate::table::TableClient;
use crate::util::{QueryParams, experimental};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListDatasetsOptions {
    pub max_results: Option<u32>,
    pub page_token: Option<String>,
    /// Include hidden datasets.
    pub all: Option<bool>,
    /// Label filter, `labels.<name>[:<value>]`, space separated filters are ANDed.
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteDatasetOptions {
    /// Delete every table in the dataset too. Without it, deleting a non-empty dataset
    /// fails.
    pub delete_contents: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct DatasetClient {
    dataset_id: Option<Box<str>>,
    client: Arc<InnerClient>,
}

impl DatasetClient {
    pub(crate) fn from_parts(dataset_id: Option<Box<str>>, client: Arc<InnerClient>) -> Self {
        Self {
            dataset_id: dataset_id.filter(|id| !id.is_empty()),
            client,
        }
    }

    #[inline]
    pub fn dataset_id(&self) -> Option<&str> {
        self.dataset_id.as_deref()
    }

    #[inline]
    pub fn project_id(&self) -> &str {
        self.client.project_id()
    }

    fn require_id(&self) -> crate::Result<&str> {
        self.dataset_id().ok_or(Error::Precondition("dataset id"))
    }

    /// Lists the datasets in the project that the caller can read.
    pub async fn list(&self, options: &ListDatasetsOptions) -> crate::Result<serde_json::Value> {
        experimental("DatasetClient.list");

        let mut url = self.client.make_url(["datasets"]);

        QueryParams::new()
            .opt("maxResults", options.max_results)
            .opt("pageToken", options.page_token.as_deref())
            .opt("all", options.all)
            .opt("filter", options.filter.as_deref())
            .apply(&mut url);

        self.client.send::<()>(Method::Get, url, None).await
    }

    pub async fn get(&self) -> crate::Result<serde_json::Value> {
        experimental("DatasetClient.get");

        let id = self.require_id()?;
        let url = self.client.make_url(["datasets", id]);
        self.client.send::<()>(Method::Get, url, None).await
    }

    /// Deletes the dataset. The API responds with an empty body, which comes back as
    /// [`serde_json::Value::Null`].
    pub async fn delete(
        &self,
        options: &DeleteDatasetOptions,
    ) -> crate::Result<serde_json::Value> {
        experimental("DatasetClient.delete");

        let id = self.require_id()?;
        let mut url = self.client.make_url(["datasets", id]);

        QueryParams::new()
            .opt("deleteContents", options.delete_contents)
            .apply(&mut url);

        self.client.send::<()>(Method::Delete, url, None).await
    }

    /// A client for a table in this dataset.
    pub fn table<T>(&self, table_id: Option<T>) -> crate::Result<TableClient>
    where
        T: Into<Box<str>>,
    {
        let dataset_id = self.require_id()?;

        Ok(TableClient::from_parts(
            Box::from(dataset_id),
            table_id.map(Into::into),
            Arc::clone(&self.client),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use http::StatusCode;
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::client::tests::test_client;
    use crate::test_server::TestServer;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_experimental_warning_per_call() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();

        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let server = TestServer::start(StatusCode::OK, "{}").await;
        let client = test_client(&server);
        let datasets = client.dataset::<&str>(None);

        datasets.list(&ListDatasetsOptions::default()).await.unwrap();
        datasets.list(&ListDatasetsOptions::default()).await.unwrap();
        // fails the precondition, but still warns
        datasets.get().await.unwrap_err();

        let output = String::from_utf8(logs.0.lock().clone()).unwrap();
        assert_eq!(
            output
                .matches("[EXPERIMENTAL] DatasetClient.list is experimental")
                .count(),
            2,
            "{output}"
        );
        assert_eq!(output.matches("DatasetClient.get").count(), 1, "{output}");
    }

    #[tokio::test]
    async fn test_missing_dataset_id_sends_nothing() {
        let server = TestServer::start(StatusCode::OK, "{}").await;
        let client = test_client(&server);

        for dataset in [client.dataset::<&str>(None), client.dataset(Some(""))] {
            assert!(matches!(
                dataset.get().await,
                Err(Error::Precondition("dataset id"))
            ));
            assert!(matches!(
                dataset.delete(&DeleteDatasetOptions::default()).await,
                Err(Error::Precondition("dataset id"))
            ));
            assert!(matches!(
                dataset.table(Some("t")),
                Err(Error::Precondition("dataset id"))
            ));
        }

        assert_eq!(server.request_count(), 0);
    }

    #[tokio::test]
    async fn test_list_without_dataset_id() {
        let body = json!({"kind": "bigquery#datasetList", "datasets": []});
        let server = TestServer::start(StatusCode::OK, body.to_string()).await;
        let client = test_client(&server);

        let listed = client
            .dataset::<&str>(None)
            .list(&ListDatasetsOptions::default())
            .await
            .unwrap();

        assert_eq!(listed, body);
        assert_eq!(server.requests()[0].uri, "/projects/test-project/datasets");
    }

    #[tokio::test]
    async fn test_list_options() {
        let server = TestServer::start(StatusCode::OK, "{}").await;
        let client = test_client(&server);

        let options = ListDatasetsOptions {
            max_results: Some(5),
            page_token: Some("next".into()),
            all: Some(true),
            filter: Some("labels.department:receiving labels.active".into()),
        };
        client.dataset::<&str>(None).list(&options).await.unwrap();

        assert_eq!(
            server.requests()[0].uri,
            "/projects/test-project/datasets?maxResults=5&pageToken=next&all=true\
             &filter=labels.department%3Areceiving+labels.active"
        );
    }

    #[tokio::test]
    async fn test_get_and_delete() {
        let server = TestServer::start(StatusCode::OK, "").await;
        let client = test_client(&server);
        let dataset = client.dataset(Some("web logs"));

        assert_eq!(dataset.get().await.unwrap(), serde_json::Value::Null);
        dataset
            .delete(&DeleteDatasetOptions::default())
            .await
            .unwrap();
        dataset
            .delete(&DeleteDatasetOptions {
                delete_contents: Some(true),
            })
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].uri, "/projects/test-project/datasets/web%20logs");
        assert_eq!(requests[1].method, "DELETE");
        assert_eq!(requests[1].uri, "/projects/test-project/datasets/web%20logs");
        assert_eq!(
            requests[2].uri,
            "/projects/test-project/datasets/web%20logs?deleteContents=true"
        );
    }
}
