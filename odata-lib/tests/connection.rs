//! Connection-layer tests against an in-memory HTTP executor.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use odata_lib::Connection;
use odata_lib::ConnectionRegistry;
use odata_lib::Table;
use odata_lib::error::Error;
use odata_lib::error::HttpError;
use odata_lib::error::ParseError;
use odata_lib::model::Record;
use odata_lib::transport::HttpExecutor;
use odata_lib::transport::HttpRequest;
use odata_lib::transport::HttpResponse;

const BASE_URL: &str = "http://host/base/odata/standard.odata";

const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"
      xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
      xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
  <entry>
    <id>entry-1</id>
    <content type="application/xml">
      <m:properties>
        <d:Ref_Key>0000-01</d:Ref_Key>
        <d:Description>Paper</d:Description>
      </m:properties>
    </content>
  </entry>
</feed>"#;

const SERVICE_ERROR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<m:error xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">Object not found</m:error>"#;

/// Scripted executor: pops one canned response per request and records
/// every request it sees.
#[derive(Default)]
struct MockExecutor {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockExecutor {
    fn scripted(responses: impl IntoIterator<Item = (u16, &'static str)>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|(status, body)| HttpResponse {
                        status,
                        body: body.to_string(),
                    })
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpExecutor for MockExecutor {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.requests.lock().unwrap().push(request);
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(HttpResponse {
                status: 200,
                body: String::new(),
            }))
    }
}

fn connection(executor: Arc<MockExecutor>) -> Connection {
    Connection::new(executor, BASE_URL, "user", "secret")
}

#[tokio::test]
async fn query_issues_get_and_materializes_records() {
    let executor = MockExecutor::scripted([(200, FEED)]);
    let connection = connection(executor.clone());

    let select = connection
        .select()
        .from("Catalog_Products", &["Ref_Key", "Description"]);
    let mut results = connection.query(select).await.unwrap();

    assert_eq!(results.len(), 1);
    let record = results.fetch().unwrap();
    assert_eq!(record.get_text("Description").unwrap(), "Paper");
    assert_eq!(record.id(), Some("entry-1"));

    let requests = executor.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, reqwest::Method::GET);
    assert_eq!(
        requests[0].url,
        format!("{BASE_URL}/Catalog_Products?$select=Ref_Key,Description")
    );
    assert_eq!(
        requests[0].basic_auth,
        Some(("user".to_string(), "secret".to_string()))
    );
}

#[tokio::test]
async fn insert_posts_entry_body() {
    let executor = MockExecutor::scripted([(201, FEED)]);
    let connection = connection(executor.clone());

    let created = connection
        .insert("Catalog_Products", Record::new().set("Description", "Paper"))
        .await
        .unwrap();
    assert_eq!(created.unwrap().get_text("Ref_Key").unwrap(), "0000-01");

    let requests = executor.requests();
    assert_eq!(requests[0].method, reqwest::Method::POST);
    assert_eq!(requests[0].url, format!("{BASE_URL}/Catalog_Products"));
    let body = requests[0].body.as_deref().unwrap();
    assert!(body.contains("<entry xmlns=\"http://www.w3.org/2005/Atom\""));
    assert!(body.contains("<d:Description>Paper</d:Description>"));
}

#[tokio::test]
async fn update_patches_guid_link_with_edit_link_id() {
    let executor = MockExecutor::scripted([(200, FEED)]);
    let connection = connection(executor.clone());

    connection
        .update("Catalog_Products", Record::new().set("Description", "Paper"), "0000-01")
        .await
        .unwrap();

    let requests = executor.requests();
    assert_eq!(requests[0].method, reqwest::Method::PATCH);
    assert_eq!(
        requests[0].url,
        format!("{BASE_URL}/Catalog_Products(guid'0000-01')")
    );
    let body = requests[0].body.as_deref().unwrap();
    assert!(body.contains(&format!(
        "<id>{BASE_URL}/Catalog_Products(guid'0000-01')</id>"
    )));
}

#[tokio::test]
async fn delete_returns_affected_rows_on_empty_body() {
    let executor = MockExecutor::scripted([(200, "")]);
    let connection = connection(executor.clone());

    let deleted = connection.delete("Catalog_Products", "0000-01").await.unwrap();
    assert_eq!(deleted, 1);

    let requests = executor.requests();
    assert_eq!(requests[0].method, reqwest::Method::DELETE);
    assert_eq!(
        requests[0].url,
        format!("{BASE_URL}/Catalog_Products(guid'0000-01')")
    );
}

#[tokio::test]
async fn count_parses_scalar_body() {
    let executor = MockExecutor::scripted([(200, "42")]);
    let connection = connection(executor.clone());

    assert_eq!(connection.count("Catalog_Products").await.unwrap(), 42);
    assert_eq!(
        executor.requests()[0].url,
        format!("{BASE_URL}/Catalog_Products/$count?")
    );
}

#[tokio::test]
async fn count_rejects_non_numeric_body() {
    let executor = MockExecutor::scripted([(200, "not a number")]);
    let connection = connection(executor);

    let err = connection.count("Catalog_Products").await.unwrap_err();
    assert!(matches!(err, Error::Parse(ParseError::Malformed(_))));
}

#[tokio::test]
async fn call_wraps_prologue_less_fragment() {
    let fragment = r#"<entry xmlns="http://www.w3.org/2005/Atom"
       xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
       xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
  <content type="application/xml"><m:properties><d:Result>done</d:Result></m:properties></content>
</entry>"#;
    let executor = MockExecutor::scripted([(200, fragment)]);
    let connection = connection(executor.clone());

    let results = connection
        .call("Catalog_Products", "0000-01", "Post", &[("mode", "fast")])
        .await
        .unwrap();
    assert_eq!(results.records()[0].get_text("Result").unwrap(), "done");

    let requests = executor.requests();
    assert_eq!(requests[0].method, reqwest::Method::POST);
    assert_eq!(
        requests[0].url,
        format!("{BASE_URL}/Catalog_Products(guid'0000-01')/Post?mode=fast")
    );
}

#[tokio::test]
async fn call_on_service_root_omits_guid_link() {
    let executor = MockExecutor::scripted([(200, "")]);
    let connection = connection(executor.clone());

    connection.call("", "", "UpdateCatalogs", &[]).await.unwrap();
    assert_eq!(
        executor.requests()[0].url,
        format!("{BASE_URL}/UpdateCatalogs?")
    );
}

#[tokio::test]
async fn error_status_surfaces_as_http_error() {
    let executor = MockExecutor::scripted([(500, "boom")]);
    let connection = connection(executor);

    let err = connection.query("Catalog_Products?").await.unwrap_err();
    match err {
        Error::Http(HttpError::Status { status, url, body }) => {
            assert_eq!(status, 500);
            assert_eq!(url, format!("{BASE_URL}/Catalog_Products?"));
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn service_error_body_surfaces_as_parse_error() {
    let executor = MockExecutor::scripted([(200, SERVICE_ERROR)]);
    let connection = connection(executor);

    let err = connection.query("Catalog_Products?").await.unwrap_err();
    match err {
        Error::Parse(ParseError::Service(message)) => assert_eq!(message, "Object not found"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn registry_reuses_connections_per_key() {
    let registry = ConnectionRegistry::new();
    let created = AtomicUsize::new(0);

    let make = |registry: &ConnectionRegistry, url: &str| {
        registry.get_or_create(url, "user", "pw", || {
            created.fetch_add(1, Ordering::SeqCst);
            MockExecutor::scripted([])
        })
    };

    let first = make(&registry, BASE_URL);
    let second = make(&registry, BASE_URL);
    let other = make(&registry, "http://other/odata");

    assert_eq!(created.load(Ordering::SeqCst), 2);
    assert_eq!(registry.len(), 2);
    assert_eq!(first.url(), second.url());
    assert_ne!(first.url(), other.url());

    registry.clear();
    assert!(registry.is_empty());
}

#[tokio::test]
async fn table_find_by_id_filters_on_primary_guid() {
    let executor = MockExecutor::scripted([(200, FEED)]);
    let table = Table::new(connection(executor.clone()), "Catalog_Products", "Ref_Key");

    let record = table.find_by_id("0000-01").await.unwrap().unwrap();
    assert_eq!(record.get_text("Ref_Key").unwrap(), "0000-01");

    let expected_filter = urlencoding::encode("(Ref_Key eq guid'0000-01')");
    assert_eq!(
        executor.requests()[0].url,
        format!("{BASE_URL}/Catalog_Products?$filter={expected_filter}")
    );
}

#[tokio::test]
async fn table_save_updates_when_primary_present() {
    let executor = MockExecutor::scripted([(200, FEED)]);
    let table = Table::new(connection(executor.clone()), "Catalog_Products", "Ref_Key");

    let saved = table
        .save(
            Record::new()
                .set("Ref_Key", "0000-01")
                .set("Description", "Paper"),
        )
        .await
        .unwrap();
    assert_eq!(saved, "0000-01");

    let requests = executor.requests();
    assert_eq!(requests[0].method, reqwest::Method::PATCH);
    // the key travels in the guid link, not the property list
    assert!(!requests[0].body.as_deref().unwrap().contains("<d:Ref_Key>"));
}

#[tokio::test]
async fn table_save_with_only_primary_is_a_no_op() {
    let executor = MockExecutor::scripted([]);
    let table = Table::new(connection(executor.clone()), "Catalog_Products", "Ref_Key");

    let saved = table
        .save(Record::new().set("Ref_Key", "0000-01"))
        .await
        .unwrap();
    assert_eq!(saved, "0000-01");
    assert!(executor.requests().is_empty());
}

#[tokio::test]
async fn table_save_inserts_without_primary() {
    let executor = MockExecutor::scripted([(201, FEED)]);
    let table = Table::new(connection(executor.clone()), "Catalog_Products", "Ref_Key");

    let saved = table
        .save(Record::new().set("Description", "Paper"))
        .await
        .unwrap();
    assert_eq!(saved, "0000-01");
    assert_eq!(executor.requests()[0].method, reqwest::Method::POST);
}

#[tokio::test]
async fn table_remove_without_key_deletes_nothing() {
    let executor = MockExecutor::scripted([]);
    let table = Table::new(connection(executor.clone()), "Catalog_Products", "Ref_Key");

    let deleted = table.remove(&Record::new().set("Description", "Paper")).await.unwrap();
    assert_eq!(deleted, 0);
    assert!(executor.requests().is_empty());
}
