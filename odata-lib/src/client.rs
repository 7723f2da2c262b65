//! Service connection orchestration.

use std::sync::Arc;

use reqwest::Method;
use tracing::debug;
use tracing::trace;

use crate::atom::Entry;
use crate::atom::Reader;
use crate::error::Error;
use crate::error::HttpError;
use crate::error::ParseError;
use crate::model::Record;
use crate::query::IntoQuery;
use crate::query::Select;
use crate::result::ResultSet;
use crate::transport::HttpExecutor;
use crate::transport::HttpRequest;

const XML_PROLOGUE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// A connection to one OData service endpoint.
///
/// Sequences the HTTP exchange around the protocol layer: queries are
/// rendered by [`Select`], write bodies produced by [`Entry`], and response
/// bodies handed to the Atom [`Reader`]. The connection itself holds no
/// per-request state and is cheap to clone (`Arc` inner), so independent
/// calls may run concurrently.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use odata_lib::{Connection, transport::ReqwestExecutor};
///
/// let connection = Connection::new(
///     Arc::new(ReqwestExecutor::new()),
///     "http://host/base/odata/standard.odata",
///     "user",
///     "secret",
/// );
///
/// let select = connection.select().from("Catalog_Products", &[]).limit(10, 0);
/// let mut results = connection.query(select).await?;
/// while let Some(record) = results.fetch() {
///     println!("{:?}", record.get_text("Description"));
/// }
/// ```
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

struct ConnectionInner {
    url: String,
    username: String,
    password: String,
    executor: Arc<dyn HttpExecutor>,
    reader: Reader,
}

impl Connection {
    /// Creates a connection to the given service URL.
    pub fn new(
        executor: Arc<dyn HttpExecutor>,
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(ConnectionInner {
                url: url.into(),
                username: username.into(),
                password: password.into(),
                executor,
                reader: Reader::new(),
            }),
        }
    }

    /// Returns the service base URL.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Creates an empty query specification.
    pub fn select(&self) -> Select {
        Select::new()
    }

    /// Runs a rendered query (or a [`Select`]) and materializes the result.
    pub async fn query(&self, query: impl IntoQuery) -> Result<ResultSet, Error> {
        let query = query.into_query();
        let body = self.execute(Method::GET, &query, None).await?;
        Ok(self.materialize(&body)?)
    }

    /// Inserts a row and returns the record the service echoes back.
    pub async fn insert(&self, table: &str, data: Record) -> Result<Option<Record>, Error> {
        let xml = Entry::new(data).to_xml(table, "", None);
        let body = self.execute(Method::POST, table, Some(xml)).await?;
        Ok(self.materialize(&body)?.into_records().into_iter().next())
    }

    /// Updates the row addressed by `guid` and returns the echoed record.
    pub async fn update(
        &self,
        table: &str,
        data: Record,
        guid: &str,
    ) -> Result<Option<Record>, Error> {
        let guid_link = guid_link(table, guid);
        let edit_link = format!("{}/{}", self.inner.url, guid_link);
        let xml = Entry::new(data).to_xml(table, &edit_link, None);
        let body = self.execute(Method::PATCH, &guid_link, Some(xml)).await?;
        Ok(self.materialize(&body)?.into_records().into_iter().next())
    }

    /// Deletes the row addressed by `guid`; returns the number of rows
    /// deleted.
    pub async fn delete(&self, table: &str, guid: &str) -> Result<u64, Error> {
        self.execute(Method::DELETE, &guid_link(table, guid), None)
            .await?;
        Ok(1)
    }

    /// Counts the rows of a table through the `$count` endpoint.
    pub async fn count(&self, table: &str) -> Result<u64, Error> {
        let query = self.select().from(table, &[]).count().assemble();
        let body = self.execute(Method::GET, &query, None).await?;
        let text = body.trim();
        text.parse().map_err(|_| {
            Error::Parse(ParseError::malformed(format!(
                "invalid count response: {text}"
            )))
        })
    }

    /// Calls a remote method, on a row when `table` is non-empty or at the
    /// service root otherwise, with form-encoded parameters.
    pub async fn call(
        &self,
        table: &str,
        guid: &str,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<ResultSet, Error> {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        let query = if table.is_empty() {
            // root-level method, no row to address
            format!("{method}?{encoded}")
        } else {
            format!("{}/{method}?{encoded}", guid_link(table, guid))
        };

        let mut body = self.execute(Method::POST, &query, None).await?;
        // method results arrive without a prologue; bare scalars and empty
        // bodies bypass the reader
        if !body.contains("<?xml") && body.trim_start().starts_with('<') {
            body = format!("{XML_PROLOGUE}{body}");
        }
        Ok(self.materialize(&body)?)
    }

    async fn execute(
        &self,
        method: Method,
        query: &str,
        body: Option<String>,
    ) -> Result<String, HttpError> {
        let url = format!("{}/{}", self.inner.url, query);
        debug!(%method, %url, "odata request");
        if let Some(body) = &body {
            trace!(%body, "request body");
        }

        let mut request = HttpRequest::new(method, &url)
            .header("Content-Type", "application/json")
            .basic_auth(&self.inner.username, &self.inner.password);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = self.inner.executor.execute(request).await?;
        if response.status >= 400 {
            return Err(HttpError::status(response.status, url, response.body));
        }
        Ok(response.body)
    }

    fn materialize(&self, body: &str) -> Result<ResultSet, ParseError> {
        // empty bodies (DELETE) and bare scalars ($count) never reach the
        // Atom reader
        if body.is_empty() {
            return Ok(ResultSet::default());
        }
        if !body.contains("<?xml") {
            return Ok(ResultSet::from_scalar(body));
        }
        Ok(ResultSet::new(self.inner.reader.entries(body)?))
    }
}

fn guid_link(table: &str, guid: &str) -> String {
    format!("{table}(guid'{guid}')")
}
