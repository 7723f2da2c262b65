//! Row-oriented table gateway.

use crate::client::Connection;
use crate::error::Error;
use crate::model::Record;
use crate::model::Value;
use crate::query::Select;
use crate::result::ResultSet;

/// A row gateway bound to one table of the service.
///
/// Wraps a [`Connection`] with finders and save/remove semantics keyed on
/// the table's primary column. The connection is always supplied by the
/// caller; there is no default-connection fallback.
///
/// # Example
///
/// ```ignore
/// let products = Table::new(connection, "Catalog_Products", "Ref_Key");
///
/// let active = products
///     .find_by_fields(&[("DeletionMark", "false")], Some("Description"), None, None)
///     .await?;
/// ```
#[derive(Clone)]
pub struct Table {
    connection: Connection,
    name: String,
    primary: String,
}

impl Table {
    /// Creates a gateway for `name` with `primary` as its key column.
    pub fn new(connection: Connection, name: impl Into<String>, primary: impl Into<String>) -> Self {
        Self {
            connection,
            name: name.into(),
            primary: primary.into(),
        }
    }

    /// Returns the table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the primary key column.
    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// Returns the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Runs a query and returns all records.
    pub async fn query(&self, select: Select) -> Result<Vec<Record>, Error> {
        Ok(self.connection.query(select).await?.into_records())
    }

    /// Inserts a new row.
    pub async fn insert(&self, data: Record) -> Result<Option<Record>, Error> {
        self.connection.insert(&self.name, data).await
    }

    /// Updates the row addressed by `guid`.
    pub async fn update(&self, data: Record, guid: &str) -> Result<Option<Record>, Error> {
        self.connection.update(&self.name, data, guid).await
    }

    /// Deletes the row addressed by `guid`; returns the number of rows
    /// deleted.
    pub async fn delete(&self, guid: &str) -> Result<u64, Error> {
        self.connection.delete(&self.name, guid).await
    }

    /// Counts all rows of the table.
    pub async fn count(&self) -> Result<u64, Error> {
        self.connection.count(&self.name).await
    }

    /// Calls a remote method on the row addressed by `guid`.
    pub async fn call(
        &self,
        method: &str,
        params: &[(&str, &str)],
        guid: &str,
    ) -> Result<ResultSet, Error> {
        self.connection.call(&self.name, guid, method, params).await
    }

    /// Fetches every row, optionally ordered and paged.
    pub async fn find_all(
        &self,
        order: Option<&str>,
        count: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Record>, Error> {
        self.fetch_all(None, order, count, offset).await
    }

    /// Fetches rows matching all `(column, literal)` pairs.
    ///
    /// Literals pass through unescaped, formatted by the caller (e.g.
    /// `guid'...'` or a quoted string).
    pub async fn find_by_fields(
        &self,
        fields: &[(&str, &str)],
        order: Option<&str>,
        count: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Record>, Error> {
        let condition = if fields.is_empty() {
            None
        } else {
            Some(
                fields
                    .iter()
                    .map(|(column, literal)| format!("({column} eq {literal})"))
                    .collect::<Vec<_>>()
                    .join(" and "),
            )
        };
        self.fetch_all(condition.as_deref(), order, count, offset)
            .await
    }

    /// Fetches the first row matching all `(column, literal)` pairs.
    pub async fn find_one_by_fields(
        &self,
        fields: &[(&str, &str)],
        order: Option<&str>,
    ) -> Result<Option<Record>, Error> {
        let mut records = self.find_by_fields(fields, order, Some(1), None).await?;
        if records.is_empty() {
            return Ok(None);
        }
        Ok(Some(records.remove(0)))
    }

    /// Fetches the row whose primary key equals `id`.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Record>, Error> {
        let condition = format!("{} eq guid'{}'", self.primary, id);
        let records = self.fetch_all(Some(&condition), None, None, None).await?;
        Ok(records.into_iter().next())
    }

    /// Fetches rows with optional filter, order, and paging.
    pub async fn fetch_all(
        &self,
        condition: Option<&str>,
        order: Option<&str>,
        count: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Record>, Error> {
        let mut select = self.connection.select().from(&self.name, &[]);
        if let Some(condition) = condition {
            select = select.where_(condition);
        }
        if let Some(order) = order {
            select = select.order(order);
        }
        if count.unwrap_or(0) != 0 || offset.unwrap_or(0) != 0 {
            select = select.limit(count, offset);
        }
        self.query(select).await
    }

    /// Inserts or updates depending on the primary key being present, and
    /// returns the saved row's key.
    ///
    /// An update whose record carries nothing but the key is a no-op that
    /// returns the key unchanged.
    pub async fn save(&self, mut data: Record) -> Result<String, Error> {
        let id = match data.remove(&self.primary) {
            Some(Value::Text(id)) => id,
            _ => String::new(),
        };

        if !id.is_empty() {
            if data.is_empty() {
                return Ok(id);
            }
            let updated = self.update(data, &id).await?;
            return Ok(self.primary_of(updated));
        }

        let inserted = self.insert(data).await?;
        Ok(self.primary_of(inserted))
    }

    /// Deletes the row named by the record's primary key; returns the
    /// number of rows deleted (0 when the record carries no key).
    pub async fn remove(&self, data: &Record) -> Result<u64, Error> {
        match data.get(&self.primary).and_then(Value::as_text) {
            Some(id) if !id.is_empty() => self.delete(id).await,
            _ => Ok(0),
        }
    }

    fn primary_of(&self, record: Option<Record>) -> String {
        record
            .and_then(|r| r.get(&self.primary).and_then(Value::as_text).map(str::to_string))
            .unwrap_or_default()
    }
}
