//! Materialized query results.

use crate::model::Record;

/// The records of one response, with a cursor.
///
/// All entries of a response are materialized up front; the cursor only
/// walks the in-memory list. Scalar responses (`$count`) carry no records
/// and expose their raw text through [`ResultSet::scalar`].
///
/// # Example
///
/// ```
/// use odata_lib::ResultSet;
/// use odata_lib::model::Record;
///
/// let mut results = ResultSet::new(vec![Record::new().set("Code", "1")]);
/// while let Some(record) = results.fetch() {
///     assert_eq!(record.get_text("Code").unwrap(), "1");
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    records: Vec<Record>,
    scalar: Option<String>,
    position: usize,
}

impl ResultSet {
    /// Creates a result set over materialized records.
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            scalar: None,
            position: 0,
        }
    }

    /// Creates a result set carrying a bare scalar body.
    pub(crate) fn from_scalar(body: &str) -> Self {
        Self {
            records: Vec::new(),
            scalar: Some(body.to_string()),
            position: 0,
        }
    }

    /// Returns the records.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Consumes the result set and returns the records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Returns the raw scalar body for non-entry responses.
    pub fn scalar(&self) -> Option<&str> {
        self.scalar.as_deref()
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the record at the cursor and advances it.
    pub fn fetch(&mut self) -> Option<Record> {
        let record = self.records.get(self.position).cloned();
        if record.is_some() {
            self.position += 1;
        }
        record
    }

    /// Skips `offset` records, then fetches.
    pub fn fetch_skip(&mut self, offset: usize) -> Option<Record> {
        self.position += offset;
        self.fetch()
    }

    /// Resets the cursor to the first record.
    pub fn rewind(&mut self) {
        self.position = 0;
    }
}

impl IntoIterator for ResultSet {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
