//! Generic record with ordered fields

use super::Value;
use crate::error::FieldError;

/// Synthetic field: the entry's identity URI.
pub const ID_FIELD: &str = "__id";
/// Synthetic field: the entry's category term.
pub const CATEGORY_TERM_FIELD: &str = "__categoryTerm";
/// Synthetic field: the tombstone reference URI.
pub const REF_FIELD: &str = "__ref";
/// Synthetic field: the deletion flag.
pub const DELETED_ENTRY_FIELD: &str = "__deletedEntry";

/// A generic record: an ordered mapping from field name to [`Value`].
///
/// Field order is insertion order and is preserved through serialization;
/// the Atom writer emits properties in exactly this order, and the reader
/// produces fields in document order. Records parsed from a response also
/// carry the synthetic `__`-prefixed fields injected by the reader.
///
/// # Example
///
/// ```
/// use odata_lib::model::Record;
///
/// let record = Record::new()
///     .set("Description", "Paper")
///     .set("Quantity", "4");
///
/// assert_eq!(record.get_text("Quantity").unwrap(), "4");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Creates a new empty record.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Sets a field value (builder pattern).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Inserts a field value, replacing in place if the field exists.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Removes a field and returns its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        let index = self.fields.iter().position(|(name, _)| name == field)?;
        Some(self.fields.remove(index).1)
    }

    /// Returns a reference to the field value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Returns `true` if the record contains the given field.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == field)
    }

    /// Returns all fields in insertion order.
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    // =========================================================================
    // Typed getters
    //
    // Return Err if the field is missing or has a different shape.
    // =========================================================================

    /// Gets a scalar text field.
    pub fn get_text(&self, field: &str) -> Result<&str, FieldError> {
        match self.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Text(s)) => Ok(s.as_str()),
            Some(other) => Err(FieldError::type_mismatch(field, "text", other.type_name())),
        }
    }

    /// Gets a boolean field.
    pub fn get_bool(&self, field: &str) -> Result<bool, FieldError> {
        match self.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(FieldError::type_mismatch(field, "bool", other.type_name())),
        }
    }

    /// Gets an ordered collection field.
    pub fn get_rows(&self, field: &str) -> Result<&[Record], FieldError> {
        match self.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Rows(rows)) => Ok(rows.as_slice()),
            Some(other) => Err(FieldError::type_mismatch(field, "rows", other.type_name())),
        }
    }

    /// Gets a keyed collection field.
    pub fn get_record(&self, field: &str) -> Result<&Record, FieldError> {
        match self.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Record(r)) => Ok(r.as_ref()),
            Some(other) => Err(FieldError::type_mismatch(field, "record", other.type_name())),
        }
    }

    // =========================================================================
    // Synthetic field accessors
    // =========================================================================

    /// The identity URI the reader extracted from the entry's `id` element.
    pub fn id(&self) -> Option<&str> {
        self.get(ID_FIELD).and_then(Value::as_text)
    }

    /// The `term` attribute of the entry's `category` element.
    pub fn category_term(&self) -> Option<&str> {
        self.get(CATEGORY_TERM_FIELD).and_then(Value::as_text)
    }

    /// The reference URI of a tombstone record.
    pub fn reference(&self) -> Option<&str> {
        self.get(REF_FIELD).and_then(Value::as_text)
    }

    /// Returns `true` if this record is a deletion marker.
    pub fn is_deleted(&self) -> bool {
        matches!(self.get(DELETED_ENTRY_FIELD), Some(Value::Bool(true)))
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}
