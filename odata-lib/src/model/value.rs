//! Field value shapes

use super::Record;

/// A single field value as carried by the Atom wire format.
///
/// Property values are scalar text unless the property is a collection:
/// an ordered list of sub-records (`Rows`, members named `element` on the
/// wire) or sub-records keyed by their element name (`Record`). `Bool` is
/// reserved for the deletion flag the reader injects into tombstone and
/// regular records.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Scalar property text.
    Text(String),
    /// Boolean marker (the reader's deletion flag).
    Bool(bool),
    /// Ordered collection property.
    Rows(Vec<Record>),
    /// Keyed collection property: one sub-record per field.
    Record(Box<Record>),
}

impl Value {
    /// Returns the scalar text if this is a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Bool(_) => "bool",
            Value::Rows(_) => "rows",
            Value::Record(_) => "record",
        }
    }
}

// =============================================================================
// From implementations
// =============================================================================

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Vec<Record>> for Value {
    fn from(v: Vec<Record>) -> Self {
        Value::Rows(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(Box::new(v))
    }
}
