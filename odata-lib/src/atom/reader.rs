//! Atom feed reader.

use crate::error::ParseError;
use crate::model::CATEGORY_TERM_FIELD;
use crate::model::DELETED_ENTRY_FIELD;
use crate::model::ID_FIELD;
use crate::model::REF_FIELD;
use crate::model::Record;
use crate::model::Value;
use crate::xml::RoXml;
use crate::xml::XmlDocument;
use crate::xml::XmlRead;

const QUERY_ERROR: &str = "/m:error";
const QUERY_ID: &str = "default:id";
const QUERY_CATEGORY: &str = "default:category";
const QUERY_ROOT_FEED: &str = "/default:feed";

const QUERY_ENTRY: &str = "default:entry";
const QUERY_ROOT_ENTRY: &str = "/default:entry";
const QUERY_ENTRY_DELETED: &str = "at:deleted-entry";

const QUERY_CONTENT: &str = "default:content";

const QUERY_PROPERTIES: &str = "m:properties/d:*";
const QUERY_PROPERTY_ELEMENT: &str = "d:element";
const QUERY_PROPERTY: &str = "d:*";

const DELETED_ENTRY_NAME: &str = "deleted-entry";

/// Parses Atom response bodies into [`Record`]s.
///
/// A feed yields one record per `entry` plus one per `deleted-entry`
/// tombstone, in document order; a document whose root is itself an entry
/// yields a single record. Entry records carry the synthetic identity,
/// category-term, and deletion-flag fields; tombstone records carry only
/// the reference field and the deletion flag.
///
/// Every parse call produces fresh records; parsing the same body twice
/// yields identical results.
pub struct Reader<A: XmlRead = RoXml> {
    engine: A,
}

impl Reader<RoXml> {
    /// Creates a reader over the default `roxmltree` engine.
    pub fn new() -> Self {
        Self { engine: RoXml::new() }
    }
}

impl Default for Reader<RoXml> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: XmlRead> Reader<A> {
    /// Creates a reader over a custom read engine.
    pub fn with_engine(engine: A) -> Self {
        Self { engine }
    }

    /// Parses an Atom body into records.
    ///
    /// Fails with [`ParseError::Malformed`] if the body is not well-formed
    /// XML, or [`ParseError::Service`] if the document carries the
    /// service's error node — even when entries are also present. No
    /// partial results are returned on error.
    pub fn entries(&self, xml: &str) -> Result<Vec<Record>, ParseError> {
        let doc = self.engine.parse(xml)?;
        let root = doc.root();

        if let Some(&error) = doc.find(root, QUERY_ERROR).first() {
            return Err(ParseError::service(doc.text(error)));
        }

        let candidates = match doc.find(root, QUERY_ROOT_FEED).first() {
            Some(&feed) => {
                let mut entries = doc.find(feed, QUERY_ENTRY);
                entries.extend(doc.find(feed, QUERY_ENTRY_DELETED));
                entries
            }
            None => {
                let mut entries = doc.find(root, QUERY_ROOT_ENTRY);
                entries.extend(doc.find(root, QUERY_ENTRY_DELETED));
                entries
            }
        };

        let mut result = Vec::new();
        for entry in candidates {
            let mut record = Record::new();
            if let Some(&content) = doc.find(entry, QUERY_CONTENT).first() {
                let properties = doc.find(content, QUERY_PROPERTIES);
                record = parse_properties(&doc, &properties);

                record.insert(DELETED_ENTRY_FIELD, false);

                if let Some(&id) = doc.find(entry, QUERY_ID).first() {
                    record.insert(ID_FIELD, doc.text(id));
                }
                if let Some(&category) = doc.find(entry, QUERY_CATEGORY).first() {
                    let term = doc.attribute(category, "term").unwrap_or("");
                    record.insert(CATEGORY_TERM_FIELD, term);
                }
            } else if doc.name(entry) == DELETED_ENTRY_NAME {
                let reference = doc.attribute(entry, "ref").unwrap_or("");
                record.insert(REF_FIELD, reference);
                record.insert(DELETED_ENTRY_FIELD, true);
            }

            if !record.is_empty() {
                result.push(record);
            }
        }
        Ok(result)
    }
}

/// Parses the top-level property elements of one entry.
///
/// A property's value is its direct text unless it has collection members:
/// children matched by the singular `d:element` marker first, then any
/// `d:*` child as the fallback. Each member's own `d:*` children become a
/// flat sub-record; members named `element` form an ordered list, anything
/// else is keyed by its local name.
fn parse_properties<D: XmlDocument>(doc: &D, properties: &[D::Node]) -> Record {
    let mut record = Record::new();
    for &property in properties {
        let mut value = Value::Text(doc.text(property));

        let mut members = doc.find(property, QUERY_PROPERTY_ELEMENT);
        if members.is_empty() {
            members = doc.find(property, QUERY_PROPERTY);
        }

        let mut rows: Vec<Record> = Vec::new();
        let mut keyed = Record::new();
        for &member in &members {
            let mut element = Record::new();
            for &child in &doc.find(member, QUERY_PROPERTY) {
                element.insert(doc.name(child), doc.text(child));
            }
            if element.is_empty() {
                continue;
            }
            if doc.name(member) == "element" {
                rows.push(element);
            } else {
                keyed.insert(doc.name(member), element);
            }
        }

        if !rows.is_empty() {
            value = Value::Rows(rows);
        } else if !keyed.is_empty() {
            value = Value::Record(Box::new(keyed));
        }

        record.insert(doc.name(property), value);
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"
      xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
      xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata"
      xmlns:at="http://purl.org/atompub/tombstones/1.0">"#;

    fn feed(entries: &str) -> String {
        format!("{FEED_HEADER}{entries}</feed>")
    }

    fn simple_entry(id: &str, name: &str) -> String {
        format!(
            r#"<entry>
  <id>{id}</id>
  <category term="StandardODATA.Catalog_Products" scheme="s"/>
  <content type="application/xml">
    <m:properties>
      <d:Ref_Key>{id}</d:Ref_Key>
      <d:Description>{name}</d:Description>
    </m:properties>
  </content>
</entry>"#
        )
    }

    #[test]
    fn test_feed_with_entries() {
        let xml = feed(&format!("{}{}", simple_entry("k1", "First"), simple_entry("k2", "Second")));
        let records = Reader::new().entries(&xml).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get_text("Description").unwrap(), "First");
        assert_eq!(records[0].id(), Some("k1"));
        assert_eq!(
            records[0].category_term(),
            Some("StandardODATA.Catalog_Products")
        );
        assert!(!records[0].is_deleted());
        assert_eq!(records[1].get_text("Ref_Key").unwrap(), "k2");
    }

    #[test]
    fn test_field_order_follows_document_order() {
        let xml = feed(&simple_entry("k1", "First"));
        let records = Reader::new().entries(&xml).unwrap();
        let names: Vec<&str> = records[0].iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec!["Ref_Key", "Description", DELETED_ENTRY_FIELD, ID_FIELD, CATEGORY_TERM_FIELD]
        );
    }

    #[test]
    fn test_tombstones_yield_deletion_records() {
        let xml = feed(&format!(
            "{}<at:deleted-entry ref=\"urn:ref-1\" when=\"2024-01-01T00:00:00Z\"/>",
            simple_entry("k1", "First")
        ));
        let records = Reader::new().entries(&xml).unwrap();
        assert_eq!(records.len(), 2);
        let tombstone = &records[1];
        assert!(tombstone.is_deleted());
        assert_eq!(tombstone.reference(), Some("urn:ref-1"));
        assert_eq!(tombstone.len(), 2);
    }

    #[test]
    fn test_root_entry_without_feed() {
        let xml = r#"<?xml version="1.0"?>
<entry xmlns="http://www.w3.org/2005/Atom"
       xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
       xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
  <id>single</id>
  <content type="application/xml">
    <m:properties><d:Code>7</d:Code></m:properties>
  </content>
</entry>"#;
        let records = Reader::new().entries(xml).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get_text("Code").unwrap(), "7");
        assert_eq!(records[0].id(), Some("single"));
    }

    #[test]
    fn test_collection_property_list() {
        let xml = feed(
            r#"<entry>
  <content type="application/xml">
    <m:properties>
      <d:Goods m:type="Collection(StandardODATA.Document_Invoice_Goods_RowType)">
        <d:element>
          <d:LineNumber>1</d:LineNumber>
          <d:Quantity>4</d:Quantity>
        </d:element>
        <d:element>
          <d:LineNumber>2</d:LineNumber>
          <d:Quantity>8</d:Quantity>
        </d:element>
      </d:Goods>
    </m:properties>
  </content>
</entry>"#,
        );
        let records = Reader::new().entries(&xml).unwrap();
        let rows = records[0].get_rows("Goods").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get_text("LineNumber").unwrap(), "1");
        assert_eq!(rows[1].get_text("Quantity").unwrap(), "8");
    }

    #[test]
    fn test_collection_property_keyed_by_name() {
        let xml = feed(
            r#"<entry>
  <content type="application/xml">
    <m:properties>
      <d:Contact>
        <d:Phone><d:Number>123</d:Number></d:Phone>
        <d:Mail><d:Address>a@b</d:Address></d:Mail>
      </d:Contact>
    </m:properties>
  </content>
</entry>"#,
        );
        let records = Reader::new().entries(&xml).unwrap();
        let contact = records[0].get_record("Contact").unwrap();
        assert_eq!(contact.get_record("Phone").unwrap().get_text("Number").unwrap(), "123");
        assert_eq!(contact.get_record("Mail").unwrap().get_text("Address").unwrap(), "a@b");
    }

    #[test]
    fn test_scalar_property_with_empty_children_stays_text() {
        let xml = feed(
            r#"<entry>
  <content type="application/xml">
    <m:properties><d:Description>Paper</d:Description></m:properties>
  </content>
</entry>"#,
        );
        let records = Reader::new().entries(&xml).unwrap();
        assert_eq!(records[0].get_text("Description").unwrap(), "Paper");
    }

    #[test]
    fn test_error_node_fails_with_verbatim_message() {
        let xml = r#"<?xml version="1.0"?>
<m:error xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">Object not found</m:error>"#;
        let err = Reader::new().entries(xml).unwrap_err();
        assert!(matches!(err, ParseError::Service(_)));
        assert_eq!(err.message(), "Object not found");
    }

    #[test]
    fn test_error_node_wins_over_entries() {
        let xml = format!(
            r#"<?xml version="1.0"?>
<m:error xmlns="http://www.w3.org/2005/Atom"
         xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata"
         xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices">boom{}</m:error>"#,
            simple_entry("k1", "First")
        );
        let err = Reader::new().entries(&xml).unwrap_err();
        assert_eq!(err.message(), "boom");
    }

    #[test]
    fn test_malformed_xml_fails() {
        let err = Reader::new().entries("no xml at all").unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }

    #[test]
    fn test_entry_without_content_or_tombstone_is_skipped() {
        let xml = feed("<entry><id>ghost</id></entry>");
        let records = Reader::new().entries(&xml).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let xml = feed(&format!(
            "{}<at:deleted-entry ref=\"urn:r\"/>",
            simple_entry("k1", "First")
        ));
        let reader = Reader::new();
        let first = reader.entries(&xml).unwrap();
        let second = reader.entries(&xml).unwrap();
        assert_eq!(first, second);
    }
}
