//! Atom entry writer.

use chrono::DateTime;
use chrono::Local;
use chrono::Utc;

use crate::model::Record;
use crate::model::Value;
use crate::xml::NS_ATOM;
use crate::xml::NS_DATA;
use crate::xml::NS_METADATA;
use crate::xml::TreeWriter;
use crate::xml::XmlWrite;

/// Serializes a [`Record`] into the Atom `entry` document the service
/// expects as an insert/update body.
///
/// # Example
///
/// ```
/// use odata_lib::atom::Entry;
/// use odata_lib::model::Record;
///
/// let record = Record::new().set("Description", "Paper");
/// let xml = Entry::new(record).to_xml("Catalog_Products", "", Some(0));
/// assert!(xml.contains("<d:Description>Paper</d:Description>"));
/// ```
pub struct Entry {
    data: Record,
}

impl Entry {
    /// Creates an entry around the record to serialize.
    pub fn new(data: Record) -> Self {
        Self { data }
    }

    /// Returns the wrapped record.
    pub fn data(&self) -> &Record {
        &self.data
    }

    /// Serializes with the default [`TreeWriter`] engine.
    ///
    /// `edit_link` becomes the entry `id` when non-empty; `updated` is a
    /// Unix timestamp defaulting to now.
    pub fn to_xml(&self, table: &str, edit_link: &str, updated: Option<i64>) -> String {
        let mut writer = TreeWriter::new();
        self.to_xml_with(&mut writer, table, edit_link, updated)
    }

    /// Serializes through any write engine.
    pub fn to_xml_with<W: XmlWrite>(
        &self,
        xml: &mut W,
        table: &str,
        edit_link: &str,
        updated: Option<i64>,
    ) -> String {
        let entry = xml.create_element_ns(NS_ATOM, "entry");

        // Namespace declarations carried as attribute nodes, matching the
        // wire shape the service expects.
        xml.set_attribute(entry, "xmlns:d", NS_DATA);
        xml.set_attribute(entry, "xmlns:m", NS_METADATA);

        xml.append_child(entry, "title", None);
        let author = xml.append_child(entry, "author", None);
        xml.append_child(author, "name", None);

        let updated_node = xml.append_child(entry, "updated", None);
        let timestamp = updated.unwrap_or_else(|| Utc::now().timestamp());
        xml.set_text(updated_node, &time_in_iso8601(timestamp));

        let id = xml.append_child(entry, "id", None);
        if !edit_link.is_empty() {
            xml.set_text(id, edit_link);
        }

        let content = xml.append_child(entry, "content", None);
        xml.set_attribute(content, "type", "application/xml");

        let properties = xml.append_child(content, "m:properties", Some(NS_METADATA));
        for (key, value) in self.data.fields() {
            let property = xml.append_child(properties, &format!("d:{key}"), Some(NS_DATA));

            let members = collection_members(value);
            if members.is_empty() {
                xml.set_text(property, scalar_text(value));
                continue;
            }

            let mut element_name = "element".to_string();
            let mut element_type = format!("StandardODATA.{table}_{key}_RowType");
            let mut annotate_property = true;
            for (member_key, row) in members {
                if let Some(member_key) = member_key {
                    // A "name namespace" pseudo key names the element and its
                    // type explicitly and suppresses the outer annotation.
                    let parts: Vec<&str> = member_key.split(' ').collect();
                    if parts.len() == 2 {
                        element_name = parts[0].to_string();
                        element_type = parts[1].to_string();
                        annotate_property = false;
                    }
                }

                let member = xml.append_child(property, &format!("d:{element_name}"), Some(NS_DATA));
                if !element_type.is_empty() {
                    xml.set_attribute_ns(member, NS_METADATA, "m:type", &element_type);
                }
                for (row_key, row_value) in row.fields() {
                    let child = xml.append_child(member, &format!("d:{row_key}"), Some(NS_DATA));
                    xml.set_text(child, scalar_text(row_value));
                }
            }
            if annotate_property {
                xml.set_attribute_ns(
                    property,
                    NS_METADATA,
                    "m:type",
                    &format!("Collection(StandardODATA.{table}_{key}_RowType)"),
                );
            }
        }

        xml.to_xml(entry)
    }
}

/// Returns the collection members of a value, each with its optional
/// pseudo key. Empty collections yield no members and fall back to the
/// scalar path.
fn collection_members(value: &Value) -> Vec<(Option<&str>, &Record)> {
    match value {
        Value::Rows(rows) => rows.iter().map(|row| (None, row)).collect(),
        Value::Record(keyed) => keyed
            .fields()
            .iter()
            .filter_map(|(key, member)| match member {
                Value::Record(row) => Some((Some(key.as_str()), row.as_ref())),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn scalar_text(value: &Value) -> &str {
    match value {
        Value::Text(s) => s.as_str(),
        Value::Bool(true) => "true",
        Value::Bool(false) => "false",
        // empty or non-scalar collections serialize as empty text
        _ => "",
    }
}

/// Formats a Unix timestamp with the date in local time and the time of
/// day in UTC, as the service's entries have always been stamped.
fn time_in_iso8601(timestamp: i64) -> String {
    let utc = DateTime::from_timestamp(timestamp, 0).unwrap_or_default();
    let local = utc.with_timezone(&Local);
    format!("{}T{}Z", local.format("%Y-%m-%d"), utc.format("%H:%M:%S"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_skeleton() {
        let xml = Entry::new(Record::new()).to_xml("Catalog_Products", "", Some(0));
        assert!(xml.starts_with(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<entry xmlns=\"http://www.w3.org/2005/Atom\""
        ));
        assert!(xml.contains("xmlns:d=\"http://schemas.microsoft.com/ado/2007/08/dataservices\""));
        assert!(xml.contains(
            "xmlns:m=\"http://schemas.microsoft.com/ado/2007/08/dataservices/metadata\""
        ));
        assert!(xml.contains("<title/>"));
        assert!(xml.contains("<author><name/></author>"));
        assert!(xml.contains("<id/>"));
        assert!(xml.contains("<content type=\"application/xml\"><m:properties/></content>"));
    }

    #[test]
    fn test_edit_link_becomes_id() {
        let xml = Entry::new(Record::new()).to_xml(
            "Catalog_Products",
            "http://host/odata/Catalog_Products(guid'1')",
            Some(0),
        );
        assert!(xml.contains("<id>http://host/odata/Catalog_Products(guid'1')</id>"));
    }

    #[test]
    fn test_scalar_fields_in_insertion_order() {
        let record = Record::new().set("Description", "Paper").set("Code", "42");
        let xml = Entry::new(record).to_xml("Catalog_Products", "", Some(0));
        let description = xml.find("<d:Description>Paper</d:Description>").unwrap();
        let code = xml.find("<d:Code>42</d:Code>").unwrap();
        assert!(description < code);
    }

    #[test]
    fn test_updated_timestamp_format() {
        let xml = Entry::new(Record::new()).to_xml("T", "", Some(1_700_000_000));
        // time of day is always the UTC clock reading
        assert!(xml.contains("T22:13:20Z</updated>"));
    }

    #[test]
    fn test_collection_field_default_typing() {
        let rows = vec![
            Record::new().set("LineNumber", "1").set("Quantity", "4"),
            Record::new().set("LineNumber", "2").set("Quantity", "8"),
        ];
        let record = Record::new().set("Goods", rows);
        let xml = Entry::new(record).to_xml("Document_Invoice", "", Some(0));
        assert!(xml.contains(
            "<d:Goods m:type=\"Collection(StandardODATA.Document_Invoice_Goods_RowType)\">"
        ));
        assert_eq!(
            xml.matches("<d:element m:type=\"StandardODATA.Document_Invoice_Goods_RowType\">")
                .count(),
            2
        );
        assert!(xml.contains("<d:LineNumber>1</d:LineNumber>"));
        assert!(xml.contains("<d:Quantity>8</d:Quantity>"));
    }

    #[test]
    fn test_collection_field_pseudo_key_typing() {
        let keyed = Record::new().set(
            "Row StandardODATA.Custom_RowType",
            Record::new().set("Number", "7"),
        );
        let record = Record::new().set("Lines", keyed);
        let xml = Entry::new(record).to_xml("Document_Invoice", "", Some(0));
        assert!(xml.contains("<d:Row m:type=\"StandardODATA.Custom_RowType\">"));
        assert!(xml.contains("<d:Number>7</d:Number>"));
        // explicit typing suppresses the outer collection annotation
        assert!(!xml.contains("Collection("));
    }

    #[test]
    fn test_empty_collection_is_scalar_empty() {
        let record = Record::new().set("Goods", Vec::<Record>::new());
        let xml = Entry::new(record).to_xml("Document_Invoice", "", Some(0));
        assert!(xml.contains("<d:Goods/>"));
        assert!(!xml.contains("m:type"));
    }

    #[test]
    fn test_text_is_escaped() {
        let record = Record::new().set("Description", "Bolts <M8> & nuts");
        let xml = Entry::new(record).to_xml("Catalog_Products", "", Some(0));
        assert!(xml.contains("<d:Description>Bolts &lt;M8&gt; &amp; nuts</d:Description>"));
    }
}
