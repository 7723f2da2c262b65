//! XML engine capability seams
//!
//! The protocol layer never touches an XML library directly. The write path
//! (entry serialization) goes through [`XmlWrite`] and the read path (feed
//! parsing) through [`XmlRead`]; one conforming engine ships for each
//! ([`TreeWriter`], [`RoXml`]), and either can be swapped for a different
//! engine without touching the entry writer or the feed reader.

mod read;
mod roxml;
mod tree;
mod write;

pub use read::*;
pub use roxml::*;
pub use tree::*;
pub use write::*;

/// Atom Syndication Format namespace.
pub const NS_ATOM: &str = "http://www.w3.org/2005/Atom";
/// OData data services namespace (`d:` prefix).
pub const NS_DATA: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices";
/// OData data services metadata namespace (`m:` prefix).
pub const NS_METADATA: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/metadata";
/// Atom tombstones namespace (`at:` prefix).
pub const NS_TOMBSTONES: &str = "http://purl.org/atompub/tombstones/1.0";
