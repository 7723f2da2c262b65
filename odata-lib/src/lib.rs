//! OData v2 Atom client library
//!
//! A Rust client library for OData v2 services speaking the Atom wire
//! format: query-string building, Atom feed/entry parsing, entry
//! serialization, and a thin async connection layer over a pluggable HTTP
//! executor.

pub mod atom;
pub mod error;
pub mod model;
pub mod query;
pub mod transport;
pub mod xml;

mod client;
mod registry;
mod result;
mod table;

pub use client::*;
pub use registry::*;
pub use result::*;
pub use table::*;
