//! OData query building

mod select;

pub use select::*;
