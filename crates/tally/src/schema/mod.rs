//! Declared relationship schema: tables, columns, and foreign-key links.

mod descriptor;
mod relationship;
mod table;

pub use descriptor::SchemaDescriptor;
pub use relationship::{Cardinality, Relationship};
pub use table::TableSchema;
