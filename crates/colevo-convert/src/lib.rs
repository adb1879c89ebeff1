//! Row <-> columnar conversion for colevo.
//!
//! Records (`colevo_core::record::Record`) are projected onto a schema's
//! typed Arrow columns and read back. Each `DataType` owns one builder and
//! one reader variant; nothing is dispatched dynamically per cell.

#![forbid(unsafe_code)]

pub mod arrow_types;
pub mod engine;
pub mod table;
pub mod transform;

mod builder;
mod reader;

pub use arrow_types::{schema_from_arrow, schema_to_arrow};
pub use engine::{ConversionEngine, RowIter};
pub use table::Table;
pub use transform::TableTransform;
