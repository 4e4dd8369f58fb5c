//! Tabular export of nested records
//!
//! Turns a batch of records into a header row plus flattened data rows.
//! Nested objects become prefixed columns and nested arrays become extra
//! rows that repeat the columns of their parents.

pub mod config;
pub mod exporter;
pub mod flatten;
pub mod headers;
pub mod writer;

pub use config::{BoolCells, ExportConfig, HeaderMode, ScalarFallback};
pub use exporter::{Exporter, OccupiedRange, Worksheet};
pub use flatten::{ColumnRange, Flattener};
pub use headers::resolve_headers;
pub use writer::{DelimitedWriter, JsonWriter};
