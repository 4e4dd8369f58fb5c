//! # Sheetmelt - nested records to spreadsheet grids
//!
//! Flattens batches of semi-structured records (scalars, nested objects and
//! nested arrays of objects) into a two-dimensional grid of typed cells plus
//! a shared string pool, ready for a spreadsheet container writer.
//!
//! ## Modules
//!
//! - **record**: the input record tree
//! - **decode**: JSON into records, with ISO date detection
//! - **sheet**: cells, the string pool and the grid
//! - **export**: header resolution, flattening and the export driver
//!
//! ## Quick Start
//!
//! ```rust
//! use sheetmelt::{decode_records, DecodeOptions, ExportConfig, Exporter};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let data = json!([
//!     {
//!         "id": 1,
//!         "customer": {"name": "Alice"},
//!         "lines": [
//!             {"sku": "A-1", "qty": 2},
//!             {"sku": "B-7", "qty": 1}
//!         ]
//!     }
//! ]);
//!
//! let records = decode_records(data, &DecodeOptions::default())?;
//! let sheet = Exporter::new(ExportConfig::default()).export(&records)?;
//!
//! assert_eq!(sheet.headers, vec!["id", "customer_name"]);
//! // one row per line item, each repeating the order's own columns
//! assert_eq!(sheet.row_texts(1), vec!["1", "Alice"]);
//! assert_eq!(sheet.row_texts(2), vec!["1", "Alice"]);
//! assert_eq!(sheet.cell_text(2, 2).as_deref(), Some("B-7"));
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::Read;

pub mod decode;
pub mod error;
pub mod export;
pub mod record;
pub mod sheet;

// Re-export commonly used types for convenience
pub use decode::{decode_record, decode_records, DecodeOptions};
pub use error::ExportError;
pub use export::{ExportConfig, Exporter, HeaderMode, OccupiedRange, Worksheet};
pub use record::{FieldValue, Record};
pub use sheet::{Cell, CellKind, Grid, StringPool};

/// Main entry point: export a JSON stream into a worksheet.
///
/// The stream may hold one array of objects, one object, or a sequence of
/// objects (NDJSON).
pub fn export_json<R: Read>(
    reader: R,
    config: ExportConfig,
    options: &DecodeOptions,
) -> Result<Worksheet> {
    let stream = serde_json::Deserializer::from_reader(reader).into_iter::<Value>();
    let mut records = Vec::new();

    for value in stream {
        let value = value.context("Failed to parse JSON")?;
        match value {
            Value::Array(items) => {
                for item in items {
                    let index = records.len();
                    records.push(decode_record(item, index, options)?);
                }
            }
            other => {
                let index = records.len();
                records.push(decode_record(other, index, options)?);
            }
        }
    }

    let sheet = Exporter::new(config)
        .export(&records)
        .context("Failed to export records")?;
    Ok(sheet)
}
