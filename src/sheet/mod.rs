//! In-memory worksheet model: cells, the shared string pool and the grid
//!
//! Everything here is plain data. A grid and its pool are built by one
//! export and handed over to whatever writes the final file.

pub mod cell;
pub mod grid;
pub mod strings;

pub use cell::{excel_serial, Cell, CellKind};
pub use grid::{column_letters, Grid, Row};
pub use strings::StringPool;
