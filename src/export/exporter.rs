use crate::error::Result;
use crate::export::config::{ExportConfig, HeaderMode};
use crate::export::flatten::Flattener;
use crate::export::headers::resolve_headers;
use crate::record::Record;
use crate::sheet::{column_letters, Grid, StringPool};
use serde::Serialize;

/// The rectangle holding the header row and all data rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct OccupiedRange {
    pub rows: usize,
    pub columns: usize,
}

impl OccupiedRange {
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.columns == 0
    }

    /// A1-style reference, e.g. `A1:C4`, for marking the range filterable
    pub fn reference(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(format!("A1:{}{}", column_letters(self.columns - 1), self.rows))
    }
}

/// A fully populated sheet, ready for a container-format writer
#[derive(Debug, Clone, Serialize)]
pub struct Worksheet {
    pub name: String,
    /// Header row contents, one per occupied column
    pub headers: Vec<String>,
    /// Name bound to every column the flattener wrote, by index
    pub column_names: Vec<String>,
    pub range: OccupiedRange,
    pub strings: StringPool,
    pub grid: Grid,
}

impl Worksheet {
    fn empty(name: &str) -> Self {
        Worksheet {
            name: name.to_string(),
            headers: Vec::new(),
            column_names: Vec::new(),
            range: OccupiedRange::default(),
            strings: StringPool::new(),
            grid: Grid::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Display text of a cell, `None` when nothing was written there
    pub fn cell_text(&self, row: usize, column: usize) -> Option<String> {
        self.grid.get(row, column).map(|c| c.display(&self.strings))
    }

    /// Display text of every column of `row` inside the occupied range
    pub fn row_texts(&self, row: usize) -> Vec<String> {
        (0..self.range.columns)
            .map(|c| self.cell_text(row, c).unwrap_or_default())
            .collect()
    }

    /// Number of columns holding any cell. The occupied range only marks
    /// the filter area, so array columns may lie beyond it.
    pub fn width(&self) -> usize {
        self.range.columns.max(self.grid.column_count())
    }

    /// Display text of `row` across the full [`Worksheet::width`].
    ///
    /// Header cells missing from row 0 are filled from the bound column names.
    pub fn full_row_texts(&self, row: usize) -> Vec<String> {
        let mut texts = vec![String::new(); self.width()];

        if let Some(cells) = self.grid.row(row) {
            for (column, cell) in cells.iter() {
                texts[column] = cell.display(&self.strings);
            }
        }

        if row == 0 {
            for (column, text) in texts.iter_mut().enumerate() {
                if text.is_empty() && self.grid.get(0, column).is_none() {
                    if let Some(name) = self.column_names.get(column) {
                        text.clone_from(name);
                    }
                }
            }
        }

        texts
    }
}

/// Drives a whole batch through header resolution and flattening
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Exporter { config }
    }

    /// Export `records` into a fresh worksheet.
    ///
    /// An empty batch yields an empty worksheet. Any flattening error
    /// aborts the export.
    pub fn export(&self, records: &[Record]) -> Result<Worksheet> {
        let name = &self.config.sheet_name;

        let Some(first_headers) = resolve_headers(records, &self.config.delimiter) else {
            log::debug!("no records, sheet `{}` stays empty", name);
            return Ok(Worksheet::empty(name));
        };

        let mut grid = Grid::new();
        let mut strings = StringPool::new();
        let mut flattener = Flattener::new(&self.config, &mut grid, &mut strings);

        if self.config.header_mode == HeaderMode::FirstRecord {
            flattener.write_texts(0, 0, &first_headers)?;
        }

        let mut row = 1;
        let mut widest = 0;
        for record in records {
            let extent = flattener.flatten_extent(record, row, 0, "")?;
            widest = widest.max(extent.end_column);
            row = extent.last_row + 1;
        }

        let column_names: Vec<String> = (0..widest)
            .map(|c| flattener.column_names().get(&c).cloned().unwrap_or_default())
            .collect();

        let headers = match self.config.header_mode {
            HeaderMode::FirstRecord => first_headers,
            HeaderMode::Observed => {
                flattener.write_texts(0, 0, &column_names)?;
                column_names.clone()
            }
        };
        drop(flattener);

        let range = OccupiedRange {
            rows: row,
            columns: headers.len(),
        };

        log::debug!(
            "exported {} records into sheet `{}`: {} rows, {} columns, {} strings",
            records.len(),
            name,
            range.rows,
            range.columns,
            strings.len()
        );

        Ok(Worksheet {
            name: name.clone(),
            headers,
            column_names,
            range,
            strings,
            grid,
        })
    }
}
