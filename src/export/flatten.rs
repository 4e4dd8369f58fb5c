//! Record flattening: the core of the export
//!
//! A record is written left to right into one row. Nested objects stay on
//! the same row with prefixed column names. Array fields are deferred until
//! the record's direct fields are written; each array then gets its own
//! column range starting where the previous one ended, and every element
//! after the first moves to a new row. New rows carry the cells of the
//! record and its ancestors so each row can be read on its own.
//! Cells of earlier sibling arrays are never repeated onto those rows.

use crate::error::{ExportError, Result};
use crate::export::config::{BoolCells, ExportConfig, ScalarFallback};
use crate::record::{FieldValue, Record};
use crate::sheet::{Cell, Grid, StringPool};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Contiguous span of columns `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRange {
    pub start: usize,
    pub end: usize,
}

impl ColumnRange {
    pub fn new(start: usize, end: usize) -> Self {
        ColumnRange { start, end }
    }

    pub fn width(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0
    }
}

/// Rows and columns a flattened record reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Extent {
    pub last_row: usize,
    pub end_column: usize,
}

/// An array field waiting for the record's direct fields to be written
struct Deferred<'r> {
    prefix: String,
    elements: &'r [Record],
}

/// Writes records into a grid, interning strings into a pool
pub struct Flattener<'a> {
    config: &'a ExportConfig,
    grid: &'a mut Grid,
    strings: &'a mut StringPool,
    names: BTreeMap<usize, String>,
}

impl<'a> Flattener<'a> {
    pub fn new(config: &'a ExportConfig, grid: &'a mut Grid, strings: &'a mut StringPool) -> Self {
        Flattener {
            config,
            grid,
            strings,
            names: BTreeMap::new(),
        }
    }

    /// Flatten `record` with its first cell at (`row`, `start_column`),
    /// naming columns with `prefix`. Returns the last row used, which is
    /// `row` itself unless an array expanded the record.
    pub fn flatten(
        &mut self,
        record: &Record,
        row: usize,
        start_column: usize,
        prefix: &str,
    ) -> Result<usize> {
        Ok(self.flatten_extent(record, row, start_column, prefix)?.last_row)
    }

    pub(crate) fn flatten_extent(
        &mut self,
        record: &Record,
        row: usize,
        start_column: usize,
        prefix: &str,
    ) -> Result<Extent> {
        self.flatten_record(record, row, start_column, prefix, &[])
    }

    /// Write `texts` as string cells from `start_column` onward
    pub fn write_texts(&mut self, row: usize, start_column: usize, texts: &[String]) -> Result<()> {
        for (offset, text) in texts.iter().enumerate() {
            let cell = self.string_cell(text);
            self.put(row, start_column + offset, cell)?;
        }
        Ok(())
    }

    /// Name bound to each column, from the first scalar written there
    pub fn column_names(&self) -> &BTreeMap<usize, String> {
        &self.names
    }

    pub fn into_column_names(self) -> BTreeMap<usize, String> {
        self.names
    }

    fn flatten_record(
        &mut self,
        record: &Record,
        row: usize,
        start: usize,
        prefix: &str,
        carried: &[ColumnRange],
    ) -> Result<Extent> {
        let mut deferred = Vec::new();
        let fill_end = self.write_fields(record, row, start, prefix, &mut deferred)?;

        let mut extent = Extent {
            last_row: row,
            end_column: fill_end,
        };
        if deferred.is_empty() {
            return Ok(extent);
        }

        let mut carry = carried.to_vec();
        if fill_end > start {
            carry.push(ColumnRange::new(start, fill_end));
        }

        let mut next_start = fill_end;
        for array in deferred {
            let (range, last_row) = self.expand_array(&array, row, next_start, &carry)?;
            extent.last_row = extent.last_row.max(last_row);
            extent.end_column = extent.end_column.max(range.end);
            next_start = range.end;
        }

        Ok(extent)
    }

    /// Write scalars and nested objects on `row`; returns the column cursor
    fn write_fields<'r>(
        &mut self,
        record: &'r Record,
        row: usize,
        mut column: usize,
        prefix: &str,
        deferred: &mut Vec<Deferred<'r>>,
    ) -> Result<usize> {
        for (name, value) in record.fields() {
            match value {
                FieldValue::Object(inner) => {
                    let nested = format!("{}{}{}", prefix, name, self.config.delimiter);
                    column = self.write_fields(inner, row, column, &nested, deferred)?;
                }
                FieldValue::Array(elements) => {
                    deferred.push(Deferred {
                        prefix: format!("{}{}{}", prefix, name, self.config.delimiter),
                        elements,
                    });
                }
                scalar => {
                    let column_name = format!("{}{}", prefix, name);
                    let cell = self.scalar_cell(scalar, &column_name)?;
                    self.put(row, column, cell)?;
                    self.bind_name(column, column_name);
                    column += 1;
                }
            }
        }

        Ok(column)
    }

    /// Lay out one array from `start`, one element per row block
    fn expand_array(
        &mut self,
        array: &Deferred<'_>,
        row: usize,
        start: usize,
        carried: &[ColumnRange],
    ) -> Result<(ColumnRange, usize)> {
        let mut width = 0;
        let mut last_row = row;

        for (index, element) in array.elements.iter().enumerate() {
            let element_row = if index == 0 { row } else { last_row + 1 };

            if index > 0 {
                if self.grid.has_row(element_row) {
                    log::trace!("row {} already materialized, sharing it for {}", element_row, array.prefix);
                }
                for range in carried {
                    self.grid.copy_missing(row, element_row, range.start..range.end);
                }
            }

            let extent = self.flatten_record(element, element_row, start, &array.prefix, carried)?;
            width = width.max(extent.end_column - start);
            last_row = extent.last_row.max(element_row);
        }

        Ok((ColumnRange::new(start, start + width), last_row))
    }

    fn scalar_cell(&mut self, value: &FieldValue, column_name: &str) -> Result<Cell> {
        let cell = match value {
            FieldValue::Null => Cell::Empty,
            FieldValue::Bool(b) => match self.config.bool_cells {
                BoolCells::Number => Cell::Number(if *b { 1.0 } else { 0.0 }),
                BoolCells::String => self.string_cell(if *b { "true" } else { "false" }),
            },
            FieldValue::Int(i) => Cell::Number(*i as f64),
            FieldValue::Float(f) => Cell::Number(*f),
            FieldValue::Date(d) => Cell::from_date(*d),
            FieldValue::DateTime(dt) => Cell::from_instant(*dt),
            FieldValue::String(s) => self.string_cell(s),
            FieldValue::Time(t) => match self.config.scalar_fallback {
                ScalarFallback::Stringify => {
                    log::warn!("writing {} value of `{}` as text", value.kind_name(), column_name);
                    self.string_cell(&t.to_string())
                }
                ScalarFallback::Reject => {
                    return Err(ExportError::UnsupportedScalarKind {
                        field: column_name.to_string(),
                        kind: value.kind_name(),
                    });
                }
            },
            FieldValue::Object(_) | FieldValue::Array(_) => {
                return Err(ExportError::UnsupportedScalarKind {
                    field: column_name.to_string(),
                    kind: value.kind_name(),
                });
            }
        };

        Ok(cell)
    }

    fn string_cell(&mut self, text: &str) -> Cell {
        let idx = if self.config.dedup_strings {
            self.strings.insert(text)
        } else {
            self.strings.push(text)
        };
        Cell::SharedString(idx)
    }

    fn put(&mut self, row: usize, column: usize, cell: Cell) -> Result<()> {
        if self.grid.get(row, column).is_some() {
            return Err(ExportError::CellConflict { row, column });
        }
        self.grid.insert(row, column, cell);
        Ok(())
    }

    fn bind_name(&mut self, column: usize, name: String) {
        match self.names.entry(column) {
            Entry::Vacant(slot) => {
                slot.insert(name);
            }
            Entry::Occupied(slot) => {
                if *slot.get() != name {
                    log::debug!(
                        "column {} is bound to `{}`, also written as `{}`",
                        column,
                        slot.get(),
                        name
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::CellKind;
    use chrono::{NaiveDate, NaiveTime};
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        Record::try_from(value).unwrap()
    }

    fn numbers(grid: &Grid, row: usize) -> Vec<Option<f64>> {
        let width = grid.column_count();
        (0..width)
            .map(|c| match grid.get(row, c) {
                Some(Cell::Number(n)) => Some(*n),
                _ => None,
            })
            .collect()
    }

    fn run(config: &ExportConfig, rec: &Record) -> (Grid, StringPool, Result<usize>) {
        let mut grid = Grid::new();
        let mut strings = StringPool::new();
        let result = Flattener::new(config, &mut grid, &mut strings).flatten(rec, 0, 0, "");
        (grid, strings, result)
    }

    #[test]
    fn test_scalars_in_one_row() {
        let config = ExportConfig::default();
        let (grid, strings, last) = run(&config, &record(json!({"a": 5, "b": "x", "c": null})));

        assert_eq!(last.unwrap(), 0);
        assert_eq!(grid.get(0, 0), Some(&Cell::Number(5.0)));
        assert_eq!(grid.get(0, 1), Some(&Cell::SharedString(0)));
        assert_eq!(grid.get(0, 2).map(Cell::kind), Some(CellKind::Empty));
        assert_eq!(strings.get(0), Some("x"));
    }

    #[test]
    fn test_object_stays_on_row() {
        let config = ExportConfig::default();
        let (grid, _, last) = run(&config, &record(json!({"a": 1, "b": {"c": 2, "d": 3}})));

        assert_eq!(last.unwrap(), 0);
        assert_eq!(numbers(&grid, 0), vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_array_rows_carry_parent() {
        let config = ExportConfig::default();
        let rec = record(json!({"a": 1, "items": [{"x": 1}, {"x": 2}, {"x": 3}]}));
        let (grid, _, last) = run(&config, &rec);

        assert_eq!(last.unwrap(), 2);
        for row in 0..3 {
            assert_eq!(numbers(&grid, row), vec![Some(1.0), Some(row as f64 + 1.0)]);
        }
    }

    #[test]
    fn test_sibling_arrays_share_rows() {
        let config = ExportConfig::default();
        let rec = record(json!({
            "id": 1,
            "p": [{"x": 1}, {"x": 2}],
            "q": [{"y": 10}, {"y": 20}, {"y": 30}]
        }));
        let (grid, _, last) = run(&config, &rec);

        assert_eq!(last.unwrap(), 2);
        assert_eq!(numbers(&grid, 0), vec![Some(1.0), Some(1.0), Some(10.0)]);
        assert_eq!(numbers(&grid, 1), vec![Some(1.0), Some(2.0), Some(20.0)]);
        // p's values are not smeared into rows it does not own
        assert_eq!(numbers(&grid, 2), vec![Some(1.0), None, Some(30.0)]);
    }

    #[test]
    fn test_wide_element_reserves_range() {
        let config = ExportConfig::default();
        let rec = record(json!({
            "p": [{"x": 1}, {"x": 2, "y": 3}],
            "q": [{"z": 9}]
        }));
        let (grid, _, _) = run(&config, &rec);

        // p spans two columns because of its widest element, q starts after it
        assert_eq!(grid.get(0, 2), Some(&Cell::Number(9.0)));
        assert_eq!(grid.get(1, 1), Some(&Cell::Number(3.0)));
    }

    #[test]
    fn test_nested_arrays() {
        let config = ExportConfig::default();
        let rec = record(json!({
            "id": 1,
            "items": [
                {"sku": 10, "parts": [{"n": 1}, {"n": 2}]},
                {"sku": 20, "parts": [{"n": 3}]}
            ]
        }));
        let (grid, _, last) = run(&config, &rec);

        assert_eq!(last.unwrap(), 2);
        assert_eq!(numbers(&grid, 0), vec![Some(1.0), Some(10.0), Some(1.0)]);
        assert_eq!(numbers(&grid, 1), vec![Some(1.0), Some(10.0), Some(2.0)]);
        assert_eq!(numbers(&grid, 2), vec![Some(1.0), Some(20.0), Some(3.0)]);
    }

    #[test]
    fn test_object_array_is_deferred_to_record() {
        let config = ExportConfig::default();
        let rec = record(json!({
            "id": 1,
            "order": {"no": 7, "lines": [{"q": 1}, {"q": 2}]},
            "total": 5
        }));
        let mut grid = Grid::new();
        let mut strings = StringPool::new();
        let mut flattener = Flattener::new(&config, &mut grid, &mut strings);
        let last = flattener.flatten(&rec, 0, 0, "").unwrap();
        let names = flattener.into_column_names();

        assert_eq!(last, 1);
        assert_eq!(
            names.values().cloned().collect::<Vec<_>>(),
            vec!["id", "order_no", "total", "order_lines_q"]
        );
        assert_eq!(numbers(&grid, 1), vec![Some(1.0), Some(7.0), Some(5.0), Some(2.0)]);
    }

    #[test]
    fn test_empty_array_adds_nothing() {
        let config = ExportConfig::default();
        let (grid, _, last) = run(&config, &record(json!({"a": 1, "items": [], "b": 2})));

        assert_eq!(last.unwrap(), 0);
        assert_eq!(grid.row_count(), 1);
        assert_eq!(numbers(&grid, 0), vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_empty_record_writes_nothing() {
        let config = ExportConfig::default();
        let mut grid = Grid::new();
        let mut strings = StringPool::new();
        let last = Flattener::new(&config, &mut grid, &mut strings)
            .flatten(&Record::new(), 4, 0, "")
            .unwrap();

        assert_eq!(last, 4);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_start_column_and_prefix() {
        let config = ExportConfig::default();
        let mut grid = Grid::new();
        let mut strings = StringPool::new();
        let mut flattener = Flattener::new(&config, &mut grid, &mut strings);
        let last = flattener.flatten(&record(json!({"x": 1})), 2, 3, "outer_").unwrap();
        assert_eq!(flattener.column_names().get(&3).map(String::as_str), Some("outer_x"));
        drop(flattener);

        assert_eq!(last, 2);
        assert_eq!(grid.get(2, 3), Some(&Cell::Number(1.0)));
    }

    #[test]
    fn test_string_dedup_toggle() {
        let rec = record(json!({"a": "same", "b": "same"}));

        let (_, strings, _) = run(&ExportConfig::default(), &rec);
        assert_eq!(strings.len(), 1);

        let config = ExportConfig {
            dedup_strings: false,
            ..ExportConfig::default()
        };
        let (grid, strings, _) = run(&config, &rec);
        assert_eq!(strings.len(), 2);
        assert_eq!(grid.get(0, 1), Some(&Cell::SharedString(1)));
    }

    #[test]
    fn test_bool_cells() {
        let rec = record(json!({"t": true, "f": false}));

        let (grid, _, _) = run(&ExportConfig::default(), &rec);
        assert_eq!(numbers(&grid, 0), vec![Some(1.0), Some(0.0)]);

        let config = ExportConfig {
            bool_cells: BoolCells::String,
            ..ExportConfig::default()
        };
        let (grid, strings, _) = run(&config, &rec);
        assert_eq!(grid.get(0, 0).map(|c| c.display(&strings)), Some("true".to_string()));
        assert_eq!(grid.get(0, 1).map(|c| c.display(&strings)), Some("false".to_string()));
    }

    #[test]
    fn test_date_kinds() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let rec = Record::new()
            .with("d", day)
            .with("midnight", day.and_hms_opt(0, 0, 0).unwrap())
            .with("stamp", day.and_hms_opt(13, 5, 0).unwrap());
        let (grid, _, _) = run(&ExportConfig::default(), &rec);

        assert_eq!(grid.get(0, 0).map(Cell::kind), Some(CellKind::Date));
        assert_eq!(grid.get(0, 1).map(Cell::kind), Some(CellKind::Date));
        assert_eq!(grid.get(0, 2).map(Cell::kind), Some(CellKind::DateTime));
    }

    #[test]
    fn test_time_rejected_or_stringified() {
        let rec = Record::new()
            .with("a", 1)
            .with("at", NaiveTime::from_hms_opt(7, 45, 0).unwrap());

        let (_, _, result) = run(&ExportConfig::default(), &rec);
        assert_eq!(
            result.unwrap_err(),
            ExportError::UnsupportedScalarKind {
                field: "at".to_string(),
                kind: "time",
            }
        );

        let config = ExportConfig {
            scalar_fallback: ScalarFallback::Stringify,
            ..ExportConfig::default()
        };
        let (grid, strings, result) = run(&config, &rec);
        assert!(result.is_ok());
        assert_eq!(grid.get(0, 1).map(|c| c.display(&strings)), Some("07:45:00".to_string()));
    }

    #[test]
    fn test_occupied_coordinate_conflicts() {
        let config = ExportConfig::default();
        let mut grid = Grid::new();
        let mut strings = StringPool::new();
        grid.insert(0, 1, Cell::Empty);

        let err = Flattener::new(&config, &mut grid, &mut strings)
            .flatten(&record(json!({"a": 1, "b": 2})), 0, 0, "")
            .unwrap_err();
        assert_eq!(err, ExportError::CellConflict { row: 0, column: 1 });
    }

    #[test]
    fn test_column_range_width() {
        let range = ColumnRange::new(2, 5);
        assert_eq!(range.width(), 3);
        assert!(ColumnRange::new(4, 4).is_empty());
    }
}
