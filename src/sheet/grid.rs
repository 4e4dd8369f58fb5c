use crate::sheet::cell::Cell;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Range;

/// The cells of one grid row, keyed by column index
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row {
    cells: BTreeMap<usize, Cell>,
}

impl Row {
    pub fn get(&self, column: usize) -> Option<&Cell> {
        self.cells.get(&column)
    }

    /// Cells in column order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Cell)> {
        self.cells.iter().map(|(c, cell)| (*c, cell))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Sparse two-dimensional cell container, growing on write
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Grid {
    rows: Vec<Row>,
}

impl Grid {
    pub fn new() -> Self {
        Grid { rows: Vec::new() }
    }

    /// Write a cell, returning whatever the coordinate held before
    pub fn insert(&mut self, row: usize, column: usize, cell: Cell) -> Option<Cell> {
        if row >= self.rows.len() {
            self.rows.resize_with(row + 1, Row::default);
        }
        self.rows[row].cells.insert(column, cell)
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    pub fn row(&self, row: usize) -> Option<&Row> {
        self.rows.get(row)
    }

    /// A row exists once any cell has been written to it
    pub fn has_row(&self, row: usize) -> bool {
        self.rows.get(row).is_some_and(|r| !r.is_empty())
    }

    /// Copy the cells of `from` within `columns` into `to`, skipping
    /// coordinates `to` already holds. Returns how many cells were copied.
    pub fn copy_missing(&mut self, from: usize, to: usize, columns: Range<usize>) -> usize {
        if from == to || columns.start >= columns.end {
            return 0;
        }

        let source: Vec<(usize, Cell)> = match self.rows.get(from) {
            Some(r) => r
                .cells
                .range(columns)
                .map(|(c, cell)| (*c, cell.clone()))
                .collect(),
            None => return 0,
        };

        if to >= self.rows.len() {
            self.rows.resize_with(to + 1, Row::default);
        }

        let target = &mut self.rows[to].cells;
        let mut copied = 0;
        for (column, cell) in source {
            if let std::collections::btree_map::Entry::Vacant(slot) = target.entry(column) {
                slot.insert(cell);
                copied += 1;
            }
        }
        copied
    }

    /// One past the highest row index written
    pub fn row_count(&self) -> usize {
        self.rows.iter().rposition(|r| !r.is_empty()).map_or(0, |i| i + 1)
    }

    /// One past the highest column index written in any row
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .filter_map(|r| r.cells.keys().next_back())
            .max()
            .map_or(0, |c| c + 1)
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Row::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }
}

/// Spreadsheet column letters for a 0-based index: 0 → `A`, 25 → `Z`, 26 → `AA`
pub fn column_letters(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;

    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }

    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_grow() {
        let mut grid = Grid::new();
        assert!(grid.insert(3, 7, Cell::Number(1.0)).is_none());

        assert_eq!(grid.row_count(), 4);
        assert_eq!(grid.column_count(), 8);
        assert_eq!(grid.cell_count(), 1);
        assert!(!grid.has_row(2));
        assert!(grid.has_row(3));
    }

    #[test]
    fn test_insert_reports_previous() {
        let mut grid = Grid::new();
        grid.insert(0, 0, Cell::Number(1.0));
        assert_eq!(grid.insert(0, 0, Cell::Empty), Some(Cell::Number(1.0)));
    }

    #[test]
    fn test_copy_missing() {
        let mut grid = Grid::new();
        grid.insert(0, 0, Cell::Number(1.0));
        grid.insert(0, 1, Cell::Number(2.0));
        grid.insert(0, 2, Cell::Number(3.0));
        grid.insert(1, 1, Cell::Number(20.0));

        let copied = grid.copy_missing(0, 1, 0..2);

        assert_eq!(copied, 1);
        assert_eq!(grid.get(1, 0), Some(&Cell::Number(1.0)));
        assert_eq!(grid.get(1, 1), Some(&Cell::Number(20.0)));
        assert_eq!(grid.get(1, 2), None);
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }
}
