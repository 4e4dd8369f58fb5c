use crate::sheet::strings::StringPool;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// The semantic kind of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Empty,
    Number,
    Date,
    DateTime,
    SharedString,
}

/// Content of one grid cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Cell {
    Empty,
    Number(f64),
    /// A calendar date, stored as the instant at midnight
    Date(NaiveDateTime),
    DateTime(NaiveDateTime),
    /// Index into the worksheet's [`StringPool`]
    SharedString(usize),
}

impl Cell {
    pub fn kind(&self) -> CellKind {
        match self {
            Cell::Empty => CellKind::Empty,
            Cell::Number(_) => CellKind::Number,
            Cell::Date(_) => CellKind::Date,
            Cell::DateTime(_) => CellKind::DateTime,
            Cell::SharedString(_) => CellKind::SharedString,
        }
    }

    /// Date cell for a midnight instant, date-time cell otherwise
    pub fn from_instant(instant: NaiveDateTime) -> Self {
        if instant.time() == NaiveTime::MIN {
            Cell::Date(instant)
        } else {
            Cell::DateTime(instant)
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Cell::Date(date.and_time(NaiveTime::MIN))
    }

    /// Numeric spreadsheet value: the number itself or a date serial
    pub fn serial(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Date(instant) | Cell::DateTime(instant) => Some(excel_serial(instant)),
            Cell::Empty | Cell::SharedString(_) => None,
        }
    }

    /// Text shown for this cell, resolving shared strings through `strings`
    pub fn display(&self, strings: &StringPool) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) => n.to_string(),
            Cell::Date(instant) => instant.format("%Y-%m-%d").to_string(),
            Cell::DateTime(instant) => instant.format("%Y-%m-%d %H:%M:%S").to_string(),
            Cell::SharedString(index) => strings.get(*index).unwrap_or_default().to_string(),
        }
    }
}

/// Convert an instant to a spreadsheet date serial.
///
/// Day 1 is 1900-01-01. From day 59 onward one extra day is added to keep
/// the phantom 1900-02-29 that spreadsheet applications still count.
/// The time of day becomes the fraction.
pub fn excel_serial(instant: &NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1900, 1, 1)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN);
    let span = *instant - epoch;
    let days = span.num_milliseconds() as f64 / 86_400_000.0;

    if span.num_days() >= 59 {
        days + 2.0
    } else {
        days + 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_midnight_is_date() {
        assert_eq!(Cell::from_instant(at(2024, 5, 1, 0, 0)).kind(), CellKind::Date);
        assert_eq!(Cell::from_instant(at(2024, 5, 1, 9, 30)).kind(), CellKind::DateTime);
    }

    #[test]
    fn test_excel_serials() {
        assert_eq!(excel_serial(&at(1900, 1, 1, 0, 0)), 1.0);
        assert_eq!(excel_serial(&at(1900, 2, 28, 0, 0)), 59.0);
        assert_eq!(excel_serial(&at(1900, 3, 1, 0, 0)), 61.0);
        assert_eq!(excel_serial(&at(2024, 1, 1, 0, 0)), 45292.0);
        assert_eq!(excel_serial(&at(2024, 1, 1, 12, 0)), 45292.5);

        assert_eq!(Cell::from_instant(at(2024, 1, 1, 0, 0)).serial(), Some(45292.0));
        assert_eq!(Cell::Number(3.5).serial(), Some(3.5));
        assert_eq!(Cell::SharedString(0).serial(), None);
    }

    #[test]
    fn test_display() {
        let mut strings = StringPool::new();
        let idx = strings.insert("hello");

        assert_eq!(Cell::Empty.display(&strings), "");
        assert_eq!(Cell::Number(5.0).display(&strings), "5");
        assert_eq!(Cell::Number(2.25).display(&strings), "2.25");
        assert_eq!(Cell::from_instant(at(2024, 5, 1, 0, 0)).display(&strings), "2024-05-01");
        assert_eq!(
            Cell::from_instant(at(2024, 5, 1, 9, 30)).display(&strings),
            "2024-05-01 09:30:00"
        );
        assert_eq!(Cell::SharedString(idx).display(&strings), "hello");
    }
}
