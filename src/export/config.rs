/// How boolean field values are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolCells {
    /// Number cell holding 1 or 0
    Number,
    /// Shared string `"true"` or `"false"`
    String,
}

/// What to do with a scalar that has no cell kind (time-of-day values)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarFallback {
    /// Fail the export with `UnsupportedScalarKind`
    Reject,
    /// Write the value's text as a shared string
    Stringify,
}

/// Where the header row comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    /// Leaf field names of the first record; array fields add none
    FirstRecord,
    /// One header per column the flattener wrote, including array columns
    Observed,
}

/// Configuration for an export
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Display label of the sheet, passed through untouched
    pub sheet_name: String,

    /// Joins parent and child field names in column names
    pub delimiter: String,

    /// Reuse pool entries for repeated strings
    pub dedup_strings: bool,

    pub bool_cells: BoolCells,

    pub scalar_fallback: ScalarFallback,

    pub header_mode: HeaderMode,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            sheet_name: String::from("Data"),
            delimiter: String::from("_"),
            dedup_strings: true,
            bool_cells: BoolCells::Number,
            scalar_fallback: ScalarFallback::Reject,
            header_mode: HeaderMode::FirstRecord,
        }
    }
}

impl ExportConfig {
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }
}
