use thiserror::Error;

/// Errors raised while decoding records or flattening them into a grid
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExportError {
    /// An array field held something other than an object
    #[error("array field `{field}` has a non-object element at index {index} ({found})")]
    MalformedArrayElement {
        field: String,
        index: usize,
        found: &'static str,
    },

    /// A scalar value has no cell kind it can be written as
    #[error("field `{field}` holds a {kind} value, which has no cell kind")]
    UnsupportedScalarKind { field: String, kind: &'static str },

    /// A batch item was not an object
    #[error("record {index} is not an object ({found})")]
    NotAnObject { index: usize, found: &'static str },

    /// The flattener tried to write the same coordinate twice
    #[error("cell at row {row}, column {column} was already written")]
    CellConflict { row: usize, column: usize },
}

pub type Result<T> = std::result::Result<T, ExportError>;
