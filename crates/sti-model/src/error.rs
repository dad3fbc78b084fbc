use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("table has no columns")]
    NoColumns,
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("{what} refers to column {column}, but the table has {columns} columns")]
    ColumnOutOfRange {
        what: &'static str,
        column: usize,
        columns: usize,
    },
    #[error("{what} refers to row {row}, but the table has {rows} rows")]
    RowOutOfRange {
        what: &'static str,
        row: usize,
        rows: usize,
    },
    #[error("{what} relates column {column} to itself")]
    SelfRelation { what: &'static str, column: usize },
}

pub type Result<T> = std::result::Result<T, ModelError>;
