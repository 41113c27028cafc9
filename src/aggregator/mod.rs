use std::hash::Hash;
use std::hash::Hasher;
use thiserror::Error;

pub mod column;
pub mod means;
pub mod table;

pub use column::{Column, ColumnType};
pub use means::MeanTable;
pub use table::{Table, TableBuilder};

/// Error type used across the crate
#[derive(Debug, Error)]
pub enum TableError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema/parse error: {0}")]
    Parse(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Column '{column}' has {got} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        got: usize,
    },
}

/// Summary of a CSV load: rows kept plus every cell or row that failed
/// to parse under the inferred schema.
#[derive(Debug)]
pub struct ParseSummary {
    pub rows_processed: usize,
    pub errors: Vec<ParseError>,
}

/// A single rejected cell or row. `row` is 1-based and counts the header.
#[derive(Debug)]
pub struct ParseError {
    pub row: usize,
    pub column: String,
    pub value: String,
    pub error: Option<String>,
}

/// Scalar cell value (owned for simplicity)
#[derive(Debug, Clone)]
pub enum Value {
    /// Integer cell
    Int(i64),
    /// Float cell
    Float(f64),
    /// String cell
    Str(String),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Int(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Str(v) => v.hash(state),
        }
    }
}
