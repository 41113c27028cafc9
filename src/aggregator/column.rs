use crate::aggregator::Value;

/// Per-column type tag, fixed when the table is built or loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int64,
    Float64,
    Str,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Int64 | ColumnType::Float64)
    }
}

/// A typed column of cells. `None` is a missing cell.
#[derive(Debug, Clone)]
pub enum Column {
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    Str(Vec<Option<String>>),
}

impl Column {
    pub fn new(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Int64 => Column::Int64(Vec::new()),
            ColumnType::Float64 => Column::Float64(Vec::new()),
            ColumnType::Str => Column::Str(Vec::new()),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Int64(_) => ColumnType::Int64,
            Column::Float64(_) => ColumnType::Float64,
            Column::Str(_) => ColumnType::Str,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.column_type().is_numeric()
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Int64(cells) => cells.len(),
            Column::Float64(cells) => cells.len(),
            Column::Str(cells) => cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell at `row` as an owned scalar, `None` when missing.
    ///
    /// Panics if `row` is out of bounds; the table guarantees uniform
    /// column lengths.
    pub fn value(&self, row: usize) -> Option<Value> {
        match self {
            Column::Int64(cells) => cells[row].map(Value::Int),
            Column::Float64(cells) => cells[row].map(Value::Float),
            Column::Str(cells) => cells[row].as_ref().map(|s| Value::Str(s.clone())),
        }
    }

    /// Numeric cell at `row` widened to f64. `None` for a missing cell or
    /// a string column.
    pub fn numeric_at(&self, row: usize) -> Option<f64> {
        match self {
            Column::Int64(cells) => cells[row].map(|v| v as f64),
            Column::Float64(cells) => cells[row],
            Column::Str(_) => None,
        }
    }

    /// Non-missing numeric cells of the whole column, widened to f64.
    /// Empty for string columns.
    pub fn dense_numeric(&self) -> Vec<f64> {
        match self {
            Column::Int64(cells) => cells.iter().filter_map(|v| v.map(|v| v as f64)).collect(),
            Column::Float64(cells) => cells.iter().filter_map(|v| *v).collect(),
            Column::Str(_) => Vec::new(),
        }
    }
}
