use memchr::{memchr, memchr_iter};
use memmap2::Mmap;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::{fs::File, path::Path};

use crate::aggregator::{
    column::{Column, ColumnType},
    ParseError, ParseSummary, TableError,
};

/// An ordered collection of named, equal-length, typed columns.
///
/// Column types are fixed at construction (builder or CSV load) and never
/// re-inferred afterwards. A table is immutable once built; the mean
/// aggregation in [`crate::aggregator::means`] never mutates it.
///
/// # Examples
///
/// ```rust
/// # use groupmeans::aggregator::table::Table;
/// let table = Table::builder()
///     .int_column("var1", vec![Some(1), Some(2), Some(3)])
///     .int_column("var2", vec![Some(4), Some(5), Some(6)])
///     .build()
///     .unwrap();
/// assert_eq!(table.row_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    pub fn builder() -> TableBuilder {
        TableBuilder::new()
    }

    /// Loads a CSV file into a table using memory mapping.
    ///
    /// The first line is the header. Column types are inferred once, from
    /// the first non-missing value of each column (Int, Float, Str); empty
    /// fields and `NA` are missing cells. Chunks of the file are parsed in
    /// parallel and merged in order, so row order matches the file.
    ///
    /// Cells that fail to parse under the inferred schema are stored as
    /// missing and reported in the returned [`ParseSummary`]; rows with the
    /// wrong field count are skipped and reported. Neither aborts the load.
    ///
    /// # Errors
    /// Returns a [`TableError`] if the file cannot be opened or mapped, or
    /// if it is empty (no header line).
    ///
    /// # Example
    /// ```rust,no_run
    /// # use groupmeans::aggregator::table::Table;
    /// let (table, summary) = Table::load_csv("data.csv".as_ref()).unwrap();
    /// println!("{} rows, {} rejected cells", table.row_count(), summary.errors.len());
    /// ```
    pub fn load_csv(path: &Path) -> Result<(Table, ParseSummary), TableError> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let buf: &[u8] = &mmap[..];

        if buf.is_empty() {
            return Err(TableError::Parse("missing header line".into()));
        }

        // Parse header; a file with no newline is header-only
        let (header_line, data) = match memchr(b'\n', buf) {
            Some(end) => (&buf[..end], &buf[end + 1..]),
            None => (buf, &buf[buf.len()..]),
        };
        let headers: Vec<String> = trim_cr(header_line)
            .split(|&b| b == b',')
            .map(|s| String::from_utf8_lossy(s).to_string())
            .collect();

        let schema = Self::infer_schema(data, headers.len());

        // Find chunk boundaries (split at newlines)
        let num_threads = rayon::current_num_threads();
        let chunks = Self::find_chunk_boundaries(data, num_threads);

        // Estimate rows per chunk for preallocation
        let estimated_rows_per_chunk = match memchr(b'\n', data) {
            Some(first_line_end) => (data.len() / num_threads.max(1) / (first_line_end + 1)) + 64,
            None => 64,
        };

        let batches: Vec<ChunkBatch> = chunks
            .par_iter()
            .map(|(start, end)| {
                Self::parse_chunk(&data[*start..*end], &schema, &headers, estimated_rows_per_chunk)
            })
            .collect();

        // Merge batches into flat columns, in file order
        let mut columns: Vec<Column> = schema.iter().map(|t| Column::new(*t)).collect();
        let mut total_rows = 0;
        let mut total_lines = 0;
        let mut all_errors = Vec::new();

        for mut batch in batches {
            for error in &mut batch.errors {
                // Local line index -> 1-based file row, counting the header
                error.row += total_lines + 2;
            }
            all_errors.extend(batch.errors);
            total_rows += batch.row_count;
            total_lines += batch.line_count;

            for (col_idx, column) in columns.iter_mut().enumerate() {
                match column {
                    Column::Int64(cells) => {
                        cells.extend(std::mem::take(&mut batch.int_cells[col_idx]))
                    }
                    Column::Float64(cells) => {
                        cells.extend(std::mem::take(&mut batch.float_cells[col_idx]))
                    }
                    Column::Str(cells) => {
                        cells.extend(std::mem::take(&mut batch.str_cells[col_idx]))
                    }
                }
            }
        }

        let table = Table {
            headers,
            columns,
            row_count: total_rows,
        };
        let summary = ParseSummary {
            rows_processed: total_rows,
            errors: all_errors,
        };
        Ok((table, summary))
    }

    /// Decide each column's type tag from its first non-missing value.
    /// Columns that never show a value default to Str.
    fn infer_schema(data: &[u8], num_cols: usize) -> Vec<ColumnType> {
        let mut schema: Vec<Option<ColumnType>> = vec![None; num_cols];
        let mut unresolved = num_cols;

        for line in lines(data) {
            if line.is_empty() {
                continue;
            }
            for (col_idx, field) in line.split(|&b| b == b',').enumerate() {
                if col_idx >= num_cols || schema[col_idx].is_some() || is_missing(field) {
                    continue;
                }
                let inferred = if atoi_simd::parse::<i64>(field).is_ok() {
                    ColumnType::Int64
                } else if fast_float::parse::<f64, _>(field).is_ok() {
                    ColumnType::Float64
                } else {
                    ColumnType::Str
                };
                schema[col_idx] = Some(inferred);
                unresolved -= 1;
            }
            if unresolved == 0 {
                break;
            }
        }

        schema
            .into_iter()
            .map(|t| t.unwrap_or(ColumnType::Str))
            .collect()
    }

    fn find_chunk_boundaries(data: &[u8], num_chunks: usize) -> Vec<(usize, usize)> {
        if data.is_empty() {
            return vec![];
        }

        let chunk_size = data.len() / num_chunks.max(1);
        let mut boundaries = Vec::with_capacity(num_chunks);
        let mut start = 0;

        for i in 0..num_chunks.saturating_sub(1) {
            let mut end = (i + 1) * chunk_size;

            // Advance to the next newline so rows never straddle chunks
            while end < data.len() && data[end] != b'\n' {
                end += 1;
            }
            if end < data.len() {
                end += 1;
            }

            if start < end {
                boundaries.push((start, end));
            }
            start = end;
        }

        if start < data.len() {
            boundaries.push((start, data.len()));
        }

        boundaries
    }

    fn parse_chunk(
        chunk: &[u8],
        schema: &[ColumnType],
        headers: &[String],
        estimated_rows: usize,
    ) -> ChunkBatch {
        let num_cols = schema.len();
        let mut batch = ChunkBatch::with_capacity(schema, estimated_rows);
        let mut fields: Vec<&[u8]> = Vec::with_capacity(num_cols);

        for line in lines(chunk) {
            if line.is_empty() {
                continue;
            }
            let local_line = batch.line_count;
            batch.line_count += 1;

            fields.clear();
            let mut field_start = 0;
            for comma_pos in memchr_iter(b',', line) {
                fields.push(&line[field_start..comma_pos]);
                field_start = comma_pos + 1;
            }
            fields.push(&line[field_start..]);

            if fields.len() != num_cols {
                batch.errors.push(ParseError {
                    row: local_line,
                    column: String::new(),
                    value: format!("Expected {} fields, got {}", num_cols, fields.len()),
                    error: None,
                });
                continue;
            }

            for col_idx in 0..num_cols {
                let field = fields[col_idx];
                if is_missing(field) {
                    batch.push_missing(col_idx, schema[col_idx]);
                    continue;
                }
                match schema[col_idx] {
                    ColumnType::Int64 => match atoi_simd::parse::<i64>(field) {
                        Ok(value) => batch.int_cells[col_idx].push(Some(value)),
                        Err(e) => {
                            batch.int_cells[col_idx].push(None);
                            batch.errors.push(ParseError {
                                row: local_line,
                                column: headers[col_idx].clone(),
                                value: String::from_utf8_lossy(field).to_string(),
                                error: Some(e.to_string()),
                            });
                        }
                    },
                    ColumnType::Float64 => match fast_float::parse::<f64, _>(field) {
                        Ok(value) => batch.float_cells[col_idx].push(Some(value)),
                        Err(e) => {
                            batch.float_cells[col_idx].push(None);
                            batch.errors.push(ParseError {
                                row: local_line,
                                column: headers[col_idx].clone(),
                                value: String::from_utf8_lossy(field).to_string(),
                                error: Some(e.to_string()),
                            });
                        }
                    },
                    ColumnType::Str => batch.str_cells[col_idx]
                        .push(Some(String::from_utf8_lossy(field).to_string())),
                }
            }

            batch.row_count += 1;
        }

        batch
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column position by name, or `UnknownColumn`.
    pub(crate) fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<&Column, TableError> {
        Ok(&self.columns[self.column_index(name)?])
    }

    pub(crate) fn column_at(&self, idx: usize) -> &Column {
        &self.columns[idx]
    }
}

/// Builds an in-memory [`Table`], validating shape at `build()`.
#[derive(Debug, Default)]
pub struct TableBuilder {
    headers: Vec<String>,
    columns: Vec<Column>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn int_column(mut self, name: &str, cells: Vec<Option<i64>>) -> Self {
        self.headers.push(name.to_string());
        self.columns.push(Column::Int64(cells));
        self
    }

    pub fn float_column(mut self, name: &str, cells: Vec<Option<f64>>) -> Self {
        self.headers.push(name.to_string());
        self.columns.push(Column::Float64(cells));
        self
    }

    pub fn str_column(mut self, name: &str, cells: Vec<Option<String>>) -> Self {
        self.headers.push(name.to_string());
        self.columns.push(Column::Str(cells));
        self
    }

    /// # Errors
    /// `DuplicateColumn` if two columns share a name, `LengthMismatch` if
    /// column lengths differ.
    pub fn build(self) -> Result<Table, TableError> {
        for (i, name) in self.headers.iter().enumerate() {
            if self.headers[..i].contains(name) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }

        let row_count = self.columns.first().map_or(0, Column::len);
        for (name, column) in self.headers.iter().zip(&self.columns) {
            if column.len() != row_count {
                return Err(TableError::LengthMismatch {
                    column: name.clone(),
                    expected: row_count,
                    got: column.len(),
                });
            }
        }

        Ok(Table {
            headers: self.headers,
            columns: self.columns,
            row_count,
        })
    }
}

/// Per-chunk parse output, merged into flat columns by `load_csv`.
struct ChunkBatch {
    int_cells: Vec<Vec<Option<i64>>>,
    float_cells: Vec<Vec<Option<f64>>>,
    str_cells: Vec<Vec<Option<String>>>,
    row_count: usize,
    line_count: usize,
    errors: Vec<ParseError>,
}

impl ChunkBatch {
    fn with_capacity(schema: &[ColumnType], estimated_rows: usize) -> Self {
        fn alloc<T>(schema: &[ColumnType], wanted: ColumnType, rows: usize) -> Vec<Vec<T>> {
            schema
                .iter()
                .map(|t| {
                    if *t == wanted {
                        Vec::with_capacity(rows)
                    } else {
                        Vec::new()
                    }
                })
                .collect()
        }
        ChunkBatch {
            int_cells: alloc(schema, ColumnType::Int64, estimated_rows),
            float_cells: alloc(schema, ColumnType::Float64, estimated_rows),
            str_cells: alloc(schema, ColumnType::Str, estimated_rows),
            row_count: 0,
            line_count: 0,
            errors: Vec::new(),
        }
    }

    fn push_missing(&mut self, col_idx: usize, column_type: ColumnType) {
        match column_type {
            ColumnType::Int64 => self.int_cells[col_idx].push(None),
            ColumnType::Float64 => self.float_cells[col_idx].push(None),
            ColumnType::Str => self.str_cells[col_idx].push(None),
        }
    }
}

/// Iterate `\n`-separated lines with any trailing `\r` stripped, including
/// a final unterminated line.
fn lines(data: &[u8]) -> impl Iterator<Item = &[u8]> + '_ {
    let mut start = 0;
    let mut newlines = memchr_iter(b'\n', data);
    let mut done = false;
    std::iter::from_fn(move || {
        if done {
            return None;
        }
        match newlines.next() {
            Some(pos) => {
                let line = &data[start..pos];
                start = pos + 1;
                Some(trim_cr(line))
            }
            None => {
                done = true;
                if start < data.len() {
                    Some(trim_cr(&data[start..]))
                } else {
                    None
                }
            }
        }
    })
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn is_missing(field: &[u8]) -> bool {
    field.is_empty() || field == b"NA"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_table_from_str(csv: &str) -> (Table, ParseSummary) {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "{}", csv).unwrap();
        Table::load_csv(tmp.path()).unwrap()
    }

    #[test]
    fn test_load_infers_types() {
        let csv = "id,score,label\n1,1.5,a\n2,2.5,b\n";
        let (table, summary) = make_table_from_str(csv);
        assert_eq!(table.row_count(), 2);
        assert_eq!(summary.errors.len(), 0);
        assert_eq!(table.column("id").unwrap().column_type(), ColumnType::Int64);
        assert_eq!(
            table.column("score").unwrap().column_type(),
            ColumnType::Float64
        );
        assert_eq!(table.column("label").unwrap().column_type(), ColumnType::Str);
    }

    #[test]
    fn test_missing_cells() {
        let csv = "x\n1\n\nNA\n3\n";
        let (table, _) = make_table_from_str(csv);
        // The bare empty line is skipped entirely; NA is a missing cell
        match table.column("x").unwrap() {
            Column::Int64(cells) => assert_eq!(cells, &vec![Some(1), None, Some(3)]),
            other => panic!("expected Int64, got {:?}", other),
        }
    }

    #[test]
    fn test_inference_skips_leading_missing() {
        let csv = "x,y\nNA,a\n2,b\n";
        let (table, _) = make_table_from_str(csv);
        assert_eq!(table.column("x").unwrap().column_type(), ColumnType::Int64);
        assert_eq!(table.column("x").unwrap().numeric_at(0), None);
        assert_eq!(table.column("x").unwrap().numeric_at(1), Some(2.0));
    }

    #[test]
    fn test_bad_cell_becomes_missing_and_is_reported() {
        let csv = "x\n1\noops\n3\n";
        let (table, summary) = make_table_from_str(csv);
        assert_eq!(table.row_count(), 3);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].row, 3);
        assert_eq!(summary.errors[0].column, "x");
        assert_eq!(table.column("x").unwrap().numeric_at(1), None);
    }

    #[test]
    fn test_short_row_skipped() {
        let csv = "x,y\n1,2\n5\n3,4\n";
        let (table, summary) = make_table_from_str(csv);
        assert_eq!(table.row_count(), 2);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].row, 3);
    }

    #[test]
    fn test_header_only_file() {
        let csv = "a,b\n";
        let (table, summary) = make_table_from_str(csv);
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 2);
        assert_eq!(summary.rows_processed, 0);
    }

    #[test]
    fn test_crlf() {
        let csv = "x,y\r\n1,a\r\n2,b\r\n";
        let (table, _) = make_table_from_str(csv);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.headers(), ["x", "y"]);
        match table.column("y").unwrap() {
            Column::Str(cells) => assert_eq!(cells[1].as_deref(), Some("b")),
            other => panic!("expected Str, got {:?}", other),
        }
    }

    #[test]
    fn test_builder_length_mismatch() {
        let err = Table::builder()
            .int_column("a", vec![Some(1), Some(2)])
            .int_column("b", vec![Some(1)])
            .build()
            .unwrap_err();
        assert!(matches!(err, TableError::LengthMismatch { .. }));
    }

    #[test]
    fn test_builder_duplicate_column() {
        let err = Table::builder()
            .int_column("a", vec![Some(1)])
            .float_column("a", vec![Some(1.0)])
            .build()
            .unwrap_err();
        assert!(matches!(err, TableError::DuplicateColumn(name) if name == "a"));
    }
}
