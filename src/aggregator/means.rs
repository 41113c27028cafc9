use std::collections::HashMap;

use crate::aggregator::{table::Table, TableError, Value};
use crate::helpers::simd_helpers::sum_f64;

/// Result of [`Table::column_means`]: one row per group (or a single row
/// when no grouping was requested), one value field per numeric column of
/// the input, in input column order.
///
/// A `None` mean is undefined: the group had no non-missing cells in that
/// column.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanTable {
    group_column: Option<String>,
    group_values: Vec<Option<Value>>,
    value_columns: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

impl MeanTable {
    /// Name of the grouping column, `None` for whole-table means.
    pub fn group_column(&self) -> Option<&str> {
        self.group_column.as_deref()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Names of the value fields, in input column order.
    pub fn value_columns(&self) -> &[String] {
        &self.value_columns
    }

    /// Group identifier of `row`. `None` when no grouping was requested or
    /// when the group is the missing-cell group.
    pub fn group_value(&self, row: usize) -> Option<&Value> {
        self.group_values.get(row).and_then(Option::as_ref)
    }

    /// All means of `row`, aligned with [`value_columns`](Self::value_columns).
    pub fn means(&self, row: usize) -> &[Option<f64>] {
        &self.rows[row]
    }

    /// Mean of `column` in `row`. `None` if the mean is undefined or the
    /// column carries no value field.
    pub fn mean(&self, row: usize, column: &str) -> Option<f64> {
        let idx = self.value_columns.iter().position(|c| c == column)?;
        self.rows.get(row)?[idx]
    }

    /// Row index of the group identified by `value`, treating the result
    /// as a set of (group, means) pairs.
    pub fn find_group(&self, value: Option<&Value>) -> Option<usize> {
        self.group_values.iter().position(|g| g.as_ref() == value)
    }
}

impl Table {
    /// Computes the arithmetic mean of every numeric column.
    ///
    /// With `group_by = None` the result has exactly one row covering the
    /// whole table. With `group_by = Some(name)` the rows are partitioned
    /// by the distinct values of that column (a missing cell is its own
    /// group) and the result has one row per group, in order of first
    /// appearance. The grouping column identifies the row and is excluded
    /// from the value fields even when numeric.
    ///
    /// Missing cells never contribute to a mean; a group with no
    /// non-missing cells in a column gets an undefined (`None`) mean.
    /// The table itself is never modified.
    ///
    /// # Errors
    /// [`TableError::UnknownColumn`] if `group_by` names no column.
    ///
    /// # Example
    /// ```rust
    /// # use groupmeans::aggregator::table::Table;
    /// let table = Table::builder()
    ///     .int_column("var1", vec![Some(1), Some(2), Some(3)])
    ///     .int_column("var2", vec![Some(4), Some(5), Some(6)])
    ///     .build()
    ///     .unwrap();
    /// let means = table.column_means(None).unwrap();
    /// assert_eq!(means.mean(0, "var1"), Some(2.0));
    /// assert_eq!(means.mean(0, "var2"), Some(5.0));
    /// ```
    pub fn column_means(&self, group_by: Option<&str>) -> Result<MeanTable, TableError> {
        match group_by {
            Some(name) => self.grouped_means(name),
            None => Ok(self.overall_means()),
        }
    }

    fn overall_means(&self) -> MeanTable {
        let value_cols = self.numeric_columns(None);

        let row: Vec<Option<f64>> = value_cols
            .iter()
            .map(|&idx| {
                let dense = self.column_at(idx).dense_numeric();
                if dense.is_empty() {
                    None
                } else {
                    Some(sum_f64(&dense) / dense.len() as f64)
                }
            })
            .collect();

        MeanTable {
            group_column: None,
            group_values: Vec::new(),
            value_columns: self.column_names(&value_cols),
            rows: vec![row],
        }
    }

    fn grouped_means(&self, group_by: &str) -> Result<MeanTable, TableError> {
        let group_idx = self.column_index(group_by)?;
        let group_col = self.column_at(group_idx);
        let value_cols = self.numeric_columns(Some(group_idx));

        // One slot per distinct group value, in order of first appearance
        let mut slots: HashMap<Option<Value>, usize> = HashMap::new();
        let mut group_values: Vec<Option<Value>> = Vec::new();
        let mut sums: Vec<Vec<(f64, usize)>> = Vec::new();

        for row in 0..self.row_count() {
            let key = group_col.value(row);
            let slot = *slots.entry(key.clone()).or_insert_with(|| {
                group_values.push(key);
                sums.push(vec![(0.0, 0); value_cols.len()]);
                sums.len() - 1
            });

            for (field, &col_idx) in value_cols.iter().enumerate() {
                if let Some(v) = self.column_at(col_idx).numeric_at(row) {
                    let acc = &mut sums[slot][field];
                    acc.0 += v;
                    acc.1 += 1;
                }
            }
        }

        let rows: Vec<Vec<Option<f64>>> = sums
            .into_iter()
            .map(|accs| {
                accs.into_iter()
                    .map(|(sum, count)| {
                        if count == 0 {
                            None
                        } else {
                            Some(sum / count as f64)
                        }
                    })
                    .collect()
            })
            .collect();

        Ok(MeanTable {
            group_column: Some(group_by.to_string()),
            group_values,
            value_columns: self.column_names(&value_cols),
            rows,
        })
    }

    /// Indices of numeric columns in input order, minus the grouping column.
    fn numeric_columns(&self, exclude: Option<usize>) -> Vec<usize> {
        (0..self.column_count())
            .filter(|&idx| Some(idx) != exclude && self.column_at(idx).is_numeric())
            .collect()
    }

    fn column_names(&self, indices: &[usize]) -> Vec<String> {
        indices.iter().map(|&i| self.headers()[i].clone()).collect()
    }
}
