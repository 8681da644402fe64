// Copyright 2025 Wealthz Project
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Frame.
//!
//! In-memory tabular data exchanged between fetchers, the transform engine
//! and the loader. Sized for sheet-scale batches, not columnar analytics.
//!

use chrono::{NaiveDate, NaiveDateTime};

/// A single typed cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Missing value.
    Null,
    /// UTF-8 string.
    Str(String),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit float.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Calendar date.
    Date(NaiveDate),
    /// Date and time, no timezone.
    Timestamp(NaiveDateTime),
}

impl Cell {
    /// Render the cell as a SQL-bindable string, `None` for null.
    /// Dates and timestamps use formats DuckDB casts back implicitly.
    pub fn to_param(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Str(s) => Some(s.clone()),
            Cell::Int(i) => Some(i.to_string()),
            Cell::Float(f) => Some(f.to_string()),
            Cell::Bool(b) => Some(b.to_string()),
            Cell::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Cell::Timestamp(ts) => Some(ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()),
        }
    }

    /// Whether the cell is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

/// A named-column, row-major frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Frame {
    /// Create a frame from column names and rows.
    ///
    /// # Errors
    ///
    /// * `Err(String)` if a row's width differs from the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, String> {
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(format!(
                    "row {} has {} cells, expected {}",
                    idx,
                    row.len(),
                    columns.len()
                ));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Create an empty frame with the given column names.
    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a frame from raw string records. Short rows are padded with
    /// nulls and long rows truncated to the header width (Google Sheets
    /// omits trailing empty cells).
    pub fn from_records(columns: Vec<String>, records: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = records
            .into_iter()
            .map(|record| {
                let mut row: Vec<Cell> = record.into_iter().take(width).map(Cell::Str).collect();
                row.resize(width, Cell::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Whether the frame holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_from_records_pads_and_truncates() {
        let frame = Frame::from_records(
            vec!["a".to_owned(), "b".to_owned()],
            vec![
                vec!["1".to_owned()],
                vec!["2".to_owned(), "x".to_owned(), "extra".to_owned()],
            ],
        );
        assert_eq!(frame.num_rows(), 2);
        assert_eq!(frame.rows()[0], vec![Cell::Str("1".to_owned()), Cell::Null]);
        assert_eq!(
            frame.rows()[1],
            vec![Cell::Str("2".to_owned()), Cell::Str("x".to_owned())]
        );
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        let result = Frame::new(
            vec!["a".to_owned()],
            vec![vec![Cell::Int(1), Cell::Int(2)]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_column_index() {
        let frame = Frame::empty(vec!["id".to_owned(), "name".to_owned()]);
        assert_eq!(frame.column_index("name"), Some(1));
        assert_eq!(frame.column_index("missing"), None);
    }

    #[test]
    fn test_cell_to_param() {
        assert_eq!(Cell::Null.to_param(), None);
        assert_eq!(Cell::Int(42).to_param(), Some("42".to_owned()));
        assert_eq!(Cell::Bool(true).to_param(), Some("true".to_owned()));
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(Cell::Date(date).to_param(), Some("2024-03-01".to_owned()));
    }
}
