// Copyright 2025 Wealthz Project
// SPDX-License-Identifier: AGPL-3.0-or-later

//! DuckLake query fetcher. Runs a SQL query on the engine connection, so it
//! does not implement the async [`Fetcher`](super::Fetcher) trait.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use duckdb::types::{TimeUnit, ValueRef};
use duckdb::Connection;

use crate::error::NodeError;
use crate::model::{Cell, EtlPipeline, Frame};

/// Fetches pipeline input from a query against the attached lake.
pub struct DuckLakeFetcher {
    query: String,
}

impl DuckLakeFetcher {
    /// Create a new fetcher for a query.
    pub fn new(query: String) -> Self {
        Self { query }
    }

    /// Run the query and map the result to a frame with the pipeline's
    /// column names, positionally.
    ///
    /// # Errors
    ///
    /// * `NodeError::Fetch` - Query failure, column count mismatch or an
    ///   unsupported column type.
    pub fn fetch(&self, conn: &Connection, pipeline: &EtlPipeline) -> Result<Frame, NodeError> {
        tracing::info!(query = %self.query, "Fetching from lake");

        let mut stmt = conn
            .prepare(&self.query)
            .map_err(|error| NodeError::Fetch(format!("Query failed: {}", error)))?;
        let mut result = stmt
            .query([])
            .map_err(|error| NodeError::Fetch(format!("Query failed: {}", error)))?;

        let width = pipeline.columns.len();
        let mut rows = Vec::new();
        while let Some(row) = result
            .next()
            .map_err(|error| NodeError::Fetch(format!("Query failed: {}", error)))?
        {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                let value = row.get_ref(idx).map_err(|error| {
                    NodeError::Fetch(format!(
                        "Query returned fewer columns than the pipeline expects: {}",
                        error
                    ))
                })?;
                cells.push(cell_from_value(value)?);
            }
            rows.push(cells);
        }

        let columns = pipeline
            .column_names()
            .into_iter()
            .map(str::to_owned)
            .collect();
        Frame::new(columns, rows).map_err(NodeError::Fetch)
    }
}

fn cell_from_value(value: ValueRef<'_>) -> Result<Cell, NodeError> {
    let cell = match value {
        ValueRef::Null => Cell::Null,
        ValueRef::Boolean(b) => Cell::Bool(b),
        ValueRef::TinyInt(v) => Cell::Int(v as i64),
        ValueRef::SmallInt(v) => Cell::Int(v as i64),
        ValueRef::Int(v) => Cell::Int(v as i64),
        ValueRef::BigInt(v) => Cell::Int(v),
        ValueRef::UTinyInt(v) => Cell::Int(v as i64),
        ValueRef::USmallInt(v) => Cell::Int(v as i64),
        ValueRef::UInt(v) => Cell::Int(v as i64),
        ValueRef::UBigInt(v) => Cell::Int(v as i64),
        ValueRef::Float(v) => Cell::Float(v as f64),
        ValueRef::Double(v) => Cell::Float(v),
        ValueRef::Decimal(v) => {
            let parsed = v.to_string().parse::<f64>().map_err(|error| {
                NodeError::Fetch(format!("Unreadable decimal value: {}", error))
            })?;
            Cell::Float(parsed)
        }
        ValueRef::Text(bytes) => Cell::Str(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Date32(days) => Cell::Date(date_from_days(days)?),
        ValueRef::Timestamp(unit, v) => Cell::Timestamp(timestamp_from_unit(unit, v)?),
        other => {
            return Err(NodeError::Fetch(format!(
                "Unsupported column type: {:?}",
                other.data_type()
            )))
        }
    };
    Ok(cell)
}

fn date_from_days(days: i32) -> Result<NaiveDate, NodeError> {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .and_then(|epoch| epoch.checked_add_signed(Duration::days(days as i64)))
        .ok_or_else(|| NodeError::Fetch(format!("Date out of range: {} days", days)))
}

fn timestamp_from_unit(unit: TimeUnit, value: i64) -> Result<NaiveDateTime, NodeError> {
    let (secs, nanos) = match unit {
        TimeUnit::Second => (value, 0u32),
        TimeUnit::Millisecond => (
            value.div_euclid(1_000),
            (value.rem_euclid(1_000) * 1_000_000) as u32,
        ),
        TimeUnit::Microsecond => (
            value.div_euclid(1_000_000),
            (value.rem_euclid(1_000_000) * 1_000) as u32,
        ),
        TimeUnit::Nanosecond => (
            value.div_euclid(1_000_000_000),
            value.rem_euclid(1_000_000_000) as u32,
        ),
    };
    DateTime::from_timestamp(secs, nanos)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| NodeError::Fetch(format!("Timestamp out of range: {}", value)))
}
