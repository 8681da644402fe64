// Copyright 2025 Wealthz Project
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Pipeline definition.
//!
//! Declarative pipeline documents: target table, typed columns with optional
//! transform chains, replication mode, datasource and engine. Documents are
//! authored in YAML and loaded from the configuration directory.
//!

use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use crate::error::NodeError;

/// Default service-account credentials file name inside the secrets directory.
pub const GOOGLE_CREDENTIALS_FILENAME: &str = "google_credentials.json";

/// Column value types.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// UTF-8 string, loaded as VARCHAR.
    String,
    /// 64-bit integer, loaded as BIGINT.
    Integer,
    /// 64-bit float, loaded as DOUBLE.
    Float,
    /// Boolean.
    Boolean,
    /// Calendar date.
    Date,
    /// Date and time, no timezone.
    Timestamp,
}

/// A column-level transform. Applied in declaration order, cell by cell.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
pub enum Transform {
    /// Cast the column to a target type.
    Cast {
        /// Target type for casting.
        target_type: ColumnType,
    },
    /// Trim surrounding whitespace.
    Trim,
    /// Uppercase.
    Upper,
    /// Lowercase.
    Lower,
    /// Replace every match of a regular expression.
    RegexReplace {
        /// Regular expression pattern.
        pattern: String,
        /// Replacement string.
        #[serde(default)]
        replacement: String,
    },
    /// Split on a delimiter and keep one part.
    Split {
        /// Delimiter to split on.
        delimiter: String,
        /// Index of the part to keep; negative counts from the end.
        #[serde(default)]
        index: i64,
    },
    /// Extract a substring by character position.
    Substring {
        /// Start position; negative counts from the end.
        #[serde(default)]
        start: i64,
        /// Length of the substring; to the end when absent.
        #[serde(default)]
        length: Option<i64>,
    },
    /// Parse date strings with an explicit format into a timestamp.
    DateFormat {
        /// chrono format string of the input, e.g. `%d/%m/%Y`.
        input_format: String,
    },
}

/// A target table column.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column type.
    #[serde(rename = "type")]
    pub kind: ColumnType,
    /// Transform chain, applied in order.
    #[serde(default)]
    pub transforms: Vec<Transform>,
}

/// How staged rows reach the target table.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReplicationType {
    /// Insert staged rows.
    Append,
    /// Truncate the target, then insert.
    Full,
    /// Delete rows matching staged primary keys, then insert.
    Incremental,
}

/// Where pipeline data comes from.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Datasource {
    /// A Google Sheets value range.
    Gsheet {
        /// Spreadsheet identifier.
        sheet_id: String,
        /// A1-notation range, e.g. `Transactions!A1:G`.
        sheet_range: String,
        /// Credentials file name inside the secrets directory.
        #[serde(default = "default_credentials_file")]
        credentials_file: String,
    },
    /// A SQL query against the attached DuckLake catalog.
    Ducklake {
        /// Query producing exactly the pipeline's columns, in order.
        query: String,
    },
    /// Daily market data from the Yahoo Finance chart API.
    Yfinance {
        /// Ticker symbol, e.g. `VWRL.AS`.
        symbol: String,
        /// Lookback range, e.g. `1mo`, `1y`, `max`.
        #[serde(default = "default_yfinance_range")]
        range: String,
        /// Bar interval, e.g. `1d`, `1wk`.
        #[serde(default = "default_yfinance_interval")]
        interval: String,
    },
}

fn default_credentials_file() -> String {
    GOOGLE_CREDENTIALS_FILENAME.to_owned()
}

fn default_yfinance_range() -> String {
    "1mo".to_owned()
}

fn default_yfinance_interval() -> String {
    "1d".to_owned()
}

/// Engine types.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EngineType {
    /// Embedded DuckDB with a DuckLake catalog.
    Duckdb,
}

/// Engine selection.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Engine {
    /// Engine type.
    #[serde(rename = "type")]
    pub kind: EngineType,
}

/// A declarative ETL pipeline.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct EtlPipeline {
    /// Target table name.
    pub name: String,
    /// Target columns.
    pub columns: Vec<Column>,
    /// Replication mode.
    pub replication: ReplicationType,
    /// Primary key column names, required for incremental replication.
    #[serde(default)]
    pub primary_keys: Vec<String>,
    /// Engine selection.
    pub engine: Engine,
    /// Datasource.
    pub datasource: Datasource,
}

impl EtlPipeline {
    /// Load a pipeline document from a YAML file.
    ///
    /// # Errors
    ///
    /// * `NodeError::Config` - Unreadable file or invalid document.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, NodeError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|error| {
            NodeError::Config(format!("Error opening pipeline {}: {}", path.display(), error))
        })?;
        serde_yaml::from_reader(file).map_err(|error| {
            NodeError::Config(format!("Error parsing pipeline {}: {}", path.display(), error))
        })
    }

    /// Names of all declared columns, in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    /// Whether any column declares transforms.
    pub fn has_transforms(&self) -> bool {
        self.columns.iter().any(|column| !column.transforms.is_empty())
    }

    /// Validate structural invariants of the pipeline.
    ///
    /// # Errors
    ///
    /// * `NodeError::InvalidParameter` - Empty columns, duplicate column
    ///   names, or incremental replication without valid primary keys.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.columns.is_empty() {
            return Err(NodeError::InvalidParameter(format!(
                "pipeline {} declares no columns",
                self.name
            )));
        }
        let names = self.column_names();
        for (idx, name) in names.iter().enumerate() {
            if names[..idx].contains(name) {
                return Err(NodeError::InvalidParameter(format!(
                    "pipeline {} declares column {} twice",
                    self.name, name
                )));
            }
        }
        if self.replication == ReplicationType::Incremental && self.primary_keys.is_empty() {
            return Err(NodeError::InvalidParameter(format!(
                "pipeline {} uses incremental replication without primary keys",
                self.name
            )));
        }
        for key in &self.primary_keys {
            if !names.contains(&key.as_str()) {
                return Err(NodeError::InvalidParameter(format!(
                    "primary key {} is not a column of pipeline {}",
                    key, self.name
                )));
            }
        }
        Ok(())
    }
}
