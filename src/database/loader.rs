// Copyright 2025 Wealthz Project
// SPDX-License-Identifier: AGPL-3.0-or-later

use duckdb::{params_from_iter, Connection};

use crate::error::NodeError;
use crate::model::{Column, ColumnType, EtlPipeline, Frame, ReplicationType};

/// DuckDB type for a pipeline column type.
fn sql_type(kind: ColumnType) -> &'static str {
    match kind {
        ColumnType::String => "VARCHAR",
        ColumnType::Integer => "BIGINT",
        ColumnType::Float => "DOUBLE",
        ColumnType::Boolean => "BOOLEAN",
        ColumnType::Date => "DATE",
        ColumnType::Timestamp => "TIMESTAMP",
    }
}

fn cast_expr(column: &Column) -> String {
    format!(
        "CAST({} AS {}) AS {}",
        column.name,
        sql_type(column.kind),
        column.name
    )
}

/// Creates pipeline target tables.
pub struct SchemaSyncer;

impl SchemaSyncer {
    /// The CREATE TABLE statement for a pipeline's target table.
    pub fn create_table_sql(pipeline: &EtlPipeline) -> String {
        let columns = pipeline
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, sql_type(c.kind)))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            pipeline.name, columns
        )
    }

    /// Ensure the pipeline's target table exists.
    ///
    /// # Errors
    ///
    /// * `NodeError::Database` - Statement failure.
    pub fn sync(conn: &Connection, pipeline: &EtlPipeline) -> Result<(), NodeError> {
        conn.execute_batch(&Self::create_table_sql(pipeline))
            .map_err(|error| NodeError::Database(format!("Error syncing schema: {}", error)))
    }
}

/// Loads frames into lake tables through an all-VARCHAR staging table, so
/// typing happens once, in SQL, at insert time.
pub struct DuckLakeLoader;

impl DuckLakeLoader {
    /// Load a frame into the pipeline's target table inside a transaction.
    /// Returns the number of rows inserted.
    ///
    /// # Errors
    ///
    /// * `NodeError::Database` - Any statement failure. The transaction is
    ///   rolled back before the error is returned.
    pub fn load(
        conn: &Connection,
        frame: &Frame,
        pipeline: &EtlPipeline,
    ) -> Result<usize, NodeError> {
        conn.execute_batch("BEGIN")
            .map_err(|error| NodeError::Database(format!("Error starting load: {}", error)))?;

        match Self::replicate(conn, frame, pipeline) {
            Ok(inserted) => {
                conn.execute_batch("COMMIT").map_err(|error| {
                    NodeError::Database(format!("Error committing load: {}", error))
                })?;
                Ok(inserted)
            }
            Err(error) => {
                // Best effort, the original error is the one to surface.
                let _ = conn.execute_batch("ROLLBACK");
                Err(error)
            }
        }
    }

    fn replicate(
        conn: &Connection,
        frame: &Frame,
        pipeline: &EtlPipeline,
    ) -> Result<usize, NodeError> {
        let staging = format!("{}_staging", pipeline.name);
        Self::stage(conn, frame, pipeline, &staging)?;

        match pipeline.replication {
            ReplicationType::Append => {}
            ReplicationType::Full => {
                conn.execute(&format!("DELETE FROM {}", pipeline.name), [])
                    .map_err(|error| {
                        NodeError::Database(format!("Error truncating table: {}", error))
                    })?;
            }
            ReplicationType::Incremental => {
                conn.execute(&Self::delete_matching_sql(pipeline, &staging), [])
                    .map_err(|error| {
                        NodeError::Database(format!("Error deleting matched rows: {}", error))
                    })?;
            }
        }

        conn.execute(&Self::insert_sql(pipeline, &staging), [])
            .map_err(|error| NodeError::Database(format!("Error inserting rows: {}", error)))
    }

    fn stage(
        conn: &Connection,
        frame: &Frame,
        pipeline: &EtlPipeline,
        staging: &str,
    ) -> Result<(), NodeError> {
        let columns = pipeline
            .columns
            .iter()
            .map(|c| format!("{} VARCHAR", c.name))
            .collect::<Vec<_>>()
            .join(", ");
        conn.execute_batch(&format!(
            "CREATE OR REPLACE TEMP TABLE {} ({})",
            staging, columns
        ))
        .map_err(|error| NodeError::Database(format!("Error creating staging: {}", error)))?;

        let placeholders = vec!["?"; pipeline.columns.len()].join(", ");
        let mut stmt = conn
            .prepare(&format!("INSERT INTO {} VALUES ({})", staging, placeholders))
            .map_err(|error| NodeError::Database(format!("Error preparing staging: {}", error)))?;
        for row in frame.rows() {
            stmt.execute(params_from_iter(row.iter().map(|cell| cell.to_param())))
                .map_err(|error| {
                    NodeError::Database(format!("Error staging row: {}", error))
                })?;
        }
        Ok(())
    }

    /// The typed INSERT ... SELECT from staging into the target table.
    pub fn insert_sql(pipeline: &EtlPipeline, staging: &str) -> String {
        let names = pipeline.column_names().join(", ");
        let casts = pipeline
            .columns
            .iter()
            .map(cast_expr)
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({}) SELECT {} FROM {}",
            pipeline.name, names, casts, staging
        )
    }

    /// The DELETE that clears target rows whose primary keys appear in
    /// staging, ahead of an incremental insert. Both key tuples follow the
    /// pipeline's primary-key order.
    pub fn delete_matching_sql(pipeline: &EtlPipeline, staging: &str) -> String {
        let (keys, casts): (Vec<&str>, Vec<String>) = pipeline
            .primary_keys
            .iter()
            .filter_map(|key| pipeline.columns.iter().find(|c| &c.name == key))
            .map(|c| {
                (
                    c.name.as_str(),
                    format!("CAST({} AS {})", c.name, sql_type(c.kind)),
                )
            })
            .unzip();
        format!(
            "DELETE FROM {} WHERE ({}) IN (SELECT ({}) FROM {})",
            pipeline.name,
            keys.join(", "),
            casts.join(", "),
            staging
        )
    }
}
