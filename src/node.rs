// Copyright 2025 Wealthz Project
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # DuckLake node.
//!
//! Runs a pipeline end to end: provision the engine connection, fetch the
//! datasource, apply column transforms, load into the target table.
//!

use std::path::PathBuf;

use duckdb::Connection;

use crate::database::{DuckLakeConnManager, DuckLakeLoader, SchemaSyncer};
use crate::error::NodeError;
use crate::fetchers::{self, DuckLakeFetcher};
use crate::model::{Datasource, EtlPipeline, Frame};
use crate::settings::DuckLakeSettings;
use crate::transforms::TransformEngine;

/// Outcome of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Pipeline name.
    pub pipeline: String,
    /// Rows fetched from the datasource.
    pub fetched_rows: usize,
    /// Rows loaded into the target table.
    pub loaded_rows: usize,
}

/// A node that runs ETL pipelines against a DuckLake catalog.
pub struct DuckLakeNode {
    settings: DuckLakeSettings,
    secrets_dir: PathBuf,
}

impl DuckLakeNode {
    /// Create a new node.
    pub fn new(settings: DuckLakeSettings, secrets_dir: PathBuf) -> Self {
        Self {
            settings,
            secrets_dir,
        }
    }

    /// Validate the pipeline, provision a lake connection and run the
    /// pipeline on it.
    ///
    /// # Errors
    ///
    /// Any `NodeError` raised by validation, provisioning, fetching,
    /// transforming or loading.
    pub async fn run(&self, pipeline: &EtlPipeline) -> Result<PipelineReport, NodeError> {
        pipeline.validate()?;
        let conn = DuckLakeConnManager::new(self.settings.clone()).provision()?;
        self.execute(&conn, pipeline).await
    }

    /// Run a validated pipeline on an existing connection.
    pub async fn execute(
        &self,
        conn: &Connection,
        pipeline: &EtlPipeline,
    ) -> Result<PipelineReport, NodeError> {
        tracing::info!(pipeline = %pipeline.name, "Running pipeline");
        SchemaSyncer::sync(conn, pipeline)?;

        let frame = self.fetch(conn, pipeline).await?;
        let fetched_rows = frame.num_rows();
        if frame.is_empty() {
            tracing::warn!(pipeline = %pipeline.name, "Datasource returned no rows");
            return Ok(PipelineReport {
                pipeline: pipeline.name.clone(),
                fetched_rows,
                loaded_rows: 0,
            });
        }

        if pipeline.has_transforms() {
            tracing::info!(pipeline = %pipeline.name, "Applying column transforms");
        }
        let frame = TransformEngine::apply(&frame, &pipeline.columns)?;

        let loaded_rows = DuckLakeLoader::load(conn, &frame, pipeline)?;
        tracing::info!(
            pipeline = %pipeline.name,
            fetched_rows,
            loaded_rows,
            "Pipeline finished"
        );

        Ok(PipelineReport {
            pipeline: pipeline.name.clone(),
            fetched_rows,
            loaded_rows,
        })
    }

    async fn fetch(&self, conn: &Connection, pipeline: &EtlPipeline) -> Result<Frame, NodeError> {
        match &pipeline.datasource {
            Datasource::Ducklake { query } => {
                DuckLakeFetcher::new(query.clone()).fetch(conn, pipeline)
            }
            _ => {
                let fetcher = fetchers::for_pipeline(pipeline, &self.secrets_dir)?;
                fetcher.fetch().await
            }
        }
    }
}
