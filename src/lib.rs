// Copyright 2025 Wealthz Project
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Wealthz
//!
//! Declarative ETL pipelines into a DuckLake lakehouse. Pipelines are YAML
//! documents naming a datasource (Google Sheets, Yahoo Finance or a lake
//! query), typed columns with optional transform chains, and a replication
//! mode. The node fetches the datasource, applies the transforms and loads
//! the result into the lake through DuckDB.
//!

pub mod config;
#[cfg(feature = "duckdb")]
pub mod database;
pub mod error;
pub mod fetchers;
pub mod model;
#[cfg(feature = "duckdb")]
pub mod node;
pub mod secrets;
pub mod settings;
pub mod transforms;

pub use error::NodeError;
#[cfg(feature = "duckdb")]
pub use node::{DuckLakeNode, PipelineReport};
