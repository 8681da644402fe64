// Copyright 2025 Wealthz Project
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Database module.
//!
//! DuckLake provisioning and loading. The connection manager opens an
//! in-memory DuckDB session, installs the ducklake and postgres extensions,
//! registers object storage credentials and attaches the lake catalog. The
//! loader stages frames and replicates them into lake tables.
//!

mod ducklake;
mod loader;

pub use ducklake::DuckLakeConnManager;
pub use loader::{DuckLakeLoader, SchemaSyncer};
