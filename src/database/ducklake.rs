// Copyright 2025 Wealthz Project
// SPDX-License-Identifier: AGPL-3.0-or-later

use duckdb::Connection;

use crate::error::NodeError;
use crate::settings::{DuckLakeSettings, StorageSettings, StorageType};

/// Provisions DuckDB connections attached to the lake.
pub struct DuckLakeConnManager {
    settings: DuckLakeSettings,
}

impl DuckLakeConnManager {
    /// Create a new manager from node settings.
    pub fn new(settings: DuckLakeSettings) -> Self {
        Self { settings }
    }

    /// The SQL statements that provision a session: extension installs,
    /// storage credentials, catalog attach.
    pub fn setup_statements(&self) -> Vec<String> {
        let mut statements = vec![
            "INSTALL ducklake FROM core_nightly".to_owned(),
            "LOAD ducklake".to_owned(),
            "INSTALL postgres FROM core".to_owned(),
            "LOAD postgres".to_owned(),
        ];
        statements.extend(storage_statements(&self.settings.storage));
        statements.push(format!(
            "ATTACH 'ducklake:postgres:{}' AS {} (DATA_PATH '{}')",
            self.settings.pg.connection(),
            self.settings.name,
            self.settings.storage.data_path
        ));
        statements.push(format!("USE {}", self.settings.name));
        statements
    }

    /// Open an in-memory connection and run the setup statements. When a
    /// setup path is configured, the statements are also written there for
    /// inspection with the DuckDB CLI.
    ///
    /// # Errors
    ///
    /// * `NodeError::Database` - Connection or setup statement failure.
    pub fn provision(&self) -> Result<Connection, NodeError> {
        let conn = Connection::open_in_memory()
            .map_err(|error| NodeError::Database(format!("Error opening DuckDB: {}", error)))?;

        let version: String = conn
            .query_row("SELECT version()", [], |row| row.get(0))
            .map_err(|error| NodeError::Database(format!("Error reading version: {}", error)))?;
        tracing::info!(version = %version, lake = %self.settings.name, "Provisioning DuckLake");

        let statements = self.setup_statements();
        if let Some(path) = &self.settings.setup_path {
            self.write_setup_script(path, &statements)?;
        }

        for statement in &statements {
            conn.execute_batch(statement).map_err(|error| {
                NodeError::Database(format!("Setup statement failed: {}", error))
            })?;
        }

        Ok(conn)
    }

    fn write_setup_script(&self, path: &str, statements: &[String]) -> Result<(), NodeError> {
        let script = statements
            .iter()
            .map(|s| format!("{};\n", s))
            .collect::<String>();
        std::fs::write(path, script)
            .map_err(|error| NodeError::Database(format!("Error writing setup script: {}", error)))
    }
}

fn storage_statements(storage: &StorageSettings) -> Vec<String> {
    match storage.kind {
        StorageType::Gcs => vec![format!(
            "CREATE OR REPLACE SECRET gcs_secret (TYPE gcs, KEY_ID '{}', SECRET '{}')",
            storage.access_key_id, storage.secret_access_key
        )],
        StorageType::S3 => {
            let mut statements = vec![
                format!("SET s3_access_key_id='{}'", storage.access_key_id),
                format!("SET s3_secret_access_key='{}'", storage.secret_access_key),
            ];
            if let Some(endpoint) = &storage.endpoint {
                statements.push(format!("SET s3_endpoint='{}'", endpoint));
            }
            if let Some(region) = &storage.region {
                statements.push(format!("SET s3_region='{}'", region));
            }
            if let Some(url_style) = &storage.url_style {
                statements.push(format!("SET s3_url_style='{}'", url_style));
            }
            if let Some(use_ssl) = storage.use_ssl {
                statements.push(format!("SET s3_use_ssl={}", use_ssl));
            }
            statements
        }
    }
}
