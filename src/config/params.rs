// Copyright 2025 Wealthz Project
// SPDX-License-Identifier: AGPL-3.0-or-later

use config::{Config, Environment};
use serde::Deserialize;

use crate::error::NodeError;
use crate::settings::{DuckLakeSettings, PostgresCatalogSettings, StorageSettings};

/// Environment prefix for node settings, e.g. `DUCKLAKE_STORAGE__ACCESS_KEY_ID`.
const ENV_PREFIX: &str = "DUCKLAKE";

/// Nested key delimiter inside environment variable names.
const ENV_SEPARATOR: &str = "__";

/// Raw settings parameters as read from the environment or a settings file.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Params {
    /// Catalog name.
    pub name: String,
    /// Optional setup-script mirror path.
    #[serde(default)]
    pub setup_path: Option<String>,
    /// Object storage parameters.
    pub storage: StorageSettings,
    /// Postgres catalog parameters.
    pub pg: PostgresCatalogSettings,
}

impl Params {
    /// Read parameters from `DUCKLAKE_*` environment variables.
    ///
    /// # Errors
    ///
    /// * `NodeError::Config` - Missing or unparsable variables.
    pub fn from_env() -> Result<Self, NodeError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()
            .map_err(|error| NodeError::Config(format!("Error building config: {}", error)))?;

        config
            .try_deserialize()
            .map_err(|error| NodeError::Config(format!("Error deserializing config: {}", error)))
    }
}

impl From<Params> for DuckLakeSettings {
    fn from(params: Params) -> Self {
        Self {
            name: params.name,
            setup_path: params.setup_path,
            storage: params.storage,
            pg: params.pg,
        }
    }
}

#[cfg(test)]
mod tests {

    use serial_test::serial;

    use super::*;
    use crate::settings::StorageType;

    fn set_required_env() {
        std::env::set_var("DUCKLAKE_NAME", "wealthz");
        std::env::set_var("DUCKLAKE_STORAGE__TYPE", "gcs");
        std::env::set_var("DUCKLAKE_STORAGE__ACCESS_KEY_ID", "key-id");
        std::env::set_var("DUCKLAKE_STORAGE__SECRET_ACCESS_KEY", "key-secret");
        std::env::set_var("DUCKLAKE_STORAGE__DATA_PATH", "gs://bucket/lake");
        std::env::set_var("DUCKLAKE_PG__DBNAME", "catalog");
        std::env::set_var("DUCKLAKE_PG__HOST", "localhost");
        std::env::set_var("DUCKLAKE_PG__USER", "duck");
        std::env::set_var("DUCKLAKE_PG__PASSWORD", "quack");
    }

    fn clear_env() {
        for (key, _) in std::env::vars() {
            if key.starts_with("DUCKLAKE_") {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_from_env_values() {
        set_required_env();
        std::env::set_var("DUCKLAKE_PG__PORT", "5433");
        std::env::set_var("DUCKLAKE_SETUP_PATH", "/tmp/setup.sql");

        let params = Params::from_env().unwrap();

        assert_eq!(params.name, "wealthz");
        assert_eq!(params.storage.kind, StorageType::Gcs);
        assert_eq!(params.storage.data_path, "gs://bucket/lake");
        assert_eq!(params.pg.port, 5433);
        assert_eq!(params.setup_path, Some("/tmp/setup.sql".to_owned()));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        set_required_env();

        let params = Params::from_env().unwrap();

        assert_eq!(params.pg.port, 5432);
        assert_eq!(params.setup_path, None);
        assert_eq!(params.storage.endpoint, None);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_missing_required() {
        clear_env();
        assert!(Params::from_env().is_err());
    }
}
