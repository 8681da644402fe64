// Copyright 2025 Wealthz Project
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Node settings.
//!
//! Runtime settings for the DuckLake engine: object storage, the Postgres
//! catalog and the optional setup-script mirror. Built from the environment
//! and/or a settings file by [`crate::config::build_settings`].
//!

use serde::Deserialize;

/// Object storage backing the DuckLake data path.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Google Cloud Storage, HMAC keys.
    Gcs,
    /// S3-compatible storage.
    S3,
}

/// Object storage settings.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct StorageSettings {
    /// Storage backend.
    #[serde(rename = "type")]
    pub kind: StorageType,
    /// Access key identifier.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Data path the catalog writes table files under, e.g. `gs://bucket/lake`.
    pub data_path: String,
    /// Endpoint override for S3-compatible stores.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Region for S3.
    #[serde(default)]
    pub region: Option<String>,
    /// URL style for S3, `path` or `vhost`.
    #[serde(default)]
    pub url_style: Option<String>,
    /// Whether to use SSL for S3.
    #[serde(default)]
    pub use_ssl: Option<bool>,
}

/// Postgres catalog settings for DuckLake metadata.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PostgresCatalogSettings {
    /// Database name.
    pub dbname: String,
    /// Host.
    pub host: String,
    /// Port.
    #[serde(default = "default_pg_port")]
    pub port: u16,
    /// User.
    pub user: String,
    /// Password.
    pub password: String,
}

fn default_pg_port() -> u16 {
    5432
}

impl PostgresCatalogSettings {
    /// Render the libpq-style connection string used by ATTACH.
    pub fn connection(&self) -> String {
        format!(
            "dbname={} host={} port={} user={} password={}",
            self.dbname, self.host, self.port, self.user, self.password
        )
    }
}

/// Settings for a DuckLake-backed node.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct DuckLakeSettings {
    /// Lake alias used by ATTACH and USE.
    pub name: String,
    /// Optional path to mirror every setup statement into.
    #[serde(default)]
    pub setup_path: Option<String>,
    /// Object storage settings.
    pub storage: StorageSettings,
    /// Postgres catalog settings.
    pub pg: PostgresCatalogSettings,
}

#[cfg(test)]
impl Default for DuckLakeSettings {
    fn default() -> Self {
        Self {
            name: "wealthz".to_owned(),
            setup_path: None,
            storage: StorageSettings {
                kind: StorageType::Gcs,
                access_key_id: "key-id".to_owned(),
                secret_access_key: "key-secret".to_owned(),
                data_path: "gs://bucket/lake".to_owned(),
                endpoint: None,
                region: None,
                url_style: None,
                use_ssl: None,
            },
            pg: PostgresCatalogSettings {
                dbname: "catalog".to_owned(),
                host: "localhost".to_owned(),
                port: 5432,
                user: "duck".to_owned(),
                password: "quack".to_owned(),
            },
        }
    }
}
