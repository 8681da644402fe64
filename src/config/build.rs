// Copyright 2025 Wealthz Project
// SPDX-License-Identifier: AGPL-3.0-or-later

use config::{Config, Environment};

use crate::error::NodeError;
use crate::settings::DuckLakeSettings;

use super::params::Params;

/// Build node settings from the environment and an optional settings file
/// (JSON, YAML or TOML). Environment variables override file values.
///
/// # Errors
///
/// * `NodeError::Config` - Unreadable file or missing/unparsable values.
pub fn build_settings(env: bool, file: &str) -> Result<DuckLakeSettings, NodeError> {
    let mut builder = Config::builder();

    if !file.is_empty() {
        builder = builder.add_source(config::File::with_name(file));
    }

    if env {
        builder = builder.add_source(
            Environment::with_prefix("DUCKLAKE")
                .separator("__")
                .try_parsing(true),
        );
    }

    let config = builder
        .build()
        .map_err(|error| NodeError::Config(format!("Error building config: {}", error)))?;

    let params: Params = config
        .try_deserialize()
        .map_err(|error| NodeError::Config(format!("Error deserializing config: {}", error)))?;

    Ok(DuckLakeSettings::from(params))
}
