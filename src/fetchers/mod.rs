// Copyright 2025 Wealthz Project
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Fetchers module.
//!
//! Datasource fetchers producing frames. Remote fetchers (Google Sheets,
//! Yahoo Finance) implement [`Fetcher`] and are resolved from the pipeline's
//! datasource; the DuckLake fetcher runs on the engine connection instead
//! and lives in [`ducklake`].
//!

#[cfg(feature = "duckdb")]
pub mod ducklake;
pub mod gsheet;
pub mod yfinance;

use std::path::Path;

use async_trait::async_trait;

use crate::error::NodeError;
use crate::model::{Datasource, EtlPipeline, Frame};
use crate::secrets::{GoogleTokenProvider, ServiceAccountKey, SPREADSHEETS_READONLY_SCOPE};

pub use gsheet::GoogleSheetFetcher;
pub use yfinance::YahooFinanceFetcher;

#[cfg(feature = "duckdb")]
pub use ducklake::DuckLakeFetcher;

/// A datasource fetcher.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the datasource into a frame.
    async fn fetch(&self) -> Result<Frame, NodeError>;
}

/// Resolve the pipeline's datasource to a remote fetcher.
///
/// # Errors
///
/// * `NodeError::Secrets` - Credentials cannot be loaded.
/// * `NodeError::InvalidParameter` - The datasource is not a remote one.
pub fn for_pipeline(
    pipeline: &EtlPipeline,
    secrets_dir: &Path,
) -> Result<Box<dyn Fetcher>, NodeError> {
    match &pipeline.datasource {
        Datasource::Gsheet {
            sheet_id,
            sheet_range,
            credentials_file,
        } => {
            let key = ServiceAccountKey::from_file(secrets_dir.join(credentials_file))?;
            let tokens =
                GoogleTokenProvider::new(key, vec![SPREADSHEETS_READONLY_SCOPE.to_owned()]);
            Ok(Box::new(GoogleSheetFetcher::new(
                sheet_id.clone(),
                sheet_range.clone(),
                Box::new(tokens),
            )))
        }
        Datasource::Yfinance {
            symbol,
            range,
            interval,
        } => Ok(Box::new(YahooFinanceFetcher::new(
            symbol.clone(),
            range.clone(),
            interval.clone(),
        ))),
        Datasource::Ducklake { .. } => Err(NodeError::InvalidParameter(
            "ducklake datasources are fetched on the engine connection".to_owned(),
        )),
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::model::{Column, ColumnType, Engine, EngineType, ReplicationType};
    use crate::secrets::tests::TEST_PRIVATE_KEY;

    fn pipeline_with(datasource: Datasource) -> EtlPipeline {
        EtlPipeline {
            name: "positions".to_owned(),
            columns: vec![Column {
                name: "id".to_owned(),
                kind: ColumnType::Integer,
                transforms: vec![],
            }],
            replication: ReplicationType::Append,
            primary_keys: vec![],
            engine: Engine {
                kind: EngineType::Duckdb,
            },
            datasource,
        }
    }

    #[test]
    fn test_for_pipeline_gsheet_loads_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let creds = serde_json::json!({
            "client_email": "etl@project.iam.gserviceaccount.com",
            "private_key": TEST_PRIVATE_KEY,
            "token_uri": "https://oauth2.googleapis.com/token"
        });
        std::fs::write(dir.path().join("google_credentials.json"), creds.to_string()).unwrap();

        let pipeline = pipeline_with(Datasource::Gsheet {
            sheet_id: "sheet-1".to_owned(),
            sheet_range: "A1:B".to_owned(),
            credentials_file: "google_credentials.json".to_owned(),
        });
        assert!(for_pipeline(&pipeline, dir.path()).is_ok());
    }

    #[test]
    fn test_for_pipeline_gsheet_missing_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline_with(Datasource::Gsheet {
            sheet_id: "sheet-1".to_owned(),
            sheet_range: "A1:B".to_owned(),
            credentials_file: "google_credentials.json".to_owned(),
        });
        let result = for_pipeline(&pipeline, dir.path());
        assert!(matches!(result, Err(NodeError::Secrets(_))));
    }

    #[test]
    fn test_for_pipeline_ducklake_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline_with(Datasource::Ducklake {
            query: "SELECT 1".to_owned(),
        });
        let result = for_pipeline(&pipeline, dir.path());
        assert!(matches!(result, Err(NodeError::InvalidParameter(_))));
    }
}
