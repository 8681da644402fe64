// Copyright 2025 Wealthz Project
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Google Sheets fetcher.

use serde::Deserialize;

use crate::error::NodeError;
use crate::model::Frame;
use crate::secrets::TokenProvider;

use super::Fetcher;

/// Google Sheets API base URL.
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

/// Fetches a sheet range through the Sheets `values.get` endpoint. The first
/// row of the range is taken as the header row.
pub struct GoogleSheetFetcher {
    sheet_id: String,
    sheet_range: String,
    tokens: Box<dyn TokenProvider>,
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl GoogleSheetFetcher {
    /// Create a new fetcher for a sheet range.
    pub fn new(sheet_id: String, sheet_range: String, tokens: Box<dyn TokenProvider>) -> Self {
        Self {
            sheet_id,
            sheet_range,
            tokens,
            client: reqwest::Client::new(),
            base_url: SHEETS_API_BASE.to_owned(),
        }
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn values_url(&self) -> Result<reqwest::Url, NodeError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|error| NodeError::Fetch(format!("Invalid Sheets base URL: {}", error)))?;
        url.path_segments_mut()
            .map_err(|_| NodeError::Fetch("Invalid Sheets base URL".to_owned()))?
            .extend([
                "v4",
                "spreadsheets",
                &self.sheet_id,
                "values",
                &self.sheet_range,
            ]);
        Ok(url)
    }
}

/// Render a sheet cell as text. Strings keep their content, any other JSON
/// scalar keeps its literal rendering.
fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait::async_trait]
impl Fetcher for GoogleSheetFetcher {
    async fn fetch(&self) -> Result<Frame, NodeError> {
        let token = self.tokens.access_token().await?;
        let url = self.values_url()?;

        tracing::info!(
            sheet_id = %self.sheet_id,
            range = %self.sheet_range,
            "Fetching sheet range"
        );

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|error| NodeError::Fetch(format!("Sheets request failed: {}", error)))?;

        if !response.status().is_success() {
            return Err(NodeError::Fetch(format!(
                "Sheets request failed with status {}",
                response.status()
            )));
        }

        let value_range: ValueRange = response
            .json()
            .await
            .map_err(|error| NodeError::Fetch(format!("Invalid Sheets response: {}", error)))?;

        let mut values = value_range.values.into_iter();
        let Some(header) = values.next() else {
            tracing::warn!(sheet_id = %self.sheet_id, "Sheet range returned no values");
            return Ok(Frame::empty(vec![]));
        };

        let columns: Vec<String> = header.iter().map(cell_text).collect();
        let records: Vec<Vec<String>> = values
            .map(|row| row.iter().map(cell_text).collect())
            .collect();

        Ok(Frame::from_records(columns, records))
    }
}
