// Copyright 2025 Wealthz Project
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Yahoo Finance chart fetcher.

use chrono::DateTime;
use serde::Deserialize;

use crate::error::NodeError;
use crate::model::{Cell, Frame};

use super::Fetcher;

/// Yahoo Finance API base URL.
pub const YAHOO_API_BASE: &str = "https://query1.finance.yahoo.com";

const USER_AGENT: &str = concat!("wealthz/", env!("CARGO_PKG_VERSION"));

/// Columns of a market data frame.
const MARKET_COLUMNS: [&str; 7] = [
    "timestamp", "open", "high", "low", "close", "volume", "symbol",
];

/// Fetches OHLCV candles from the Yahoo Finance chart endpoint.
pub struct YahooFinanceFetcher {
    symbol: String,
    range: String,
    interval: String,
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Deserialize)]
struct Chart {
    #[serde(default)]
    result: Vec<ChartResult>,
}

#[derive(Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Deserialize, Default)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Deserialize, Default)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

impl YahooFinanceFetcher {
    /// Create a new fetcher for a symbol.
    pub fn new(symbol: String, range: String, interval: String) -> Self {
        Self {
            symbol,
            range,
            interval,
            client: reqwest::Client::new(),
            base_url: YAHOO_API_BASE.to_owned(),
        }
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn rows(&self, result: ChartResult) -> Vec<Vec<Cell>> {
        let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
        result
            .timestamp
            .iter()
            .enumerate()
            .map(|(idx, epoch)| {
                vec![
                    DateTime::from_timestamp(*epoch, 0)
                        .map(|dt| Cell::Timestamp(dt.naive_utc()))
                        .unwrap_or(Cell::Null),
                    float_cell(&quote.open, idx),
                    float_cell(&quote.high, idx),
                    float_cell(&quote.low, idx),
                    float_cell(&quote.close, idx),
                    int_cell(&quote.volume, idx),
                    Cell::Str(self.symbol.clone()),
                ]
            })
            .collect()
    }
}

fn float_cell(values: &[Option<f64>], idx: usize) -> Cell {
    match values.get(idx).copied().flatten() {
        Some(value) => Cell::Float(value),
        None => Cell::Null,
    }
}

fn int_cell(values: &[Option<i64>], idx: usize) -> Cell {
    match values.get(idx).copied().flatten() {
        Some(value) => Cell::Int(value),
        None => Cell::Null,
    }
}

#[async_trait::async_trait]
impl Fetcher for YahooFinanceFetcher {
    async fn fetch(&self) -> Result<Frame, NodeError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, self.symbol);

        tracing::info!(
            symbol = %self.symbol,
            range = %self.range,
            interval = %self.interval,
            "Fetching market data"
        );

        let response = self
            .client
            .get(&url)
            .query(&[("range", &self.range), ("interval", &self.interval)])
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|error| NodeError::Fetch(format!("Chart request failed: {}", error)))?;

        if !response.status().is_success() {
            return Err(NodeError::Fetch(format!(
                "Chart request failed with status {}",
                response.status()
            )));
        }

        let chart: ChartResponse = response
            .json()
            .await
            .map_err(|error| NodeError::Fetch(format!("Invalid chart response: {}", error)))?;

        let columns: Vec<String> = MARKET_COLUMNS.iter().map(|c| (*c).to_owned()).collect();
        let Some(result) = chart.chart.result.into_iter().next() else {
            tracing::warn!(symbol = %self.symbol, "Chart returned no result");
            return Ok(Frame::empty(columns));
        };

        Frame::new(columns, self.rows(result)).map_err(NodeError::Fetch)
    }
}

#[cfg(test)]
mod tests {

    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fetcher(base_url: String) -> YahooFinanceFetcher {
        YahooFinanceFetcher::new("VWCE.DE".to_owned(), "5d".to_owned(), "1d".to_owned())
            .with_base_url(base_url)
    }

    #[tokio::test]
    async fn test_fetch_candles() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "chart": {
                "result": [{
                    "timestamp": [1717977600, 1718064000],
                    "indicators": {
                        "quote": [{
                            "open": [110.1, null],
                            "high": [111.0, 112.2],
                            "low": [109.5, 110.8],
                            "close": [110.9, 112.0],
                            "volume": [120500, null]
                        }]
                    }
                }],
                "error": null
            }
        });
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/VWCE.DE"))
            .and(query_param("range", "5d"))
            .and(query_param("interval", "1d"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let frame = fetcher(server.uri()).fetch().await.unwrap();
        assert_eq!(
            frame.columns(),
            &["timestamp", "open", "high", "low", "close", "volume", "symbol"]
        );
        assert_eq!(frame.num_rows(), 2);
        assert_eq!(frame.rows()[0][1], Cell::Float(110.1));
        assert_eq!(frame.rows()[1][1], Cell::Null);
        assert_eq!(frame.rows()[0][5], Cell::Int(120500));
        assert_eq!(frame.rows()[1][6], Cell::Str("VWCE.DE".to_owned()));
        assert!(matches!(frame.rows()[0][0], Cell::Timestamp(_)));
    }

    #[tokio::test]
    async fn test_fetch_empty_result() {
        let server = MockServer::start().await;
        let body = serde_json::json!({ "chart": { "result": [], "error": null } });
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let frame = fetcher(server.uri()).fetch().await.unwrap();
        assert!(frame.is_empty());
        assert_eq!(frame.columns().len(), 7);
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let result = fetcher(server.uri()).fetch().await;
        assert!(matches!(result, Err(NodeError::Fetch(_))));
    }
}
