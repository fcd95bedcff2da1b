use std::time::Duration;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::constants::{API_BASE_URL, REQUEST_TIMEOUT_SECS};
use crate::logging;
use crate::model::{PricePoint, Series, TickerRegistry};

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: API_BASE_URL.to_string(),
            auth_token: None,
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Failures of the price data source. None of these reach the statistics.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Authentication token is missing.")]
    MissingToken,

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to connect to the stock API at {url}. Error details: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(
        "Failed to connect to the stock API at {url}. Error details: HTTP error! Status: {status}. Message: {message}"
    )]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    #[error("Failed to connect to the stock API at {url}. Error details: unexpected response body: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unknown ticker {0}")]
    UnknownTicker(String),
}

#[derive(Deserialize)]
struct StocksResponse {
    stocks: TickerRegistry,
}

/// The price endpoint answers with a history array, or with the current
/// price alone when the window holds a single point.
#[derive(Deserialize)]
#[serde(untagged)]
enum PriceResponse {
    History(Vec<PricePoint>),
    Current { stock: PricePoint },
}

impl PriceResponse {
    fn into_points(self) -> Vec<PricePoint> {
        match self {
            PriceResponse::History(points) => points,
            PriceResponse::Current { stock } => vec![stock],
        }
    }
}

/// HTTP client for the stock evaluation service.
#[derive(Clone, Debug)]
pub struct StockApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl StockApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, FetchError> {
        let token = config
            .auth_token
            .filter(|token| !token.trim().is_empty())
            .ok_or(FetchError::MissingToken)?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub async fn fetch_stocks(&self) -> Result<TickerRegistry, FetchError> {
        let url = format!("{}/stocks", self.base_url);
        let response: StocksResponse = self.get_json(&url).await?;
        logging::info(
            "fetch.stocks",
            "Ticker registry loaded",
            json!({ "tickers": response.stocks.len() }),
        );
        Ok(response.stocks)
    }

    pub async fn fetch_series(&self, ticker: &str, minutes: u32) -> Result<Series, FetchError> {
        let url = format!("{}/stocks/{ticker}?minutes={minutes}", self.base_url);
        let response: PriceResponse = self.get_json(&url).await?;
        Ok(Series::new(ticker, response.into_points()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                message: status_message(status, &body),
            });
        }

        response.json().await.map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

fn status_message(status: StatusCode, body: &str) -> String {
    if let Some(reason) = status.canonical_reason() {
        return reason.to_string();
    }
    if !body.trim().is_empty() {
        return body.trim().to_string();
    }
    "No response body".to_string()
}
