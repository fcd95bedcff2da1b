use futures_util::future::join_all;
use serde_json::json;

use crate::client::{FetchError, StockApiClient};
use crate::logging;
use crate::model::{Series, SeriesSet, TickerRegistry};
use crate::simulator::SyntheticMarket;

/// Where ticker lists and price histories come from.
pub enum PriceSource {
    Api(StockApiClient),
    Synthetic(SyntheticMarket),
}

/// Outcome of fetching one window for many tickers.
pub struct WindowFetch {
    pub set: SeriesSet,
    pub failures: Vec<(String, FetchError)>,
}

impl PriceSource {
    pub async fn registry(&self) -> Result<TickerRegistry, FetchError> {
        match self {
            PriceSource::Api(client) => client.fetch_stocks().await,
            PriceSource::Synthetic(market) => Ok(market.registry()),
        }
    }

    pub async fn series(&self, ticker: &str, minutes: u32) -> Result<Series, FetchError> {
        match self {
            PriceSource::Api(client) => client.fetch_series(ticker, minutes).await,
            PriceSource::Synthetic(market) => market.series(ticker, minutes),
        }
    }

    /// Fetch every ticker's window concurrently and wait for all of them.
    ///
    /// A ticker whose request fails stays in the set without a series.
    pub async fn fetch_window(&self, tickers: &[String], minutes: u32) -> WindowFetch {
        logging::info(
            "fetch.start",
            "Fetching price windows",
            json!({ "tickers": tickers.len(), "minutes": minutes }),
        );

        let results = join_all(tickers.iter().map(|ticker| self.series(ticker, minutes))).await;

        let mut set = SeriesSet::new(tickers.to_vec());
        let mut failures = Vec::new();
        for (ticker, result) in tickers.iter().zip(results) {
            match result {
                Ok(series) => set.insert(series),
                Err(err) => {
                    logging::warn(
                        "fetch.failed",
                        "Price window unavailable",
                        json!({ "ticker": ticker, "error": err.to_string() }),
                    );
                    failures.push((ticker.clone(), err));
                }
            }
        }

        logging::info(
            "fetch.done",
            "Price windows fetched",
            json!({ "loaded": set.loaded(), "failed": failures.len() }),
        );
        WindowFetch { set, failures }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::SyntheticConfig;

    #[tokio::test]
    async fn synthetic_window_keeps_failed_tickers_listed() {
        logging::set_silent(true);
        let market = SyntheticMarket::new(SyntheticConfig {
            seed: 9,
            ..SyntheticConfig::default()
        })
        .expect("market");
        let source = PriceSource::Synthetic(market);

        let tickers = vec!["AAPL".to_string(), "NOPE".to_string(), "MSFT".to_string()];
        let fetched = source.fetch_window(&tickers, 20).await;

        assert_eq!(fetched.set.tickers(), tickers.as_slice());
        assert_eq!(fetched.set.loaded(), 2);
        assert_eq!(fetched.failures.len(), 1);
        assert_eq!(fetched.failures[0].0, "NOPE");
    }
}
