//! Offline price source: correlated random walks sampled on a minute grid.
//!
//! Each ticker misses some minutes at random, so different tickers share
//! only part of their timestamps, like the live service.

mod factors;

use anyhow::Result;
use chrono::{DateTime, Duration, DurationRound, Utc};
use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde_json::json;

use crate::client::FetchError;
use crate::constants::SYNTHETIC_SEED;
use crate::logging;
use crate::model::{PricePoint, Series, TickerRegistry};

use factors::FactorModel;

const GROUPS: usize = 4;
const MINUTE_VOLATILITY: f64 = 0.004;

#[derive(Clone, Debug)]
pub struct SyntheticTicker {
    pub name: String,
    pub symbol: String,
    pub group: usize,
}

impl SyntheticTicker {
    pub fn new(name: &str, symbol: &str, group: usize) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            group,
        }
    }
}

pub fn default_tickers() -> Vec<SyntheticTicker> {
    vec![
        SyntheticTicker::new("Nvidia Corporation", "NVDA", 0),
        SyntheticTicker::new("Advanced Micro Devices, Inc.", "AMD", 0),
        SyntheticTicker::new("Apple Inc.", "AAPL", 1),
        SyntheticTicker::new("Microsoft Corporation", "MSFT", 1),
        SyntheticTicker::new("Alphabet Inc. Class A", "GOOGL", 1),
        SyntheticTicker::new("Meta Platforms, Inc.", "META", 1),
        SyntheticTicker::new("Amazon.com, Inc.", "AMZN", 2),
        SyntheticTicker::new("Tesla, Inc.", "TSLA", 2),
        SyntheticTicker::new("PayPal Holdings, Inc.", "PYPL", 3),
        SyntheticTicker::new("Visa Inc.", "V", 3),
    ]
}

#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    pub seed: u64,
    /// Timestamp of the newest minute in every window.
    pub anchor: DateTime<Utc>,
    /// Probability that a ticker reports a price in a given minute.
    pub observation_rate: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            seed: SYNTHETIC_SEED,
            anchor: now.duration_trunc(Duration::minutes(1)).unwrap_or(now),
            observation_rate: 0.75,
        }
    }
}

pub struct SyntheticMarket {
    config: SyntheticConfig,
    tickers: Vec<SyntheticTicker>,
    initial_prices: Vec<f64>,
    model: FactorModel,
}

impl SyntheticMarket {
    pub fn new(config: SyntheticConfig) -> Result<Self> {
        Self::with_tickers(config, default_tickers())
    }

    pub fn with_tickers(config: SyntheticConfig, tickers: Vec<SyntheticTicker>) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let model = FactorModel::new(&tickers, GROUPS, &mut rng)?;
        let initial_prices = tickers
            .iter()
            .map(|_| rng.gen_range(80.0..650.0))
            .collect();

        logging::info(
            "synthetic.ready",
            "Synthetic market initialised",
            json!({ "tickers": tickers.len(), "seed": config.seed }),
        );

        Ok(Self {
            config,
            tickers,
            initial_prices,
            model,
        })
    }

    pub fn registry(&self) -> TickerRegistry {
        self.tickers
            .iter()
            .map(|ticker| (ticker.name.clone(), ticker.symbol.clone()))
            .collect()
    }

    /// Correlation the factor model targets for two tickers' minute returns.
    pub fn target_correlation(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.position(a)?;
        let j = self.position(b)?;
        Some(self.model.correlation()[(i, j)])
    }

    /// Price history of one ticker over the last `minutes` minutes.
    ///
    /// The same window always replays the same paths, so series fetched
    /// one ticker at a time stay mutually consistent.
    pub fn series(&self, ticker: &str, minutes: u32) -> Result<Series, FetchError> {
        let index = self
            .position(ticker)
            .ok_or_else(|| FetchError::UnknownTicker(ticker.to_string()))?;

        let mut panel = self.window(minutes);
        Ok(Series::new(ticker, panel.swap_remove(index)))
    }

    fn position(&self, ticker: &str) -> Option<usize> {
        self.tickers.iter().position(|known| known.symbol == ticker)
    }

    fn window(&self, minutes: u32) -> Vec<Vec<PricePoint>> {
        let mut rng = StdRng::seed_from_u64(self.config.seed ^ u64::from(minutes));
        let dim = self.tickers.len();
        let cholesky = self.model.cholesky();
        let mut prices = self.initial_prices.clone();
        let mut points = vec![Vec::with_capacity(minutes as usize); dim];

        for step in 0..minutes {
            let offset = i64::from(minutes - 1 - step);
            let timestamp = self.config.anchor - Duration::minutes(offset);

            let mut draws: DVector<f64> = DVector::zeros(dim);
            for i in 0..dim {
                draws[i] = rng.sample(StandardNormal);
            }
            let correlated = cholesky * draws;

            for (i, price) in prices.iter_mut().enumerate() {
                *price = (*price * (1.0 + correlated[i] * MINUTE_VOLATILITY)).max(0.01);
                if rng.gen_bool(self.config.observation_rate) {
                    points[i].push(PricePoint::new(timestamp, *price));
                }
            }
        }

        points
    }
}
