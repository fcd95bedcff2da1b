use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single observed price for a ticker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: f64,
    #[serde(rename = "lastUpdatedAt")]
    pub timestamp: DateTime<Utc>,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { price, timestamp }
    }
}

/// Price history of one ticker over a fetch window.
///
/// Points keep the order the source delivered them in. They are not
/// required to be sorted and may repeat a timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub ticker: String,
    pub points: Vec<PricePoint>,
}

impl Series {
    pub fn new(ticker: impl Into<String>, points: Vec<PricePoint>) -> Self {
        Self {
            ticker: ticker.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.price).collect()
    }

    /// Copy of the points ordered by timestamp, oldest first.
    pub fn sorted_points(&self) -> Vec<PricePoint> {
        let mut points = self.points.clone();
        points.sort_by_key(|point| point.timestamp);
        points
    }
}

/// One aligned observation of two tickers at a shared timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedPair {
    pub price1: f64,
    pub price2: f64,
}

impl AlignedPair {
    pub fn swapped(self) -> Self {
        Self {
            price1: self.price2,
            price2: self.price1,
        }
    }
}

/// Display name to ticker symbol, in the order the registry listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TickerRegistry(IndexMap<String, String>);

impl TickerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, ticker: impl Into<String>) {
        self.0.insert(name.into(), ticker.into());
    }

    pub fn tickers(&self) -> Vec<String> {
        self.0.values().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, ticker)| (name.as_str(), ticker.as_str()))
    }

    pub fn first_ticker(&self) -> Option<&str> {
        self.0.values().next().map(String::as_str)
    }

    pub fn contains_ticker(&self, ticker: &str) -> bool {
        self.0.values().any(|known| known == ticker)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N, T> FromIterator<(N, T)> for TickerRegistry
where
    N: Into<String>,
    T: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, T)>>(iter: I) -> Self {
        let mut registry = TickerRegistry::new();
        for (name, ticker) in iter {
            registry.insert(name, ticker);
        }
        registry
    }
}

impl fmt::Display for TickerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, ticker) in self.iter() {
            writeln!(f, "{ticker:>8}  {name}")?;
        }
        Ok(())
    }
}

/// The tickers taking part in a correlation pass and whatever series were
/// obtained for them.
///
/// A ticker can be listed without a series when its fetch failed; matrix
/// entries touching it are then undefined.
#[derive(Debug, Clone, Default)]
pub struct SeriesSet {
    tickers: Vec<String>,
    series: HashMap<String, Series>,
}

impl SeriesSet {
    /// Start a set for the given tickers; repeats after the first are ignored.
    pub fn new(tickers: Vec<String>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            if !unique.contains(&ticker) {
                unique.push(ticker);
            }
        }
        Self {
            tickers: unique,
            series: HashMap::new(),
        }
    }

    /// Build a set where every ticker has a series, ordered as given.
    pub fn from_series<I>(series: I) -> Self
    where
        I: IntoIterator<Item = Series>,
    {
        let mut set = SeriesSet::default();
        for entry in series {
            set.insert(entry);
        }
        set
    }

    /// Attach a series, listing its ticker if it was not known yet.
    pub fn insert(&mut self, series: Series) {
        if !self.tickers.iter().any(|ticker| ticker == &series.ticker) {
            self.tickers.push(series.ticker.clone());
        }
        self.series.insert(series.ticker.clone(), series);
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn get(&self, ticker: &str) -> Option<&Series> {
        self.series.get(ticker)
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// Number of tickers that actually have a series attached.
    pub fn loaded(&self) -> usize {
        self.series.len()
    }
}
