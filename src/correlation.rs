use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::Serialize;

use crate::align::{align, unzip};
use crate::model::{Series, SeriesSet};
use crate::stats::pearson;

/// Correlation of one ordered ticker pair. `None` marks a pair that could
/// not be computed because one side has no series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationEntry {
    pub ticker_a: String,
    pub ticker_b: String,
    pub correlation: Option<f64>,
}

/// Pairwise correlations over a fixed, ordered ticker set.
///
/// Undefined cells are stored as NaN and surface as `None`.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    tickers: Vec<String>,
    values: DMatrix<f64>,
}

impl CorrelationMatrix {
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    pub fn get(&self, ticker_a: &str, ticker_b: &str) -> Option<CorrelationEntry> {
        let row = self.position(ticker_a)?;
        let col = self.position(ticker_b)?;
        Some(self.entry_at(row, col))
    }

    /// Correlation between two tickers, `None` if unknown or undefined.
    pub fn value(&self, ticker_a: &str, ticker_b: &str) -> Option<f64> {
        self.get(ticker_a, ticker_b)?.correlation
    }

    /// Every ordered pair, row by row.
    pub fn entries(&self) -> Vec<CorrelationEntry> {
        let size = self.len();
        let mut entries = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                entries.push(self.entry_at(row, col));
            }
        }
        entries
    }

    fn position(&self, ticker: &str) -> Option<usize> {
        self.tickers.iter().position(|known| known == ticker)
    }

    fn entry_at(&self, row: usize, col: usize) -> CorrelationEntry {
        let value = self.values[(row, col)];
        CorrelationEntry {
            ticker_a: self.tickers[row].clone(),
            ticker_b: self.tickers[col].clone(),
            correlation: (!value.is_nan()).then_some(value),
        }
    }
}

/// Align two series and compute their Pearson correlation.
pub fn pair_correlation(a: &Series, b: &Series) -> f64 {
    let aligned = align(&a.points, &b.points);
    let (xs, ys) = unzip(&aligned);
    pearson(&xs, &ys)
}

/// Build the full correlation matrix for a series set.
///
/// Each unordered pair, self-pairs included, is computed once and written
/// to both `(i, j)` and `(j, i)`.
pub fn build_matrix(set: &SeriesSet) -> CorrelationMatrix {
    let tickers = set.tickers().to_vec();
    let size = tickers.len();

    let pairs: Vec<(usize, usize)> = (0..size)
        .flat_map(|i| (i..size).map(move |j| (i, j)))
        .collect();

    let computed: Vec<(usize, usize, f64)> = pairs
        .par_iter()
        .map(|&(i, j)| {
            let value = match (set.get(&tickers[i]), set.get(&tickers[j])) {
                (Some(a), Some(b)) => pair_correlation(a, b),
                _ => f64::NAN,
            };
            (i, j, value)
        })
        .collect();

    let mut values = DMatrix::from_element(size, size, f64::NAN);
    for (i, j, value) in computed {
        values[(i, j)] = value;
        values[(j, i)] = value;
    }

    CorrelationMatrix { tickers, values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PricePoint;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 24, 14, minute, 0).unwrap()
    }

    fn series(ticker: &str, raw: &[(u32, f64)]) -> Series {
        Series::new(
            ticker,
            raw.iter()
                .map(|(minute, price)| PricePoint::new(at(*minute), *price))
                .collect(),
        )
    }

    #[test]
    fn pair_correlation_aligns_before_correlating() {
        // Only minutes 1..=3 overlap; the stray points would flip the sign.
        let a = series("A", &[(0, 500.0), (1, 10.0), (2, 12.0), (3, 14.0)]);
        let b = series("B", &[(1, 20.0), (2, 19.0), (3, 18.0), (9, 1.0)]);
        let r = pair_correlation(&a, &b);
        assert!((r + 1.0).abs() < 1e-9, "expected -1, got {r}");
    }

    #[test]
    fn matrix_is_square_and_symmetric() {
        let set = SeriesSet::from_series([
            series("X", &[(0, 1.0), (1, 2.0), (2, 4.0), (3, 3.0)]),
            series("Y", &[(1, 5.0), (2, 6.0), (3, 5.5), (4, 7.0)]),
            series("Z", &[(0, 9.0), (2, 8.0), (3, 8.5), (5, 1.0)]),
        ]);
        let matrix = build_matrix(&set);

        assert_eq!(matrix.entries().len(), 9);
        for a in matrix.tickers() {
            for b in matrix.tickers() {
                assert_eq!(matrix.value(a, b), matrix.value(b, a), "{a}/{b}");
            }
            let diagonal = matrix.value(a, a).expect("diagonal defined");
            assert!((diagonal - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn missing_series_leaves_entries_undefined() {
        let mut set = SeriesSet::new(vec!["A".into(), "B".into()]);
        set.insert(series("A", &[(0, 1.0), (1, 2.0)]));
        let matrix = build_matrix(&set);

        let diagonal = matrix.value("A", "A").expect("diagonal defined");
        assert!((diagonal - 1.0).abs() < 1e-9);
        assert_eq!(matrix.get("A", "B").map(|e| e.correlation), Some(None));
        assert_eq!(matrix.get("B", "B").map(|e| e.correlation), Some(None));
        assert!(matrix.get("A", "C").is_none());
    }

    #[test]
    fn stale_price_ticker_has_zero_diagonal() {
        let set = SeriesSet::from_series([
            series("STALE", &[(0, 231.95), (1, 231.95), (2, 231.95)]),
            series("LIVE", &[(0, 230.0), (1, 232.5), (2, 231.0)]),
        ]);
        let matrix = build_matrix(&set);

        assert_eq!(matrix.value("STALE", "STALE"), Some(0.0));
        assert_eq!(matrix.value("STALE", "LIVE"), Some(0.0));
        assert_eq!(matrix.value("LIVE", "STALE"), Some(0.0));
    }

    #[test]
    fn empty_set_builds_empty_matrix() {
        let matrix = build_matrix(&SeriesSet::default());
        assert!(matrix.is_empty());
        assert!(matrix.entries().is_empty());
    }
}
