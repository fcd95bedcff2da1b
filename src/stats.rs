use serde::Serialize;

use crate::model::Series;

/// Arithmetic mean, `0.0` for an empty slice.
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample covariance (divides by `n - 1`).
///
/// Fewer than two observations carry no spread information and yield `0.0`.
///
/// # Panics
///
/// Panics if `xs` and `ys` differ in length.
pub fn covariance(xs: &[f64], ys: &[f64]) -> f64 {
    assert_eq!(
        xs.len(),
        ys.len(),
        "covariance requires equal-length samples"
    );
    let n = xs.len();
    if n <= 1 {
        return 0.0;
    }

    let mean_x = mean(xs);
    let mean_y = mean(ys);
    let sum_of_products: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();
    sum_of_products / (n - 1) as f64
}

/// Sample standard deviation (divides by `n - 1`), `0.0` below two observations.
///
/// A constant sample is exactly `0.0`; the mean of repeated prices does not
/// always round back to the price itself.
pub fn std_dev(xs: &[f64]) -> f64 {
    let n = xs.len();
    if n <= 1 || xs.iter().all(|x| *x == xs[0]) {
        return 0.0;
    }

    let mean = mean(xs);
    let sum_of_squares: f64 = xs.iter().map(|x| (x - mean).powi(2)).sum();
    (sum_of_squares / (n - 1) as f64).sqrt()
}

/// Pearson correlation coefficient of two aligned samples.
///
/// Returns `0.0` when there are fewer than two observations or when either
/// sample is constant. The result is clamped to `[-1, 1]`.
///
/// # Panics
///
/// Panics if `xs` and `ys` differ in length.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    assert_eq!(xs.len(), ys.len(), "pearson requires aligned samples");
    if xs.len() <= 1 {
        return 0.0;
    }

    let std_x = std_dev(xs);
    let std_y = std_dev(ys);
    if std_x <= 0.0 || std_y <= 0.0 {
        return 0.0;
    }

    (covariance(xs, ys) / (std_x * std_y)).clamp(-1.0, 1.0)
}

/// Summary shown next to a ticker on charts and the heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    pub count: usize,
    pub average: f64,
    pub std_dev: f64,
}

impl SeriesStats {
    pub fn of(series: &Series) -> Self {
        let prices = series.prices();
        Self {
            count: prices.len(),
            average: mean(&prices),
            std_dev: std_dev(&prices),
        }
    }
}
