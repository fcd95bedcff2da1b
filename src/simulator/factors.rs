use anyhow::{Context, Result};
use nalgebra::{Cholesky, DMatrix, DVector};
use rand::rngs::StdRng;
use rand::Rng;

use super::SyntheticTicker;

/// Correlation structure of the synthetic market and its Cholesky factor.
pub struct FactorModel {
    correlation: DMatrix<f64>,
    cholesky: DMatrix<f64>,
}

impl FactorModel {
    pub fn new(tickers: &[SyntheticTicker], groups: usize, rng: &mut StdRng) -> Result<Self> {
        let correlation = factor_based_correlation(tickers, groups, rng);
        let cholesky = Cholesky::new(correlation.clone())
            .map(|decomposition| decomposition.l().clone_owned())
            .with_context(|| "failed to compute Cholesky factor for synthetic correlation")?;
        Ok(Self {
            correlation,
            cholesky,
        })
    }

    pub fn cholesky(&self) -> &DMatrix<f64> {
        &self.cholesky
    }

    pub fn correlation(&self) -> &DMatrix<f64> {
        &self.correlation
    }
}

fn factor_based_correlation(
    tickers: &[SyntheticTicker],
    groups: usize,
    rng: &mut StdRng,
) -> DMatrix<f64> {
    // market beta, one column per group, idiosyncratic style
    let columns = 1 + groups + 1;
    let mut loadings = Vec::with_capacity(tickers.len() * columns);

    for ticker in tickers {
        let mut row = vec![0.0; columns];
        row[0] = rng.gen_range(0.45..0.75);
        row[1 + ticker.group.min(groups.saturating_sub(1))] = rng.gen_range(0.4..0.7);
        row[columns - 1] = rng.gen_range(0.05..0.12);
        loadings.extend(row);
    }

    let factors = DMatrix::from_row_slice(tickers.len(), columns, &loadings);
    let mut covariance = &factors * factors.transpose();
    for i in 0..tickers.len() {
        covariance[(i, i)] += rng.gen_range(0.08..0.15);
    }

    renormalize(covariance)
}

fn renormalize(matrix: DMatrix<f64>) -> DMatrix<f64> {
    let size = matrix.nrows();
    let mut diag = DVector::zeros(size);
    for i in 0..size {
        diag[i] = matrix[(i, i)].max(f64::EPSILON).sqrt();
    }

    let mut normalized = matrix;
    for i in 0..size {
        for j in 0..size {
            normalized[(i, j)] /= diag[i] * diag[j];
        }
        normalized[(i, i)] = 1.0;
    }
    normalized
}
