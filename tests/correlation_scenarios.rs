use chrono::{DateTime, Duration, TimeZone, Utc};
use stock_correlation::align::{align, unzip};
use stock_correlation::correlation::{build_matrix, pair_correlation};
use stock_correlation::logging;
use stock_correlation::model::{PricePoint, Series, SeriesSet};
use stock_correlation::simulator::{SyntheticConfig, SyntheticMarket};
use stock_correlation::source::PriceSource;
use stock_correlation::stats::{pearson, std_dev};

fn t(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 24, 9, 30, 0).unwrap() + Duration::minutes(minute)
}

fn series(ticker: &str, raw: &[(i64, f64)]) -> Series {
    Series::new(
        ticker,
        raw.iter()
            .map(|(minute, price)| PricePoint::new(t(*minute), *price))
            .collect(),
    )
}

#[test]
fn rising_against_falling_is_perfectly_anti_correlated() {
    let a = series("A", &[(1, 10.0), (2, 12.0), (3, 14.0)]);
    let b = series("B", &[(1, 20.0), (2, 19.0), (3, 18.0)]);
    let r = pair_correlation(&a, &b);
    assert!((r + 1.0).abs() < 1e-9, "expected -1, got {r}");
}

#[test]
fn constant_series_correlates_to_zero() {
    let a = series("A", &[(1, 10.0), (2, 10.0), (3, 10.0)]);
    let b = series("B", &[(1, 3.0), (2, 7.0), (3, 5.0)]);
    assert_eq!(pair_correlation(&a, &b), 0.0);
    assert_eq!(pair_correlation(&a, &a), 0.0);
}

#[test]
fn disjoint_timestamps_correlate_to_zero() {
    let a = series("A", &[(1, 10.0), (2, 11.0)]);
    let b = series("B", &[(3, 20.0), (4, 21.0)]);
    assert!(align(&a.points, &b.points).is_empty());
    assert_eq!(pair_correlation(&a, &b), 0.0);
}

#[test]
fn single_shared_point_correlates_to_zero() {
    let a = series("A", &[(1, 10.0)]);
    let b = series("B", &[(1, 20.0)]);
    assert_eq!(align(&a.points, &b.points).len(), 1);
    let r = pair_correlation(&a, &b);
    assert!(r.is_finite());
    assert_eq!(r, 0.0);
}

#[test]
fn partially_overlapping_tickers_fill_symmetric_matrix() {
    let set = SeriesSet::from_series([
        series("X", &[(0, 100.0), (1, 101.5), (2, 100.8), (3, 102.2), (4, 103.0)]),
        series("Y", &[(1, 50.0), (2, 49.1), (3, 51.7), (5, 52.0)]),
        series("Z", &[(0, 10.0), (2, 10.4), (4, 10.1), (6, 9.8)]),
    ]);
    let matrix = build_matrix(&set);

    let entries = matrix.entries();
    assert_eq!(entries.len(), 9);
    assert_eq!(
        entries
            .iter()
            .filter(|entry| entry.ticker_a == entry.ticker_b)
            .count(),
        3
    );

    for entry in &entries {
        let value = entry.correlation.expect("all series present");
        assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&value));
        let mirrored = matrix
            .value(&entry.ticker_b, &entry.ticker_a)
            .expect("mirror entry");
        assert_eq!(value, mirrored);
    }
    for ticker in ["X", "Y", "Z"] {
        let diagonal = matrix.value(ticker, ticker).expect("diagonal");
        assert!((diagonal - 1.0).abs() < 1e-9);
    }
}

#[test]
fn self_pair_is_defined_even_for_a_single_point() {
    let set = SeriesSet::from_series([series("ONE", &[(0, 42.0)])]);
    let matrix = build_matrix(&set);
    assert_eq!(matrix.value("ONE", "ONE"), Some(0.0));
}

#[test]
fn aligned_self_correlation_matches_std_dev_rule() {
    let a = series("A", &[(3, 7.0), (1, 4.0), (2, 9.0), (4, 1.0)]);
    let (xs, ys) = unzip(&align(&a.points, &a.points));
    assert_eq!(xs.len(), a.len());
    assert!(std_dev(&xs) > 0.0);
    assert!((pearson(&xs, &ys) - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn synthetic_market_feeds_a_well_formed_matrix() {
    logging::set_silent(true);
    let market = SyntheticMarket::new(SyntheticConfig {
        seed: 1234,
        ..SyntheticConfig::default()
    })
    .expect("synthetic market");
    let target = market
        .target_correlation("NVDA", "AMD")
        .expect("known tickers");
    assert!(target > 0.0 && target < 1.0);

    let source = PriceSource::Synthetic(market);
    let tickers = source.registry().await.expect("registry").tickers();
    let fetched = source.fetch_window(&tickers, 50).await;
    assert!(fetched.failures.is_empty());

    let matrix = build_matrix(&fetched.set);
    assert_eq!(matrix.entries().len(), tickers.len() * tickers.len());
    for a in &tickers {
        for b in &tickers {
            let value = matrix.value(a, b).expect("defined");
            assert_eq!(Some(value), matrix.value(b, a));
            assert!((-1.0..=1.0).contains(&value));
        }
    }

    // Tickers drop minutes independently, so timestamp sets overlap only partly.
    let nvda = fetched.set.get("NVDA").expect("NVDA");
    let amd = fetched.set.get("AMD").expect("AMD");
    let shared = align(&nvda.points, &amd.points).len();
    assert!(shared <= nvda.len().min(amd.len()));
}
