use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use clap::Args;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_json::json;

use crate::cli::SourceArgs;
use crate::constants::DEFAULT_WINDOW_MINUTES;
use crate::correlation::{build_matrix, CorrelationMatrix};
use crate::logging;
use crate::model::SeriesSet;
use crate::stats::SeriesStats;

#[derive(Debug, Args, Clone)]
pub struct HeatmapArgs {
    /// Lookback window in minutes
    #[arg(short, long, default_value_t = DEFAULT_WINDOW_MINUTES, value_parser = clap::value_parser!(u32).range(1..))]
    pub minutes: u32,

    /// Restrict the heatmap to these tickers (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    pub tickers: Vec<String>,

    /// Print the matrix as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub source: SourceArgs,
}

/// Legend bands for a correlation value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    StrongPositive,
    ModeratePositive,
    WeakPositive,
    NearZero,
    WeakNegative,
    ModerateNegative,
    StrongNegative,
    NoData,
}

impl CorrelationStrength {
    pub const ALL: [CorrelationStrength; 8] = [
        CorrelationStrength::StrongPositive,
        CorrelationStrength::ModeratePositive,
        CorrelationStrength::WeakPositive,
        CorrelationStrength::NearZero,
        CorrelationStrength::WeakNegative,
        CorrelationStrength::ModerateNegative,
        CorrelationStrength::StrongNegative,
        CorrelationStrength::NoData,
    ];

    pub fn classify(correlation: Option<f64>) -> Self {
        let Some(value) = correlation.filter(|value| !value.is_nan()) else {
            return CorrelationStrength::NoData;
        };
        if value > 0.75 {
            CorrelationStrength::StrongPositive
        } else if value > 0.5 {
            CorrelationStrength::ModeratePositive
        } else if value > 0.25 {
            CorrelationStrength::WeakPositive
        } else if value > -0.25 {
            CorrelationStrength::NearZero
        } else if value > -0.5 {
            CorrelationStrength::WeakNegative
        } else if value > -0.75 {
            CorrelationStrength::ModerateNegative
        } else {
            CorrelationStrength::StrongNegative
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CorrelationStrength::StrongPositive => "Strong Positive (>0.75)",
            CorrelationStrength::ModeratePositive => "Moderate Positive (>0.5)",
            CorrelationStrength::WeakPositive => "Weak Positive (>0.25)",
            CorrelationStrength::NearZero => "Near Zero (-0.25 to 0.25)",
            CorrelationStrength::WeakNegative => "Weak Negative (<-0.25)",
            CorrelationStrength::ModerateNegative => "Moderate Negative (<-0.5)",
            CorrelationStrength::StrongNegative => "Strong Negative (<-0.75)",
            CorrelationStrength::NoData => "No Data / Invalid",
        }
    }

    /// Cell marker used by the terminal table.
    pub fn glyph(self) -> &'static str {
        match self {
            CorrelationStrength::StrongPositive => "+++",
            CorrelationStrength::ModeratePositive => "++",
            CorrelationStrength::WeakPositive => "+",
            CorrelationStrength::NearZero => "~",
            CorrelationStrength::WeakNegative => "-",
            CorrelationStrength::ModerateNegative => "--",
            CorrelationStrength::StrongNegative => "---",
            CorrelationStrength::NoData => "?",
        }
    }

    pub fn hex_color(self) -> &'static str {
        match self {
            CorrelationStrength::StrongPositive => "#4CAF50",
            CorrelationStrength::ModeratePositive => "#8BC34A",
            CorrelationStrength::WeakPositive => "#CDDC39",
            CorrelationStrength::NearZero => "#FFEB3B",
            CorrelationStrength::WeakNegative => "#FFC107",
            CorrelationStrength::ModerateNegative => "#FF9800",
            CorrelationStrength::StrongNegative => "#F44336",
            CorrelationStrength::NoData => "#CCCCCC",
        }
    }
}

#[derive(Serialize)]
struct HeatmapCell<'a> {
    ticker_a: &'a str,
    ticker_b: &'a str,
    correlation: Option<f64>,
    strength: CorrelationStrength,
    color: &'static str,
}

#[derive(Serialize)]
struct HeatmapReport<'a> {
    minutes: u32,
    tickers: &'a [String],
    cells: Vec<HeatmapCell<'a>>,
    stats: IndexMap<&'a str, SeriesStats>,
}

pub async fn run(args: HeatmapArgs) -> Result<()> {
    let source = args.source.build()?;
    let registry = source
        .registry()
        .await
        .context("failed to load ticker registry")?;

    let tickers = if args.tickers.is_empty() {
        unique_tickers(registry.tickers())
    } else {
        let requested = unique_tickers(args.tickers);
        for ticker in &requested {
            if !registry.contains_ticker(ticker) {
                logging::warn(
                    "heatmap.unknown_ticker",
                    "Requested ticker is not in the registry",
                    json!({ "ticker": ticker }),
                );
            }
        }
        requested
    };

    let fetched = source.fetch_window(&tickers, args.minutes).await;
    for (ticker, err) in &fetched.failures {
        logging::error(
            "heatmap.missing_series",
            "Ticker left out of correlation",
            json!({ "ticker": ticker, "error": err.to_string() }),
        );
    }
    if fetched.set.loaded() == 0 {
        bail!("No data available to generate heatmap. Please adjust minutes or wait for data.");
    }

    let matrix = build_matrix(&fetched.set);
    logging::info(
        "matrix.built",
        "Correlation matrix computed",
        json!({ "tickers": matrix.len(), "entries": matrix.len() * matrix.len() }),
    );

    if args.json {
        let report = build_report(&matrix, &fetched.set, args.minutes);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_heatmap(&matrix, &fetched.set, args.minutes));
    }
    Ok(())
}

/// Drop repeated tickers, keeping the first occurrence of each.
fn unique_tickers(tickers: Vec<String>) -> Vec<String> {
    tickers
        .into_iter()
        .collect::<IndexSet<String>>()
        .into_iter()
        .collect()
}

fn build_report<'a>(
    matrix: &'a CorrelationMatrix,
    set: &'a SeriesSet,
    minutes: u32,
) -> HeatmapReport<'a> {
    let tickers = matrix.tickers();
    let mut cells = Vec::with_capacity(tickers.len() * tickers.len());
    for row in tickers {
        for col in tickers {
            let correlation = matrix.value(row, col);
            let strength = CorrelationStrength::classify(correlation);
            cells.push(HeatmapCell {
                ticker_a: row,
                ticker_b: col,
                correlation,
                strength,
                color: strength.hex_color(),
            });
        }
    }

    HeatmapReport {
        minutes,
        tickers,
        cells,
        stats: ticker_stats(set),
    }
}

fn ticker_stats(set: &SeriesSet) -> IndexMap<&str, SeriesStats> {
    set.tickers()
        .iter()
        .filter_map(|ticker| {
            set.get(ticker)
                .map(|series| (ticker.as_str(), SeriesStats::of(series)))
        })
        .collect()
}

/// Render the matrix as a terminal table with legend and per-ticker summary.
pub fn render_heatmap(matrix: &CorrelationMatrix, set: &SeriesSet, minutes: u32) -> String {
    const CELL: usize = 10;

    let tickers = matrix.tickers();
    let label_width = tickers
        .iter()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max(6);

    let mut out = String::new();
    let _ = writeln!(out, "Stock Correlation Heatmap (last {minutes} min)");
    let _ = writeln!(out);

    let _ = write!(out, "{:label_width$}", "");
    for ticker in tickers {
        let _ = write!(out, "{ticker:>CELL$}");
    }
    let _ = writeln!(out);

    for row in tickers {
        let _ = write!(out, "{row:<label_width$}");
        for col in tickers {
            let correlation = matrix.value(row, col);
            let glyph = CorrelationStrength::classify(correlation).glyph();
            let cell = match correlation {
                Some(value) => format!("{value:.2}{glyph}"),
                None => format!("N/A{glyph}"),
            };
            let _ = write!(out, "{cell:>CELL$}");
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Correlation Strength Legend");
    for strength in CorrelationStrength::ALL {
        let _ = writeln!(out, "  {:<3} {}", strength.glyph(), strength.label());
    }

    let _ = writeln!(out);
    for ticker in tickers {
        match set.get(ticker) {
            Some(series) => {
                let stats = SeriesStats::of(series);
                let _ = writeln!(
                    out,
                    "{ticker:<label_width$} - Avg: ${:.2}, StdDev: ${:.2} ({} points)",
                    stats.average, stats.std_dev, stats.count
                );
            }
            None => {
                let _ = writeln!(out, "{ticker:<label_width$} - no data");
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PricePoint, Series};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn strength_bands_follow_legend() {
        use CorrelationStrength::*;
        let cases = [
            (Some(1.0), StrongPositive),
            (Some(0.75), ModeratePositive),
            (Some(0.51), ModeratePositive),
            (Some(0.5), WeakPositive),
            (Some(0.25), NearZero),
            (Some(0.0), NearZero),
            (Some(-0.25), WeakNegative),
            (Some(-0.5), ModerateNegative),
            (Some(-0.75), StrongNegative),
            (Some(-1.0), StrongNegative),
            (Some(f64::NAN), NoData),
            (None, NoData),
        ];
        for (value, expected) in cases {
            assert_eq!(CorrelationStrength::classify(value), expected, "{value:?}");
        }
    }

    fn sample_set() -> SeriesSet {
        let base = Utc.with_ymd_and_hms(2025, 5, 24, 11, 0, 0).unwrap();
        let points = |prices: &[f64]| -> Vec<PricePoint> {
            prices
                .iter()
                .enumerate()
                .map(|(i, price)| PricePoint::new(base + Duration::minutes(i as i64), *price))
                .collect()
        };

        let mut set = SeriesSet::new(vec!["AAPL".into(), "MSFT".into(), "TSLA".into()]);
        set.insert(Series::new("AAPL", points(&[10.0, 12.0, 14.0])));
        set.insert(Series::new("MSFT", points(&[20.0, 19.0, 18.0])));
        set
    }

    #[test]
    fn table_shows_values_and_missing_cells() {
        let set = sample_set();
        let matrix = build_matrix(&set);
        let rendered = render_heatmap(&matrix, &set, 30);

        assert!(rendered.contains("last 30 min"));
        assert!(rendered.contains("-1.00---"), "anti-correlated cell:\n{rendered}");
        assert!(rendered.contains("N/A?"));
        assert!(rendered.contains("AAPL   - Avg: $12.00, StdDev: $2.00 (3 points)"));
        assert!(rendered.contains("TSLA   - no data"));
        assert!(rendered.contains("No Data / Invalid"));
    }

    #[test]
    fn repeated_tickers_are_requested_once() {
        let requested = vec![
            "AAPL".to_string(),
            "MSFT".to_string(),
            "AAPL".to_string(),
            "TSLA".to_string(),
            "MSFT".to_string(),
        ];
        assert_eq!(unique_tickers(requested), vec!["AAPL", "MSFT", "TSLA"]);
    }

    #[test]
    fn report_lists_every_ordered_pair() {
        let set = sample_set();
        let matrix = build_matrix(&set);
        let report = build_report(&matrix, &set, 15);

        assert_eq!(report.cells.len(), 9);
        assert_eq!(report.stats.len(), 2);
        let value = serde_json::to_value(&report).expect("serialise");
        assert_eq!(value["cells"][1]["strength"], "strong_negative");
        assert_eq!(value["cells"][2]["correlation"], serde_json::Value::Null);
    }
}
