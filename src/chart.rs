use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::json;
use textplots::{Chart, Plot, Shape};

use crate::cli::SourceArgs;
use crate::constants::DEFAULT_WINDOW_MINUTES;
use crate::logging;
use crate::model::{PricePoint, Series};
use crate::stats::mean;

#[derive(Debug, Args, Clone)]
pub struct ChartArgs {
    /// Ticker to plot; defaults to the first one the registry lists
    #[arg(short, long)]
    pub ticker: Option<String>,

    /// Lookback window in minutes
    #[arg(short, long, default_value_t = DEFAULT_WINDOW_MINUTES, value_parser = clap::value_parser!(u32).range(1..))]
    pub minutes: u32,

    /// Chart width in characters
    #[arg(long, default_value_t = 120)]
    pub width: u32,

    /// Chart height in characters
    #[arg(long, default_value_t = 30)]
    pub height: u32,

    #[command(flatten)]
    pub source: SourceArgs,
}

/// What the price page shows for one ticker: the ordered history and its
/// average price.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    pub ticker: String,
    pub points: Vec<PricePoint>,
    pub average: f64,
}

impl PriceHistory {
    pub fn from_series(series: &Series) -> Self {
        let points = series.sorted_points();
        let prices: Vec<f64> = points.iter().map(|point| point.price).collect();
        Self {
            ticker: series.ticker.clone(),
            average: mean(&prices),
            points,
        }
    }

    /// `(minutes since first point, price)` samples for plotting.
    pub fn samples(&self) -> Vec<(f32, f32)> {
        let Some(first) = self.points.first() else {
            return Vec::new();
        };
        self.points
            .iter()
            .map(|point| {
                let elapsed = (point.timestamp - first.timestamp).num_milliseconds() as f64 / 60_000.0;
                (elapsed as f32, point.price as f32)
            })
            .collect()
    }
}

pub async fn run(args: ChartArgs) -> Result<()> {
    let source = args.source.build()?;

    let ticker = match args.ticker {
        Some(ticker) => ticker,
        None => {
            let registry = source
                .registry()
                .await
                .context("failed to load ticker registry")?;
            let Some(first) = registry.first_ticker() else {
                bail!("ticker registry is empty");
            };
            first.to_string()
        }
    };

    let series = source
        .series(&ticker, args.minutes)
        .await
        .with_context(|| format!("failed to fetch price history for {ticker}"))?;
    let history = PriceHistory::from_series(&series);

    logging::info(
        "chart.loaded",
        "Price history loaded",
        json!({ "ticker": ticker, "points": history.points.len(), "minutes": args.minutes }),
    );

    render_chart(&history, args.minutes, args.width, args.height)
}

fn render_chart(history: &PriceHistory, minutes: u32, width: u32, height: u32) -> Result<()> {
    if history.points.is_empty() {
        bail!("No data available for the selected stock and time frame.");
    }

    println!("Stock Price Chart: {} (last {minutes} min)", history.ticker);
    println!("Current Average Price: ${:.2}", history.average);

    if history.points.len() < 2 {
        let point = &history.points[0];
        println!(
            "Only one price in window: ${:.2} at {}",
            point.price,
            point.timestamp.format("%H:%M:%S")
        );
        return Ok(());
    }

    let samples = history.samples();
    let span = samples.last().map(|(t, _)| *t).unwrap_or(0.0).max(1e-3);
    let min_price = history
        .points
        .iter()
        .map(|point| point.price)
        .fold(f64::INFINITY, f64::min);
    let max_price = history
        .points
        .iter()
        .map(|point| point.price)
        .fold(f64::NEG_INFINITY, f64::max);
    println!("Price range: {min_price:.2} → {max_price:.2}");

    let average = history.average as f32;
    let average_line = [(0.0, average), (span, average)];

    Chart::new(width.max(40), height.max(10), 0.0, span)
        .lineplot(&Shape::Lines(&samples))
        .lineplot(&Shape::Lines(&average_line))
        .display();
    println!("x: minutes since {}", history.points[0].timestamp.format("%H:%M:%S"));
    Ok(())
}
