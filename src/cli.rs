use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::chart::ChartArgs;
use crate::client::{ApiConfig, StockApiClient};
use crate::constants::{API_BASE_URL, REQUEST_TIMEOUT_SECS, SYNTHETIC_SEED, TOKEN_ENV_VAR};
use crate::heatmap::HeatmapArgs;
use crate::simulator::{SyntheticConfig, SyntheticMarket};
use crate::source::PriceSource;

#[derive(Debug, Parser)]
#[command(author, version, about = "Stock price charts and correlation heatmaps")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn command(self) -> Command {
        self.command
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the tickers the price service knows about
    Stocks(StocksArgs),
    /// Render the price history of one ticker with its average price
    Chart(ChartArgs),
    /// Compute and print the pairwise correlation heatmap
    Heatmap(HeatmapArgs),
}

#[derive(Debug, Args, Clone)]
pub struct StocksArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

/// Options selecting and configuring the price source.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Base URL of the stock price service
    #[arg(long, default_value = API_BASE_URL)]
    pub base_url: String,

    /// Bearer token for the stock price service
    #[arg(long, env = TOKEN_ENV_VAR, hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = REQUEST_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Use the offline synthetic market instead of the HTTP service
    #[arg(long)]
    pub synthetic: bool,

    /// Seed for the synthetic market
    #[arg(long, default_value_t = SYNTHETIC_SEED)]
    pub seed: u64,
}

impl SourceArgs {
    pub fn build(&self) -> Result<PriceSource> {
        if self.synthetic {
            let market = SyntheticMarket::new(SyntheticConfig {
                seed: self.seed,
                ..SyntheticConfig::default()
            })?;
            return Ok(PriceSource::Synthetic(market));
        }

        let config = ApiConfig {
            base_url: self.base_url.clone(),
            auth_token: self.token.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        };
        let client = StockApiClient::new(config)
            .with_context(|| format!("cannot query {}; set --token or {TOKEN_ENV_VAR}", self.base_url))?;
        Ok(PriceSource::Api(client))
    }
}

pub async fn list_stocks(args: StocksArgs) -> Result<()> {
    let registry = args
        .source
        .build()?
        .registry()
        .await
        .context("failed to load ticker registry")?;
    print!("{registry}");
    Ok(())
}
