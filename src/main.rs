use anyhow::Result;
use clap::Parser;
use stock_correlation::chart;
use stock_correlation::cli::{self, Cli};
use stock_correlation::heatmap;

#[tokio::main]
async fn main() -> Result<()> {
    match Cli::parse().command() {
        cli::Command::Stocks(args) => cli::list_stocks(args).await,
        cli::Command::Chart(args) => chart::run(args).await,
        cli::Command::Heatmap(args) => heatmap::run(args).await,
    }
}
