use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tradecrew::models::Credentials;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tradecrew", about = "Financial trading crew: analysis, strategy, execution and risk")]
struct Cli {
    /// Path to configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ticker to analyze
    #[arg(long, default_value = "AAPL")]
    stock_selection: String,

    /// Capital available for the strategy
    #[arg(long, default_value = "100000")]
    initial_capital: String,

    #[arg(long, default_value = "Medium")]
    risk_tolerance: String,

    #[arg(long, default_value = "Day Trading")]
    trading_strategy_preference: String,

    /// Print the whole run (every task output and token usage) as JSON
    #[arg(long)]
    json: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Emit logs on stderr as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing (respects RUST_LOG env var)
    let logs = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if cli.log_json {
        logs.json().init();
    } else {
        logs.init();
    }

    // Credentials first: nothing talks to the network without them
    let credentials = Credentials::from_env().context("Cannot start the crew")?;
    let config = tradecrew::load_config(cli.config.as_deref())?;

    let output = tradecrew::run_financial_analysis(
        &config,
        &credentials,
        &cli.stock_selection,
        &cli.initial_capital,
        &cli.risk_tolerance,
        &cli.trading_strategy_preference,
    )
    .await?;

    if cli.json || cli.pretty {
        let rendered = if cli.pretty {
            serde_json::to_string_pretty(&output)?
        } else {
            serde_json::to_string(&output)?
        };
        println!("{rendered}");
    } else {
        println!("{}", output.raw);
    }

    Ok(())
}
