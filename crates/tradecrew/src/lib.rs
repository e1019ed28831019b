//! tradecrew - a four-agent financial trading crew
//!
//! A Data Analyst, a Trading Strategy Developer, a Trade Advisor and a Risk
//! Advisor work through four fixed tasks. A manager model delegates the work
//! (hierarchical process); agents can search the web and read pages.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use tradecrew::models::{CrewConfig, Credentials};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = CrewConfig::default();
//! let credentials = Credentials::from_env()?;
//! let output = tradecrew::run_financial_analysis(
//!     &config, &credentials, "AAPL", "100000", "Medium", "Day Trading",
//! )
//! .await?;
//! println!("{output}");
//! # Ok(())
//! # }
//! ```

pub mod crew;

pub use tradecrew_agents as agents;
pub use tradecrew_models as models;

pub use crew::{create_agents, create_tasks, FinancialTradingCrew};

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tradecrew_agents::{
    HierarchicalCoordinator, OpenAiClient, ScrapeWebsiteTool, SerperSearchTool, ToolBox,
};
use tradecrew_models::{Credentials, CrewConfig, CrewOutput};

/// Load configuration from a TOML file, or defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<CrewConfig, anyhow::Error> {
    let Some(path) = path else {
        return Ok(CrewConfig::default());
    };
    let config_str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&config_str).with_context(|| format!("Failed to parse config: {}", path.display()))
}

/// Build the default coordinator: OpenAI for reasoning, Serper for search,
/// plain HTTP for scraping.
pub fn build_coordinator(
    config: &CrewConfig,
    credentials: &Credentials,
) -> Result<HierarchicalCoordinator, anyhow::Error> {
    let llm = OpenAiClient::new(&config.llm, credentials.openai_api_key.clone())
        .context("Failed to build LLM client")?;
    let search = SerperSearchTool::new(&config.search, credentials.serper_api_key.clone())
        .context("Failed to build search tool")?;
    let scrape = ScrapeWebsiteTool::new(&config.scrape).context("Failed to build scrape tool")?;

    let toolbox = ToolBox::new()
        .with_tool(Arc::new(search))
        .with_tool(Arc::new(scrape));

    Ok(HierarchicalCoordinator::new(
        Arc::new(llm),
        toolbox,
        &config.llm,
        config.process.clone(),
    ))
}

/// Build the crew from configuration.
pub fn build_crew(
    config: &CrewConfig,
    credentials: &Credentials,
) -> Result<FinancialTradingCrew, anyhow::Error> {
    let coordinator = build_coordinator(config, credentials)?;
    Ok(FinancialTradingCrew::new(
        Arc::new(coordinator),
        config.manager.clone(),
    ))
}

/// One-shot entry point: build the crew and run it on the given inputs.
pub async fn run_financial_analysis(
    config: &CrewConfig,
    credentials: &Credentials,
    stock_selection: &str,
    initial_capital: &str,
    risk_tolerance: &str,
    trading_strategy_preference: &str,
) -> Result<CrewOutput, anyhow::Error> {
    let crew = build_crew(config, credentials)?;
    crew.run(
        stock_selection,
        initial_capital,
        risk_tolerance,
        trading_strategy_preference,
    )
    .await
    .context("Crew run failed")
}
