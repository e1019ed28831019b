//! The financial trading crew: four agents, four tasks, hierarchical process.

use std::sync::Arc;

use tracing::info;
use tradecrew_agents::{AgentError, Coordinator};
use tradecrew_models::{AgentSpec, CrewOutput, FinancialTradingInputs, ManagerConfig, TaskSpec, ToolKind};

const AGENT_TOOLS: [ToolKind; 2] = [ToolKind::WebScrape, ToolKind::WebSearch];

/// Number of agents (and tasks) in the pipeline.
pub const CREW_SIZE: usize = 4;

fn crew_member(role: &str, goal: &str, backstory: &str) -> Arc<AgentSpec> {
    Arc::new(
        AgentSpec::new(role, goal, backstory)
            .with_delegation(true)
            .with_verbose(true)
            .with_tools(&AGENT_TOOLS),
    )
}

/// The four agents, in pipeline order: analyst, strategist, execution
/// advisor, risk advisor.
pub fn create_agents() -> Vec<Arc<AgentSpec>> {
    vec![
        crew_member(
            "Data Analyst",
            "Monitor and analyze market data in real-time to identify trends and predict market movements.",
            "Specializing in financial markets, this agent uses statistical modeling and machine learning to provide crucial insights.",
        ),
        crew_member(
            "Trading Strategy Developer",
            "Develop and test various trading strategies based on insights from the Data Analyst Agent.",
            "Equipped with a deep understanding of financial markets and quantitative analysis.",
        ),
        crew_member(
            "Trade Advisor",
            "Suggest optimal trade execution strategies based on approved trading strategies.",
            "Specializes in analyzing the timing, price, and logistical details of potential trades.",
        ),
        crew_member(
            "Risk Advisor",
            "Evaluate and provide insights on the risks associated with potential trading activities.",
            "Scrutinizes potential risks and offers safeguards.",
        ),
    ]
}

/// The four tasks, task `i` bound to `agents[i]`.
///
/// Fails if fewer than four agents are given. Extra agents get no task but
/// stay on the crew as coworkers.
pub fn create_tasks(agents: &[Arc<AgentSpec>]) -> Result<Vec<TaskSpec>, AgentError> {
    if agents.len() < CREW_SIZE {
        return Err(AgentError::InvalidCrew(format!(
            "Expected at least {CREW_SIZE} agents, got {}",
            agents.len()
        )));
    }

    Ok(vec![
        TaskSpec::new(
            "Monitor and analyze market data for the selected stock.",
            "Insights and alerts about significant market opportunities.",
            &agents[0],
        ),
        TaskSpec::new(
            "Develop trading strategies based on insights and risk tolerance.",
            "Trading strategies aligned with user risk tolerance.",
            &agents[1],
        ),
        TaskSpec::new(
            "Analyze approved strategies and suggest best execution methods.",
            "Execution plans for trades.",
            &agents[2],
        ),
        TaskSpec::new(
            "Evaluate risks of proposed trading strategies and plans.",
            "Comprehensive risk analysis report.",
            &agents[3],
        ),
    ])
}

/// Runs the financial trading pipeline through an injected coordinator.
pub struct FinancialTradingCrew {
    coordinator: Arc<dyn Coordinator>,
    manager: ManagerConfig,
}

impl FinancialTradingCrew {
    pub fn new(coordinator: Arc<dyn Coordinator>, manager: ManagerConfig) -> Self {
        Self {
            coordinator,
            manager,
        }
    }

    /// Build the crew and hand it to the coordinator. Every call is a fresh
    /// coordinator run.
    pub async fn run(
        &self,
        stock_selection: &str,
        initial_capital: &str,
        risk_tolerance: &str,
        trading_strategy_preference: &str,
    ) -> Result<CrewOutput, AgentError> {
        let agents = create_agents();
        let tasks = create_tasks(&agents)?;
        let inputs = FinancialTradingInputs::new(
            stock_selection,
            initial_capital,
            risk_tolerance,
            trading_strategy_preference,
        );

        info!(
            stock = %inputs.stock_selection,
            capital = %inputs.initial_capital,
            risk = %inputs.risk_tolerance,
            strategy = %inputs.trading_strategy_preference,
            "Running financial trading crew"
        );

        self.coordinator
            .run(&agents, &tasks, &self.manager, &inputs.to_crew_inputs())
            .await
    }
}
