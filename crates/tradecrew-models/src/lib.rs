pub mod agent;
pub mod config;
pub mod crew_output;
pub mod run_input;
pub mod task;

pub use agent::{AgentSpec, ToolKind};
pub use config::{
    ConfigError, Credentials, CrewConfig, LlmConfig, ManagerConfig, ProcessConfig, ScrapeConfig,
    SearchConfig,
};
pub use crew_output::{CrewOutput, TaskOutput, TokenUsage};
pub use run_input::{CrewInputs, FinancialTradingInputs};
pub use task::TaskSpec;
