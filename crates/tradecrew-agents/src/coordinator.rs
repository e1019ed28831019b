use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tradecrew_models::{
    AgentSpec, CrewInputs, CrewOutput, LlmConfig, ManagerConfig, ProcessConfig, TaskOutput,
    TaskSpec, TokenUsage,
};
use tracing::{info, warn};

use crate::error::AgentError;
use crate::execution::{Execution, ModelSettings, Step};
use crate::llm::LlmClient;
use crate::prompts::{delegated_prompt, interpolate_agent, manager_agent, manager_task_prompt};
use crate::tools::ToolBox;

/// Runs a crew: decides who does what, calls the model and the tools, and
/// returns the final output. Mockable for testing.
#[async_trait]
pub trait Coordinator: Send + Sync {
    async fn run(
        &self,
        agents: &[Arc<AgentSpec>],
        tasks: &[TaskSpec],
        manager: &ManagerConfig,
        inputs: &CrewInputs,
    ) -> Result<CrewOutput, AgentError>;
}

/// Hierarchical process: a manager receives every task in order and
/// delegates to the crew's agents, who may in turn consult coworkers.
pub struct HierarchicalCoordinator {
    llm: Arc<dyn LlmClient>,
    toolbox: ToolBox,
    agent_settings: ModelSettings,
    process: ProcessConfig,
}

impl HierarchicalCoordinator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        toolbox: ToolBox,
        llm_config: &LlmConfig,
        process: ProcessConfig,
    ) -> Self {
        Self {
            llm,
            toolbox,
            agent_settings: ModelSettings {
                model: llm_config.model.clone(),
                temperature: llm_config.temperature,
            },
            process,
        }
    }

    fn agent_execution(
        &self,
        agent: &Arc<AgentSpec>,
        crew: &[Arc<AgentSpec>],
        may_delegate: bool,
        opening: String,
    ) -> Execution {
        let coworkers = if may_delegate {
            crew.iter()
                .filter(|c| !Arc::ptr_eq(*c, agent))
                .cloned()
                .collect()
        } else {
            vec![]
        };
        Execution::new(
            Arc::clone(agent),
            self.agent_settings.clone(),
            self.toolbox.for_agent(agent),
            coworkers,
            opening,
            self.process.max_iterations,
        )
    }

    /// Drive one task to completion with an explicit stack of executions.
    /// The bottom is the manager; each delegation pushes the coworker.
    async fn run_task(
        &self,
        task: &TaskSpec,
        crew: &[Arc<AgentSpec>],
        manager: &ManagerConfig,
        inputs: &CrewInputs,
        previous: &[TaskOutput],
        usage: &mut TokenUsage,
    ) -> Result<String, AgentError> {
        let coworkers = if self.process.max_delegation_depth > 0 {
            crew.to_vec()
        } else {
            vec![]
        };
        let root = Execution::new(
            Arc::new(manager_agent()),
            ModelSettings {
                model: manager.model.clone(),
                temperature: Some(manager.temperature),
            },
            vec![],
            coworkers,
            manager_task_prompt(task, inputs, previous),
            self.process.max_iterations,
        );
        let mut stack = vec![root];

        loop {
            let depth = stack.len();
            let current = stack
                .last_mut()
                .ok_or_else(|| AgentError::InvalidCrew("Execution stack is empty".to_string()))?;

            match current.advance(self.llm.as_ref(), usage).await? {
                Step::Continue => {}
                Step::Delegate {
                    coworker,
                    work,
                    context,
                } => {
                    info!(from = %current.agent().role, to = %coworker.role, depth, "Delegating work");
                    let may_delegate =
                        coworker.allow_delegation && depth < self.process.max_delegation_depth;
                    let child = self.agent_execution(
                        &coworker,
                        crew,
                        may_delegate,
                        delegated_prompt(&work, &context),
                    );
                    stack.push(child);
                }
                Step::Finished(answer) => {
                    let role = current.agent().role.clone();
                    stack.pop();
                    match stack.last_mut() {
                        Some(parent) => {
                            info!(from = %role, to = %parent.agent().role, "Coworker answered");
                            parent.observe(&format!("{role} replied:\n{answer}"));
                        }
                        None => return Ok(answer),
                    }
                }
            }
        }
    }
}

/// Every task must point at an agent of the crew.
fn validate_crew(agents: &[Arc<AgentSpec>], tasks: &[TaskSpec]) -> Result<(), AgentError> {
    if agents.is_empty() {
        return Err(AgentError::InvalidCrew("Crew has no agents".to_string()));
    }
    if tasks.is_empty() {
        return Err(AgentError::InvalidCrew("Crew has no tasks".to_string()));
    }
    for task in tasks {
        if !agents.iter().any(|a| Arc::ptr_eq(a, &task.agent)) {
            return Err(AgentError::InvalidCrew(format!(
                "Task '{}' is assigned to {}, who is not part of the crew",
                task.description,
                task.agent_role()
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl Coordinator for HierarchicalCoordinator {
    async fn run(
        &self,
        agents: &[Arc<AgentSpec>],
        tasks: &[TaskSpec],
        manager: &ManagerConfig,
        inputs: &CrewInputs,
    ) -> Result<CrewOutput, AgentError> {
        validate_crew(agents, tasks)?;

        let start = Instant::now();
        info!(agents = agents.len(), tasks = tasks.len(), manager_model = %manager.model, "Starting crew");

        // Interpolated copies; tasks are re-pointed at them by position.
        let crew: Vec<Arc<AgentSpec>> = agents
            .iter()
            .map(|a| Arc::new(interpolate_agent(a, inputs)))
            .collect();
        let tasks: Vec<TaskSpec> = tasks
            .iter()
            .map(|task| {
                let index = agents
                    .iter()
                    .position(|a| Arc::ptr_eq(a, &task.agent))
                    .unwrap_or_default();
                TaskSpec {
                    agent: Arc::clone(&crew[index]),
                    ..task.clone()
                }
            })
            .collect();

        let mut usage = TokenUsage::default();
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(tasks.len());

        for (index, task) in tasks.iter().enumerate() {
            let task_start = Instant::now();
            info!(task = index + 1, agent = %task.agent_role(), "Starting task");

            let raw = match self
                .run_task(task, &crew, manager, inputs, &outputs, &mut usage)
                .await
            {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(task = index + 1, error = %e, "Task failed");
                    return Err(e);
                }
            };

            info!(task = index + 1, elapsed_ms = task_start.elapsed().as_millis(), "Task complete");
            outputs.push(TaskOutput {
                description: task.description.clone(),
                expected_output: task.expected_output.clone(),
                agent: task.agent_role().to_string(),
                raw,
                completed_at: chrono::Utc::now(),
            });
        }

        let output = CrewOutput::from_tasks(outputs, usage);
        info!(
            run_id = %output.run_id,
            total_tokens = output.token_usage.total_tokens,
            requests = output.token_usage.successful_requests,
            elapsed_ms = start.elapsed().as_millis(),
            "Crew finished"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::MANAGER_ROLE;
    use crate::test_support::{ask, delegate, final_answer, use_tool, ScriptedLlm, StaticTool};
    use tradecrew_models::{FinancialTradingInputs, ToolKind};

    fn crew() -> Vec<Arc<AgentSpec>> {
        let tools = [ToolKind::WebScrape, ToolKind::WebSearch];
        vec![
            Arc::new(
                AgentSpec::new("Data Analyst", "Analyze {stock_selection}", "Quant")
                    .with_delegation(true)
                    .with_tools(&tools),
            ),
            Arc::new(
                AgentSpec::new("Risk Advisor", "Evaluate risk", "Cautious")
                    .with_delegation(true)
                    .with_tools(&tools),
            ),
        ]
    }

    fn tasks(agents: &[Arc<AgentSpec>]) -> Vec<TaskSpec> {
        vec![
            TaskSpec::new("Analyze {stock_selection}.", "Insights.", &agents[0]),
            TaskSpec::new("Evaluate risks.", "Risk report.", &agents[1]),
        ]
    }

    fn inputs() -> CrewInputs {
        FinancialTradingInputs::new("AAPL", "100000", "Medium", "Day Trading").to_crew_inputs()
    }

    fn coordinator(llm: Arc<ScriptedLlm>, process: ProcessConfig) -> HierarchicalCoordinator {
        let toolbox = ToolBox::new()
            .with_tool(Arc::new(StaticTool::new(
                ToolKind::WebSearch,
                "search_the_internet",
                "AAPL closes at 190",
            )))
            .with_tool(Arc::new(StaticTool::new(
                ToolKind::WebScrape,
                "read_website_content",
                "page",
            )));
        HierarchicalCoordinator::new(llm, toolbox, &LlmConfig::default(), process)
    }

    #[tokio::test]
    async fn manager_delegates_each_task_and_chains_context() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .reply(MANAGER_ROLE, &delegate("Data Analyst", "Analyze AAPL"))
                .reply(MANAGER_ROLE, &final_answer("AAPL momentum is strong"))
                .reply(MANAGER_ROLE, &delegate("Risk Advisor", "Assess risk"))
                .reply(MANAGER_ROLE, &final_answer("Risk is moderate"))
                .reply(
                    "Data Analyst",
                    &use_tool("search_the_internet", serde_json::json!({"search_query": "AAPL"})),
                )
                .reply("Data Analyst", &final_answer("Closes at 190, momentum strong"))
                .reply("Risk Advisor", &final_answer("Moderate risk")),
        );
        let agents = crew();
        let coord = coordinator(Arc::clone(&llm), ProcessConfig::default());

        let output = coord
            .run(&agents, &tasks(&agents), &ManagerConfig::default(), &inputs())
            .await
            .unwrap();

        assert_eq!(output.raw, "Risk is moderate");
        assert_eq!(output.tasks_output.len(), 2);
        assert_eq!(output.tasks_output[0].raw, "AAPL momentum is strong");
        assert_eq!(output.tasks_output[0].agent, "Data Analyst");
        assert_eq!(output.tasks_output[0].description, "Analyze {stock_selection}.");
        assert_eq!(output.token_usage.successful_requests, 7);
        assert_eq!(llm.remaining().await, 0);

        let manager_calls = llm.requests_for(MANAGER_ROLE).await;
        // Task text is interpolated for the manager.
        assert!(manager_calls[0].messages[1].content.contains("Analyze AAPL."));
        // The second task sees the first task's output.
        assert!(manager_calls[2].messages[1]
            .content
            .contains("AAPL momentum is strong"));
        // Coworker answers come back as observations.
        assert!(manager_calls[1]
            .messages
            .last()
            .unwrap()
            .content
            .contains("Data Analyst replied:\nCloses at 190, momentum strong"));
    }

    #[tokio::test]
    async fn manager_and_agents_use_their_own_models() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .reply(MANAGER_ROLE, &delegate("Data Analyst", "Analyze"))
                .reply(MANAGER_ROLE, &final_answer("a"))
                .reply(MANAGER_ROLE, &final_answer("b"))
                .reply("Data Analyst", &final_answer("x")),
        );
        let agents = crew();
        let llm_config = LlmConfig {
            model: "agent-model".to_string(),
            temperature: Some(0.1),
            ..LlmConfig::default()
        };
        let coord = HierarchicalCoordinator::new(
            llm.clone(),
            ToolBox::new(),
            &llm_config,
            ProcessConfig::default(),
        );
        let manager = ManagerConfig {
            model: "manager-model".to_string(),
            temperature: 0.7,
        };

        coord
            .run(&agents, &tasks(&agents), &manager, &inputs())
            .await
            .unwrap();

        for request in llm.requests_for(MANAGER_ROLE).await {
            assert_eq!(request.model, "manager-model");
            assert_eq!(request.temperature, Some(0.7));
        }
        let analyst = llm.requests_for("Data Analyst").await;
        assert_eq!(analyst.len(), 1);
        assert_eq!(analyst[0].model, "agent-model");
        assert_eq!(analyst[0].temperature, Some(0.1));
    }

    #[tokio::test]
    async fn agent_can_ask_a_coworker() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .reply(MANAGER_ROLE, &delegate("Data Analyst", "Analyze"))
                .reply(MANAGER_ROLE, &final_answer("done 1"))
                .reply(MANAGER_ROLE, &final_answer("done 2"))
                .reply(
                    "Data Analyst",
                    &ask("Risk Advisor", "Is volatility high?", "AAPL intraday"),
                )
                .reply("Data Analyst", &final_answer("Low volatility, buy dips"))
                .reply("Risk Advisor", &final_answer("No, ATR is low")),
        );
        let agents = crew();
        let coord = coordinator(llm.clone(), ProcessConfig::default());

        coord
            .run(&agents, &tasks(&agents), &ManagerConfig::default(), &inputs())
            .await
            .unwrap();

        let risk = llm.requests_for("Risk Advisor").await;
        assert_eq!(risk.len(), 1);
        assert!(risk[0].messages[1].content.contains("Is volatility high?"));
        assert!(risk[0].messages[1].content.contains("AAPL intraday"));
        // At the depth limit the coworker is not offered delegation.
        assert!(!risk[0].messages[0].content.contains("delegate_work"));

        let analyst = llm.requests_for("Data Analyst").await;
        assert!(analyst[1]
            .messages
            .last()
            .unwrap()
            .content
            .contains("Risk Advisor replied:\nNo, ATR is low"));
    }

    #[tokio::test]
    async fn agents_never_list_themselves_as_coworkers() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .reply(MANAGER_ROLE, &delegate("Data Analyst", "Analyze"))
                .reply(MANAGER_ROLE, &final_answer("a"))
                .reply(MANAGER_ROLE, &final_answer("b"))
                .reply("Data Analyst", &final_answer("x")),
        );
        let agents = crew();
        let coord = coordinator(llm.clone(), ProcessConfig::default());
        coord
            .run(&agents, &tasks(&agents), &ManagerConfig::default(), &inputs())
            .await
            .unwrap();

        let system = &llm.requests_for("Data Analyst").await[0].messages[0].content;
        assert!(system.contains("- Risk Advisor: Evaluate risk"));
        assert!(!system.contains("- Data Analyst:"));
        // Goal placeholders are filled in for agents too.
        assert!(system.contains("Your personal goal is: Analyze AAPL"));
    }

    #[tokio::test]
    async fn unknown_coworker_is_reported_to_manager() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .reply(MANAGER_ROLE, &delegate("Portfolio Manager", "Rebalance"))
                .reply(MANAGER_ROLE, &final_answer("a"))
                .reply(MANAGER_ROLE, &final_answer("b")),
        );
        let agents = crew();
        let coord = coordinator(llm.clone(), ProcessConfig::default());

        let output = coord
            .run(&agents, &tasks(&agents), &ManagerConfig::default(), &inputs())
            .await
            .unwrap();

        assert_eq!(output.raw, "b");
        let manager_calls = llm.requests_for(MANAGER_ROLE).await;
        let observed = &manager_calls[1].messages.last().unwrap().content;
        assert!(observed.contains("no coworker named 'Portfolio Manager'"));
        assert!(observed.contains("Data Analyst, Risk Advisor"));
    }

    #[tokio::test]
    async fn zero_depth_keeps_manager_alone() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .reply(MANAGER_ROLE, &final_answer("a"))
                .reply(MANAGER_ROLE, &final_answer("b")),
        );
        let agents = crew();
        let process = ProcessConfig {
            max_delegation_depth: 0,
            ..ProcessConfig::default()
        };
        let coord = coordinator(llm.clone(), process);

        coord
            .run(&agents, &tasks(&agents), &ManagerConfig::default(), &inputs())
            .await
            .unwrap();

        let system = &llm.requests_for(MANAGER_ROLE).await[0].messages[0].content;
        assert!(!system.contains("delegate_work"));
    }

    #[tokio::test]
    async fn iteration_limit_bounds_a_looping_manager() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .reply(MANAGER_ROLE, "hmm")
                .reply(MANAGER_ROLE, "still thinking")
                .reply(MANAGER_ROLE, &final_answer("forced"))
                .reply(MANAGER_ROLE, &final_answer("second")),
        );
        let agents = crew();
        let process = ProcessConfig {
            max_iterations: 2,
            ..ProcessConfig::default()
        };
        let coord = coordinator(llm.clone(), process);

        let output = coord
            .run(&agents, &tasks(&agents), &ManagerConfig::default(), &inputs())
            .await
            .unwrap();

        assert_eq!(output.tasks_output[0].raw, "forced");
        assert_eq!(output.raw, "second");
    }

    #[tokio::test]
    async fn llm_failure_aborts_the_run() {
        let llm = Arc::new(ScriptedLlm::new());
        let agents = crew();
        let coord = coordinator(llm, ProcessConfig::default());

        let result = coord
            .run(&agents, &tasks(&agents), &ManagerConfig::default(), &inputs())
            .await;
        assert!(matches!(result, Err(AgentError::Llm(_))));
    }

    #[test]
    fn validate_rejects_foreign_task_agent() {
        let agents = crew();
        let stranger = Arc::new(AgentSpec::new("Data Analyst", "g", "b"));
        let tasks = vec![TaskSpec::new("Analyze", "Insights", &stranger)];

        assert!(matches!(
            validate_crew(&agents, &tasks),
            Err(AgentError::InvalidCrew(_))
        ));
    }

    #[test]
    fn validate_rejects_empty_crew() {
        assert!(validate_crew(&[], &[]).is_err());
        let agents = crew();
        assert!(validate_crew(&agents, &[]).is_err());
        assert!(validate_crew(&agents, &tasks(&agents)).is_ok());
    }
}
