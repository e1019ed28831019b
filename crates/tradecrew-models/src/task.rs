use std::sync::Arc;

use crate::agent::AgentSpec;

/// A unit of work bound to exactly one agent.
///
/// The agent handle is shared with the agent set, so `Arc::ptr_eq` against
/// the agent list tells which agent owns the task.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub description: String,
    pub expected_output: String,
    pub agent: Arc<AgentSpec>,
}

impl TaskSpec {
    pub fn new(description: &str, expected_output: &str, agent: &Arc<AgentSpec>) -> Self {
        Self {
            description: description.to_string(),
            expected_output: expected_output.to_string(),
            agent: Arc::clone(agent),
        }
    }

    pub fn agent_role(&self) -> &str {
        &self.agent.role
    }
}
