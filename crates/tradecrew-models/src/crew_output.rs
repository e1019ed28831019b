use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Output of a single task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskOutput {
    pub description: String,
    pub expected_output: String,
    /// Role of the agent the task was assigned to.
    pub agent: String,
    pub raw: String,
    pub completed_at: DateTime<Utc>,
}

/// Token accounting summed over every model call of a run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub successful_requests: u64,
}

impl TokenUsage {
    pub fn record(&mut self, prompt_tokens: u64, completion_tokens: u64) {
        self.prompt_tokens += prompt_tokens;
        self.completion_tokens += completion_tokens;
        self.total_tokens += prompt_tokens + completion_tokens;
        self.successful_requests += 1;
    }
}

/// Result of a crew run. `raw` is the final text; its structure is whatever
/// the last task produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrewOutput {
    pub run_id: Uuid,
    pub raw: String,
    pub tasks_output: Vec<TaskOutput>,
    pub token_usage: TokenUsage,
}

impl CrewOutput {
    /// Build an output whose raw text is the last task's output.
    pub fn from_tasks(tasks_output: Vec<TaskOutput>, token_usage: TokenUsage) -> Self {
        let raw = tasks_output
            .last()
            .map(|t| t.raw.clone())
            .unwrap_or_default();
        Self {
            run_id: Uuid::new_v4(),
            raw,
            tasks_output,
            token_usage,
        }
    }
}

impl fmt::Display for CrewOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
