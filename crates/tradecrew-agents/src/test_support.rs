//! Test support: a scripted model, a canned tool and a recording coordinator.
//!
//! `ScriptedLlm` keeps one reply queue per agent role. The role is read from
//! the system prompt ("You are <role>. ..."), so scripts stay readable no
//! matter how the coordinator interleaves calls.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tradecrew_models::{
    AgentSpec, CrewInputs, CrewOutput, ManagerConfig, TaskOutput, TaskSpec, TokenUsage, ToolKind,
};

use crate::coordinator::Coordinator;
use crate::error::AgentError;
use crate::llm::{ChatRequest, ChatResponse, LlmClient, Role};
use crate::tools::Tool;

pub fn final_answer(answer: &str) -> String {
    serde_json::json!({"action": "final_answer", "answer": answer}).to_string()
}

pub fn delegate(coworker: &str, task: &str) -> String {
    serde_json::json!({
        "action": "delegate_work",
        "coworker": coworker,
        "task": task,
        "context": "",
    })
    .to_string()
}

pub fn ask(coworker: &str, question: &str, context: &str) -> String {
    serde_json::json!({
        "action": "ask_question",
        "coworker": coworker,
        "question": question,
        "context": context,
    })
    .to_string()
}

pub fn use_tool(tool: &str, input: serde_json::Value) -> String {
    serde_json::json!({"action": "use_tool", "tool": tool, "input": input}).to_string()
}

/// Role named in a request's system prompt.
pub fn speaker_role(request: &ChatRequest) -> Option<String> {
    request
        .messages
        .iter()
        .find(|m| m.role == Role::System)
        .and_then(|m| m.content.strip_prefix("You are "))
        .and_then(|rest| rest.split_once(". "))
        .map(|(role, _)| role.to_string())
}

/// Replays scripted replies per role and records every request.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<HashMap<String, VecDeque<String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the agent with `role`.
    pub fn reply(mut self, role: &str, content: &str) -> Self {
        self.replies
            .get_mut()
            .entry(role.to_string())
            .or_default()
            .push_back(content.to_string());
        self
    }

    pub async fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().await.clone()
    }

    /// Requests made on behalf of `role`.
    pub async fn requests_for(&self, role: &str) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|r| speaker_role(r).as_deref() == Some(role))
            .cloned()
            .collect()
    }

    pub async fn remaining(&self) -> usize {
        self.replies.lock().await.values().map(VecDeque::len).sum()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        self.requests.lock().await.push(request.clone());

        let role = speaker_role(request)
            .ok_or_else(|| AgentError::Llm("No role in system prompt".to_string()))?;
        let content = self
            .replies
            .lock()
            .await
            .get_mut(&role)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| AgentError::Llm(format!("Script exhausted for {role}")))?;

        Ok(ChatResponse {
            content,
            prompt_tokens: 10,
            completion_tokens: 5,
        })
    }
}

/// A tool that returns a fixed output (or always fails) and records its inputs.
pub struct StaticTool {
    kind: ToolKind,
    name: String,
    output: Option<String>,
    calls: Mutex<Vec<serde_json::Value>>,
}

impl StaticTool {
    pub fn new(kind: ToolKind, name: &str, output: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            output: Some(output.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(kind: ToolKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            output: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn calls(&self) -> Vec<serde_json::Value> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl Tool for StaticTool {
    fn kind(&self) -> ToolKind {
        self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Canned tool for tests"
    }

    async fn call(&self, input: &serde_json::Value) -> Result<String, AgentError> {
        self.calls.lock().await.push(input.clone());
        self.output
            .clone()
            .ok_or_else(|| AgentError::Tool(format!("{} is unavailable", self.name)))
    }
}

/// Everything a coordinator was handed for one run.
#[derive(Debug, Clone)]
pub struct RecordedRun {
    pub agents: Vec<Arc<AgentSpec>>,
    pub tasks: Vec<TaskSpec>,
    pub manager: ManagerConfig,
    pub inputs: CrewInputs,
}

/// Coordinator that records its calls and answers with one output per task.
#[derive(Default)]
pub struct RecordingCoordinator {
    runs: Mutex<Vec<RecordedRun>>,
}

impl RecordingCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn runs(&self) -> Vec<RecordedRun> {
        self.runs.lock().await.clone()
    }
}

#[async_trait]
impl Coordinator for RecordingCoordinator {
    async fn run(
        &self,
        agents: &[Arc<AgentSpec>],
        tasks: &[TaskSpec],
        manager: &ManagerConfig,
        inputs: &CrewInputs,
    ) -> Result<CrewOutput, AgentError> {
        let mut runs = self.runs.lock().await;
        runs.push(RecordedRun {
            agents: agents.to_vec(),
            tasks: tasks.to_vec(),
            manager: manager.clone(),
            inputs: inputs.clone(),
        });
        let run_number = runs.len();

        let outputs = tasks
            .iter()
            .map(|task| TaskOutput {
                description: task.description.clone(),
                expected_output: task.expected_output.clone(),
                agent: task.agent_role().to_string(),
                raw: format!("run {run_number}: {}", task.agent_role()),
                completed_at: chrono::Utc::now(),
            })
            .collect();

        Ok(CrewOutput::from_tasks(outputs, TokenUsage::default()))
    }
}
