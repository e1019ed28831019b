use std::sync::Arc;

use tracing::{debug, info, warn};
use tradecrew_models::{AgentSpec, TokenUsage};

use crate::error::AgentError;
use crate::llm::{ChatMessage, ChatRequest, LlmClient};
use crate::parser::{parse_action, AgentAction};
use crate::prompts::{agent_system_prompt, observation, FORCE_FINAL_ANSWER};
use crate::tools::Tool;

/// Model and sampling settings for one participant.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: Option<f32>,
}

/// What an execution wants next after one model call.
pub enum Step {
    /// The model used a tool or sent something unusable; call it again.
    Continue,
    /// Hand work to a coworker and feed its answer back here.
    Delegate {
        coworker: Arc<AgentSpec>,
        work: String,
        context: String,
    },
    Finished(String),
}

/// The conversation of one agent working on one piece of work.
pub struct Execution {
    agent: Arc<AgentSpec>,
    settings: ModelSettings,
    tools: Vec<Arc<dyn Tool>>,
    coworkers: Vec<Arc<AgentSpec>>,
    messages: Vec<ChatMessage>,
    iterations: u32,
    max_iterations: u32,
}

impl Execution {
    /// Start an execution. An empty `coworkers` list means the agent may not
    /// delegate.
    pub fn new(
        agent: Arc<AgentSpec>,
        settings: ModelSettings,
        tools: Vec<Arc<dyn Tool>>,
        coworkers: Vec<Arc<AgentSpec>>,
        opening: String,
        max_iterations: u32,
    ) -> Self {
        let system = agent_system_prompt(&agent, &tools, &coworkers);
        Self {
            agent,
            settings,
            tools,
            coworkers,
            messages: vec![ChatMessage::system(system), ChatMessage::user(opening)],
            iterations: 0,
            max_iterations,
        }
    }

    pub fn agent(&self) -> &AgentSpec {
        &self.agent
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn may_delegate(&self) -> bool {
        !self.coworkers.is_empty()
    }

    /// Append an observation for the next model call.
    pub fn observe(&mut self, text: &str) {
        self.messages.push(ChatMessage::user(observation(text)));
    }

    async fn call(
        &mut self,
        llm: &dyn LlmClient,
        usage: &mut TokenUsage,
    ) -> Result<String, AgentError> {
        let request = ChatRequest {
            model: self.settings.model.clone(),
            temperature: self.settings.temperature,
            messages: self.messages.clone(),
        };
        let response = llm.chat(&request).await?;
        usage.record(response.prompt_tokens, response.completion_tokens);

        if self.agent.verbose {
            info!(agent = %self.agent.role, step = self.iterations, reply = %response.content, "Agent step");
        } else {
            debug!(agent = %self.agent.role, step = self.iterations, reply = %response.content, "Agent step");
        }

        self.messages
            .push(ChatMessage::assistant(response.content.clone()));
        Ok(response.content)
    }

    /// Make one model call and interpret the reply.
    pub async fn advance(
        &mut self,
        llm: &dyn LlmClient,
        usage: &mut TokenUsage,
    ) -> Result<Step, AgentError> {
        if self.iterations >= self.max_iterations {
            warn!(agent = %self.agent.role, iterations = self.iterations, "Iteration limit reached, forcing final answer");
            self.messages.push(ChatMessage::user(FORCE_FINAL_ANSWER));
            let reply = self.call(llm, usage).await?;
            let answer = match parse_action(&reply) {
                Ok(AgentAction::FinalAnswer { answer }) => answer,
                _ => reply.trim().to_string(),
            };
            return Ok(Step::Finished(answer));
        }

        self.iterations += 1;
        let reply = self.call(llm, usage).await?;

        let action = match parse_action(&reply) {
            Ok(action) => action,
            Err(e) => {
                debug!(agent = %self.agent.role, error = %e, "Unparseable action");
                self.observe(&format!(
                    "Your reply could not be understood ({e}). Reply with exactly one JSON \
                     action object as described in the response format."
                ));
                return Ok(Step::Continue);
            }
        };

        match action {
            AgentAction::FinalAnswer { answer } => Ok(Step::Finished(answer)),
            AgentAction::UseTool { tool, input } => {
                let result = self.use_tool(&tool, &input).await;
                self.observe(&result);
                Ok(Step::Continue)
            }
            AgentAction::DelegateWork {
                coworker,
                task,
                context,
            } => Ok(self.delegate(&coworker, task, context)),
            AgentAction::AskQuestion {
                coworker,
                question,
                context,
            } => Ok(self.delegate(&coworker, question, context)),
        }
    }

    /// Run a tool. Failures become observation text so the model can recover.
    async fn use_tool(&self, name: &str, input: &serde_json::Value) -> String {
        let Some(tool) = self.tools.iter().find(|t| t.name() == name.trim()) else {
            let available: Vec<&str> = self.tools.iter().map(|t| t.name()).collect();
            return if available.is_empty() {
                format!("Error: you have no tools; '{name}' cannot be used.")
            } else {
                format!(
                    "Error: unknown tool '{name}'. Available tools: {}",
                    available.join(", ")
                )
            };
        };

        debug!(agent = %self.agent.role, tool = %name, "Using tool");
        match tool.call(input).await {
            Ok(output) => output,
            Err(e) => {
                warn!(agent = %self.agent.role, tool = %name, error = %e, "Tool failed");
                format!("Error: tool '{name}' failed: {e}")
            }
        }
    }

    fn delegate(&mut self, coworker: &str, work: String, context: String) -> Step {
        if self.coworkers.is_empty() {
            self.observe("Error: you cannot delegate work or ask questions; complete the task yourself.");
            return Step::Continue;
        }

        match self.coworkers.iter().find(|c| c.has_role(coworker)) {
            Some(found) => Step::Delegate {
                coworker: Arc::clone(found),
                work,
                context,
            },
            None => {
                let roles: Vec<&str> = self.coworkers.iter().map(|c| c.role.as_str()).collect();
                let message = format!(
                    "Error: there is no coworker named '{coworker}'. Choose one of: {}",
                    roles.join(", ")
                );
                self.observe(&message);
                Step::Continue
            }
        }
    }
}
