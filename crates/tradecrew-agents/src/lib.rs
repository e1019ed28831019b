pub mod coordinator;
pub mod error;
pub mod execution;
pub mod llm;
pub mod parser;
pub mod prompts;
pub mod tools;

pub mod test_support;

pub use coordinator::{Coordinator, HierarchicalCoordinator};
pub use error::AgentError;
pub use llm::{ChatMessage, ChatRequest, ChatResponse, LlmClient, OpenAiClient};
pub use tools::{ScrapeWebsiteTool, SerperSearchTool, Tool, ToolBox};
