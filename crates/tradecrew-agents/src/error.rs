use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Agent response parse error: {0}")]
    Parse(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Invalid crew: {0}")]
    InvalidCrew(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
