use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const SERPER_API_KEY_VAR: &str = "SERPER_API_KEY";

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing credential: {0} is not set or is empty")]
    MissingCredential(String),
}

/// Top-level configuration. Built once at startup and never mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CrewConfig {
    pub llm: LlmConfig,
    pub manager: ManagerConfig,
    pub search: SearchConfig,
    pub scrape: ScrapeConfig,
    pub process: ProcessConfig,
}

/// Chat-completion endpoint used by the worker agents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    /// Default model for every agent.
    pub model: String,
    /// Sampling temperature for agents. None = provider default.
    pub temperature: Option<f32>,
    pub timeout_seconds: u64,
    /// Retries on 429 and 5xx responses.
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries.
    pub retry_backoff_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            timeout_seconds: 120,
            max_retries: 3,
            retry_backoff_ms: 500,
        }
    }
}

/// Model settings of the manager that runs the hierarchical process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ManagerConfig {
    pub model: String,
    pub temperature: f32,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    /// Number of organic results requested per query.
    pub n_results: u32,
    pub timeout_seconds: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://google.serper.dev".to_string(),
            n_results: 10,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScrapeConfig {
    pub timeout_seconds: u64,
    /// Page text beyond this many characters is cut off.
    pub max_chars: usize,
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_chars: 20_000,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) tradecrew/0.1".to_string(),
        }
    }
}

/// Bounds of the hierarchical process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProcessConfig {
    /// Model calls allowed per agent execution before a final answer is forced.
    pub max_iterations: u32,
    /// Nested delegation levels below the manager (manager -> agent -> coworker = 2).
    pub max_delegation_depth: usize,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            max_delegation_depth: 2,
        }
    }
}

/// API keys read once from the environment.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub openai_api_key: String,
    pub serper_api_key: String,
}

impl Credentials {
    /// Read both keys from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read both keys through `lookup`. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingCredential(var.to_string()))
        };

        Ok(Self {
            openai_api_key: require(OPENAI_API_KEY_VAR)?,
            serper_api_key: require(SERPER_API_KEY_VAR)?,
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &"<redacted>")
            .field("serper_api_key", &"<redacted>")
            .finish()
    }
}
