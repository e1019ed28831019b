use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;
use tradecrew_models::{AgentSpec, ScrapeConfig, SearchConfig, ToolKind};

use crate::error::AgentError;

/// A capability an agent can invoke by name.
#[async_trait]
pub trait Tool: Send + Sync {
    fn kind(&self) -> ToolKind;
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    async fn call(&self, input: &serde_json::Value) -> Result<String, AgentError>;
}

/// Pull a string argument out of a tool input. Accepts either
/// `{"<field>": "..."}` or a bare JSON string.
fn string_arg(input: &serde_json::Value, field: &str) -> Result<String, AgentError> {
    let value = match input {
        serde_json::Value::String(s) => Some(s.as_str()),
        serde_json::Value::Object(map) => map.get(field).and_then(|v| v.as_str()),
        _ => None,
    };
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AgentError::Tool(format!("Missing required argument: {field}")))
}

/// Web search backed by the Serper API.
pub struct SerperSearchTool {
    base_url: String,
    api_key: String,
    n_results: u32,
    http: reqwest::Client,
}

impl SerperSearchTool {
    pub fn new(config: &SearchConfig, api_key: String) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            n_results: config.n_results,
            http,
        })
    }
}

#[derive(Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

fn format_search_results(results: &[OrganicResult]) -> String {
    if results.is_empty() {
        return "No results found.".to_string();
    }
    results
        .iter()
        .map(|r| format!("Title: {}\nLink: {}\nSnippet: {}", r.title, r.link, r.snippet))
        .collect::<Vec<_>>()
        .join("\n---\n")
}

#[async_trait]
impl Tool for SerperSearchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::WebSearch
    }

    fn name(&self) -> &str {
        "search_the_internet"
    }

    fn description(&self) -> &str {
        "Search the internet for a query. Input: {\"search_query\": \"<query>\"}"
    }

    async fn call(&self, input: &serde_json::Value) -> Result<String, AgentError> {
        let query = string_arg(input, "search_query")?;
        debug!(query = %query, "Searching the web");

        let response = self
            .http
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .json(&serde_json::json!({"q": query, "num": self.n_results}))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Tool(format!("Search API error ({status}): {body}")));
        }

        let parsed: SerperResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Tool(format!("Failed to parse search response: {e}")))?;

        Ok(format_search_results(&parsed.organic))
    }
}

/// Fetches a page and returns its readable text.
pub struct ScrapeWebsiteTool {
    max_chars: usize,
    http: reqwest::Client,
    html: HtmlText,
}

impl ScrapeWebsiteTool {
    pub fn new(config: &ScrapeConfig) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            max_chars: config.max_chars,
            http,
            html: HtmlText::new()?,
        })
    }
}

#[async_trait]
impl Tool for ScrapeWebsiteTool {
    fn kind(&self) -> ToolKind {
        ToolKind::WebScrape
    }

    fn name(&self) -> &str {
        "read_website_content"
    }

    fn description(&self) -> &str {
        "Read the text content of a website. Input: {\"website_url\": \"<url>\"}"
    }

    async fn call(&self, input: &serde_json::Value) -> Result<String, AgentError> {
        let url = string_arg(input, "website_url")?;
        debug!(url = %url, "Scraping website");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Tool(format!("Fetching {url} failed with {status}")));
        }

        let body = response.text().await?;
        let text = self.html.extract(&body);
        Ok(truncate_chars(&text, self.max_chars))
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "head", "noscript"];

/// Reduces an HTML document to whitespace-collapsed text.
pub struct HtmlText {
    skipped: Vec<Regex>,
    tag: Regex,
    whitespace: Regex,
}

impl HtmlText {
    pub fn new() -> Result<Self, regex::Error> {
        let skipped = SKIPPED_ELEMENTS
            .iter()
            .map(|name| Regex::new(&format!(r"(?is)<{name}\b[^>]*>.*?</{name}\s*>")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            skipped,
            tag: Regex::new(r"<[^>]+>")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    pub fn extract(&self, html: &str) -> String {
        let mut text = html.to_string();
        for block in &self.skipped {
            text = block.replace_all(&text, " ").into_owned();
        }
        let text = self.tag.replace_all(&text, " ");
        // Entities are decoded after tags are gone so `&lt;` cannot open one.
        let text = decode_entities(&text);
        self.whitespace.replace_all(&text, " ").trim().to_string()
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Tool implementations keyed by kind.
#[derive(Clone, Default)]
pub struct ToolBox {
    tools: HashMap<ToolKind, Arc<dyn Tool>>,
}

impl ToolBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.insert(tool.kind(), tool);
        self
    }

    /// The tools an agent was handed, in the agent's order. Kinds with no
    /// registered implementation are skipped.
    pub fn for_agent(&self, agent: &AgentSpec) -> Vec<Arc<dyn Tool>> {
        agent
            .tools
            .iter()
            .filter_map(|kind| self.tools.get(kind).cloned())
            .collect()
    }
}
