use serde::{Deserialize, Serialize};

/// External capability an agent may be handed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    WebSearch,
    WebScrape,
}

/// A role-labeled agent descriptor. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSpec {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    /// Whether the agent may hand work to (or ask questions of) coworkers.
    pub allow_delegation: bool,
    /// Log this agent's steps at info level instead of debug.
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub tools: Vec<ToolKind>,
}

impl AgentSpec {
    pub fn new(role: &str, goal: &str, backstory: &str) -> Self {
        Self {
            role: role.to_string(),
            goal: goal.to_string(),
            backstory: backstory.to_string(),
            allow_delegation: false,
            verbose: false,
            tools: vec![],
        }
    }

    pub fn with_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_tools(mut self, tools: &[ToolKind]) -> Self {
        self.tools = tools.to_vec();
        self
    }

    /// Case-insensitive role comparison, ignoring surrounding whitespace.
    pub fn has_role(&self, role: &str) -> bool {
        self.role.trim().eq_ignore_ascii_case(role.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_flags_and_tools() {
        let agent = AgentSpec::new("Data Analyst", "Analyze", "Quant")
            .with_delegation(true)
            .with_verbose(true)
            .with_tools(&[ToolKind::WebScrape, ToolKind::WebSearch]);

        assert!(agent.allow_delegation);
        assert!(agent.verbose);
        assert_eq!(agent.tools, vec![ToolKind::WebScrape, ToolKind::WebSearch]);
    }

    #[test]
    fn role_match_ignores_case_and_padding() {
        let agent = AgentSpec::new("Risk Advisor", "g", "b");
        assert!(agent.has_role("risk advisor"));
        assert!(agent.has_role("  RISK ADVISOR "));
        assert!(!agent.has_role("Risk"));
    }

    #[test]
    fn tool_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ToolKind::WebSearch).unwrap();
        assert_eq!(json, "\"web_search\"");
    }

    #[test]
    fn agent_from_json_defaults_optional_fields() {
        let agent: AgentSpec = serde_json::from_str(
            r#"{"role": "Trade Advisor", "goal": "g", "backstory": "b", "allow_delegation": true}"#,
        )
        .unwrap();
        assert!(!agent.verbose);
        assert!(agent.tools.is_empty());
    }
}
