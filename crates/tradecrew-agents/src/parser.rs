use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::AgentError;

/// Deserialize the first JSON object in a model reply that has the shape of `T`.
///
/// Candidates are tried in order: the whole reply, the body of a fenced code
/// block, then every top-level `{...}` span. Spans that are not JSON (template
/// placeholders, prose in braces) or that are JSON of another shape (tool
/// arguments quoted in the reasoning) are skipped.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Result<T, AgentError> {
    let trimmed = text.trim();
    let mut mismatch: Option<String> = None;

    for candidate in json_candidates(trimmed) {
        let value: serde_json::Value = match serde_json::from_str(candidate) {
            Ok(value) => value,
            Err(_) => continue,
        };
        match serde_json::from_value(value) {
            Ok(parsed) => return Ok(parsed),
            Err(e) => {
                mismatch.get_or_insert_with(|| format!("{e}\nJSON: {candidate}"));
            }
        }
    }

    Err(match mismatch {
        Some(detail) => AgentError::Parse(format!("Invalid action: {detail}")),
        None => AgentError::Parse(format!(
            "No valid JSON object found in response (length={})",
            text.len()
        )),
    })
}

fn json_candidates(text: &str) -> Vec<&str> {
    let mut candidates = Vec::new();
    if text.starts_with('{') {
        candidates.push(text);
    }
    candidates.extend(fenced_block(text));
    candidates.extend(balanced_objects(text));
    candidates
}

/// Body of the first ```json or bare ``` fence.
fn fenced_block(text: &str) -> Option<&str> {
    ["```json\n", "```json\r\n", "```\n", "```\r\n"]
        .iter()
        .find_map(|marker| {
            let body = &text[text.find(marker)? + marker.len()..];
            body.find("```").map(|end| body[..end].trim())
        })
}

/// All top-level balanced { ... } spans in the text, in order.
fn balanced_objects(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            // Quotes outside an object are prose, not string delimiters.
            '"' if depth > 0 => in_string = !in_string,
            '{' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if !in_string && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        spans.push(&text[s..=i]);
                    }
                }
            }
            _ => {}
        }
    }

    spans
}

/// One step chosen by an agent (or the manager).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AgentAction {
    UseTool {
        tool: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    DelegateWork {
        coworker: String,
        task: String,
        #[serde(default)]
        context: String,
    },
    AskQuestion {
        coworker: String,
        question: String,
        #[serde(default)]
        context: String,
    },
    FinalAnswer {
        answer: String,
    },
}

/// Parse the action object out of a raw model reply.
pub fn parse_action(raw: &str) -> Result<AgentAction, AgentError> {
    extract_json(raw)
}
