//! Integration tests against the real OpenAI and Serper APIs.
//!
//! These tests are `#[ignore]` by default. They require:
//! - `OPENAI_API_KEY` and `SERPER_API_KEY` in the environment
//! - Network access
//!
//! Run explicitly with:
//! ```bash
//! cargo test -p tradecrew-agents --test live_api -- --ignored
//! ```

use tradecrew_agents::llm::{ChatMessage, ChatRequest, LlmClient, OpenAiClient};
use tradecrew_agents::parser::{parse_action, AgentAction};
use tradecrew_agents::tools::{SerperSearchTool, Tool};
use tradecrew_models::{Credentials, LlmConfig, SearchConfig};

fn credentials() -> Option<Credentials> {
    match Credentials::from_env() {
        Ok(creds) => Some(creds),
        Err(e) => {
            eprintln!("Skipping: {e}");
            None
        }
    }
}

/// Ask the model for an action object and verify the parser understands it.
///
/// This catches drift in how the model formats replies (new wrapping, prose
/// around the JSON) before it shows up as stalled crews.
#[tokio::test]
#[ignore]
async fn model_reply_is_a_parseable_action() {
    let Some(creds) = credentials() else { return };

    let client = OpenAiClient::new(&LlmConfig::default(), creds.openai_api_key)
        .expect("client should build");

    let request = ChatRequest {
        model: "gpt-3.5-turbo".to_string(),
        temperature: Some(0.0),
        messages: vec![
            ChatMessage::system(concat!(
                "You are a test agent. Respond ONLY with a JSON object, no other text.\n",
                "The object must be: {\"action\": \"final_answer\", \"answer\": \"ok\"}\n",
            )),
            ChatMessage::user("ping"),
        ],
    };

    let response = client.chat(&request).await.expect("chat completion failed");
    let action = parse_action(&response.content).unwrap_or_else(|e| {
        panic!(
            "Failed to parse action: {e}\nRaw reply:\n---\n{}\n---",
            response.content
        )
    });

    assert!(
        matches!(action, AgentAction::FinalAnswer { .. }),
        "Unexpected action: {action:?}"
    );
    assert!(response.prompt_tokens > 0);
}

/// An unknown model must surface as an error, not an empty answer.
#[tokio::test]
#[ignore]
async fn unknown_model_is_an_error() {
    let Some(creds) = credentials() else { return };

    let client = OpenAiClient::new(&LlmConfig::default(), creds.openai_api_key)
        .expect("client should build");
    let request = ChatRequest {
        model: "nonexistent-model-12345".to_string(),
        temperature: None,
        messages: vec![ChatMessage::user("hello")],
    };

    let result = client.chat(&request).await;
    assert!(result.is_err(), "Expected error, got: {:?}", result.unwrap());
}

#[tokio::test]
#[ignore]
async fn serper_search_returns_results() {
    let Some(creds) = credentials() else { return };

    let tool = SerperSearchTool::new(&SearchConfig::default(), creds.serper_api_key)
        .expect("tool should build");
    let output = tool
        .call(&serde_json::json!({"search_query": "AAPL stock"}))
        .await
        .expect("search failed");

    assert!(output.contains("Title:"), "Unexpected output: {output}");
}
