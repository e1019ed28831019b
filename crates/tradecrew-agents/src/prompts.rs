use std::sync::Arc;

use tradecrew_models::run_input::render_input;
use tradecrew_models::{AgentSpec, CrewInputs, TaskOutput, TaskSpec};

use crate::tools::Tool;

pub const MANAGER_ROLE: &str = "Crew Manager";

pub const FORCE_FINAL_ANSWER: &str = "You have used all your allowed steps. Respond now with \
     a final_answer action containing the best answer you can give. No other action is allowed.";

/// The synthetic manager that runs the hierarchical process.
pub fn manager_agent() -> AgentSpec {
    AgentSpec::new(
        MANAGER_ROLE,
        "Manage the team to complete the task in the best way possible.",
        "You are a seasoned manager with a knack for getting the best out of your team. \
         You are known for your ability to delegate work to the right people, and to ask \
         the right questions to get the best out of your team. Even though you don't perform \
         tasks by yourself, you have a lot of experience in the field, which allows you to \
         properly evaluate the work of your team members.",
    )
    .with_delegation(true)
}

/// Replace `{key}` placeholders with input values. Unknown placeholders are
/// left as they are.
pub fn interpolate(template: &str, inputs: &CrewInputs) -> String {
    let mut out = template.to_string();
    for (key, value) in inputs {
        let placeholder = format!("{{{key}}}");
        if out.contains(&placeholder) {
            out = out.replace(&placeholder, &render_input(value));
        }
    }
    out
}

/// Copy of an agent with its text fields interpolated.
pub fn interpolate_agent(agent: &AgentSpec, inputs: &CrewInputs) -> AgentSpec {
    AgentSpec {
        role: interpolate(&agent.role, inputs),
        goal: interpolate(&agent.goal, inputs),
        backstory: interpolate(&agent.backstory, inputs),
        ..agent.clone()
    }
}

fn action_format(has_tools: bool, may_delegate: bool) -> String {
    let mut actions = Vec::new();
    if has_tools {
        actions.push(
            r#"{"action": "use_tool", "tool": "<tool name>", "input": {<tool arguments>}}"#,
        );
    }
    if may_delegate {
        actions.push(
            r#"{"action": "delegate_work", "coworker": "<coworker role>", "task": "<what they should do>", "context": "<everything they need to know>"}"#,
        );
        actions.push(
            r#"{"action": "ask_question", "coworker": "<coworker role>", "question": "<your question>", "context": "<everything they need to know>"}"#,
        );
    }
    actions.push(r#"{"action": "final_answer", "answer": "<your complete final answer>"}"#);

    format!(
        "## RESPONSE FORMAT\n\n\
         Reply with exactly ONE JSON object per message, choosing one of:\n{}\n\n\
         After a tool or coworker replies you will receive an Observation. Keep going until \
         you can give your final answer. The final answer must be complete; it is all that \
         will be passed on.",
        actions.join("\n")
    )
}

/// System prompt for an agent (or the manager).
pub fn agent_system_prompt(
    agent: &AgentSpec,
    tools: &[Arc<dyn Tool>],
    coworkers: &[Arc<AgentSpec>],
) -> String {
    let mut prompt = format!(
        "You are {}. {}\nYour personal goal is: {}\n",
        agent.role, agent.backstory, agent.goal
    );

    if !tools.is_empty() {
        prompt.push_str("\n## TOOLS\n\n");
        for tool in tools {
            prompt.push_str(&format!("- {}: {}\n", tool.name(), tool.description()));
        }
    }

    if !coworkers.is_empty() {
        prompt.push_str("\n## COWORKERS\n\n");
        for coworker in coworkers {
            prompt.push_str(&format!("- {}: {}\n", coworker.role, coworker.goal));
        }
        prompt.push_str(
            "\nCoworkers know nothing about your task; give them all the context they need.\n",
        );
    }

    prompt.push('\n');
    prompt.push_str(&action_format(!tools.is_empty(), !coworkers.is_empty()));
    prompt
}

fn render_inputs(inputs: &CrewInputs) -> String {
    inputs
        .iter()
        .map(|(key, value)| format!("- {key}: {}", render_input(value)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The manager's opening message for one task.
pub fn manager_task_prompt(
    task: &TaskSpec,
    inputs: &CrewInputs,
    previous: &[TaskOutput],
) -> String {
    let mut prompt = format!(
        "Current task: {}\n\n\
         This is the expected criteria for your final answer: {}\n\n\
         The team member best suited for this task is: {}\n",
        interpolate(&task.description, inputs),
        interpolate(&task.expected_output, inputs),
        interpolate(task.agent_role(), inputs),
    );

    if !inputs.is_empty() {
        prompt.push_str(&format!("\nInputs:\n{}\n", render_inputs(inputs)));
    }

    if !previous.is_empty() {
        prompt.push_str("\nThis is the context you're working with (results of earlier tasks):\n");
        for output in previous {
            prompt.push_str(&format!(
                "\n### {} ({})\n{}\n",
                output.description, output.agent, output.raw
            ));
        }
    }

    prompt
}

/// Opening message of a coworker that was handed work or a question.
pub fn delegated_prompt(work: &str, context: &str) -> String {
    if context.trim().is_empty() {
        format!("Current task: {work}")
    } else {
        format!("Current task: {work}\n\nThis is the context you're working with:\n{context}")
    }
}

pub fn observation(text: &str) -> String {
    format!("Observation: {text}")
}
