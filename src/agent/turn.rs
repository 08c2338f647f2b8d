//! One chat turn: invoke the agent, then summarize which tools mattered.

use super::executor::{AgentExecutor, IntermediateStep};
use crate::error::Result;
use crate::session::ChatMessage;
use crate::tools::CSV_REPL;
use serde::Serialize;
use tracing::debug;

/// Observations must be longer than this (after trimming) to count as use.
pub const MIN_OBSERVATION_CHARS: usize = 30;

/// Marker shown when no tool qualifies.
pub const NO_TOOLS: &str = "없음";

/// Outcome of one turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResult {
    /// The agent's final answer.
    pub answer: String,
    /// Tools that meaningfully contributed, in first-use order.
    pub used_tools: Vec<String>,
    /// Raw trace of the invocation.
    pub steps: Vec<IntermediateStep>,
    /// Answer and tool summary formatted for display.
    pub reply: String,
}

/// Tools that meaningfully contributed to an answer.
///
/// `csv_repl` always counts because printed results are often short or empty.
/// Any other tool counts only if its trimmed observation is longer than
/// [`MIN_OBSERVATION_CHARS`] characters. Names are deduplicated keeping the
/// order of first appearance.
pub fn used_tools(steps: &[IntermediateStep]) -> Vec<String> {
    let mut used: Vec<String> = Vec::new();
    for step in steps {
        let counts = step.tool == CSV_REPL
            || step.observation.trim().chars().count() > MIN_OBSERVATION_CHARS;
        if counts && !used.contains(&step.tool) {
            used.push(step.tool.clone());
        }
    }
    used
}

/// Combine the answer with the tool summary.
pub fn format_reply(answer: &str, tools: &[String]) -> String {
    let tools = if tools.is_empty() {
        NO_TOOLS.to_string()
    } else {
        tools.join(", ")
    };
    format!(" 답변:\n{}\n\n 사용된 툴: {}", answer, tools)
}

/// Run one question through the agent.
///
/// Errors from the invocation propagate unchanged.
pub async fn run_turn(
    executor: &AgentExecutor,
    question: &str,
    history: &[ChatMessage],
) -> Result<TurnResult> {
    let output = executor.invoke(question, history).await?;
    let used = used_tools(&output.intermediate_steps);
    debug!("Used tools: {:?}", used);

    Ok(TurnResult {
        reply: format_reply(&output.output, &used),
        answer: output.output,
        used_tools: used,
        steps: output.intermediate_steps,
    })
}
