//! PRD response parsing and agent breakdown validation
//!
//! The model is asked to write the PRD as markdown followed by a bare JSON
//! breakdown object. Two extraction strategies are tried in order:
//!
//! 1. Brace scan: the span from the first `{` to the last `}`.
//! 2. Fence scan: the first ```` ```json ```` block, when the brace span is
//!    not valid JSON (prose after the object, stray braces, ...).
//!
//! A located object is then validated as a whole. Any structural problem,
//! top-level or in a single agent entry, discards the entire breakdown and
//! the full raw response becomes the PRD text.

use std::collections::HashSet;

use aider_orchestrator_sdk::{log_error, log_info, log_warning};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use super::types::{AgentBreakdown, AgentTask};

/// First fenced json block, non-greedy, spanning newlines
const JSON_FENCE_PATTERN: &str = r"(?s)```json\s*(\{.*?\})\s*```";

static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(JSON_FENCE_PATTERN).expect("JSON fence pattern is a valid regex"));

/// Reasons a located JSON value is rejected as a breakdown
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BreakdownError {
    #[error("breakdown is not a JSON object")]
    NotAnObject,

    #[error("breakdown is missing key '{0}'")]
    MissingKey(&'static str),

    #[error("'agents' is not an array")]
    AgentsNotArray,

    #[error("'suggested_num_agents' is not a non-negative integer")]
    InvalidSuggestedCount,

    #[error("invalid agent at index {index}: {reason}")]
    InvalidAgent { index: usize, reason: String },

    #[error("duplicate agent_id {0}")]
    DuplicateAgentId(u32),
}

/// PRD text and (optionally) a validated breakdown
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub prd_text: String,
    pub breakdown: Option<AgentBreakdown>,
}

impl ParsedResponse {
    /// No usable structure: the whole response is the PRD
    fn unstructured(raw: &str) -> Self {
        Self {
            prd_text: raw.to_string(),
            breakdown: None,
        }
    }
}

/// Split a raw LLM response into PRD text and an agent breakdown.
///
/// Pure: the same input always yields the same output. Failures never
/// propagate, they degrade to "no breakdown".
pub fn parse_prd_response(raw: &str) -> ParsedResponse {
    let Some((prd_text, candidate)) = locate_breakdown(raw) else {
        log_warning!(
            "Could not extract an agent breakdown. Proceeding without parallel agents might be necessary."
        );
        return ParsedResponse::unstructured(raw);
    };

    match validate_breakdown(&candidate) {
        Ok(breakdown) => ParsedResponse {
            prd_text,
            breakdown: Some(breakdown),
        },
        Err(e) => {
            log_error!("Parsed JSON does not match the agent breakdown structure: {}", e);
            ParsedResponse::unstructured(raw)
        }
    }
}

/// Find the candidate breakdown value and the prose that precedes it
fn locate_breakdown(raw: &str) -> Option<(String, Value)> {
    let (start, end) = match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => {
            log_error!("Could not find start/end braces for the agent breakdown JSON block");
            return None;
        }
    };

    match serde_json::from_str::<Value>(&raw[start..=end]) {
        Ok(value) => {
            log_info!("Parsed agent breakdown JSON from LLM response");
            Some((prose_before(raw, start), value))
        }
        Err(e) => {
            log_warning!("Could not parse JSON block directly: {}", e);
            locate_fenced_breakdown(raw)
        }
    }
}

/// Fallback: first ```json fenced block
fn locate_fenced_breakdown(raw: &str) -> Option<(String, Value)> {
    let Some(captures) = JSON_FENCE.captures(raw) else {
        log_error!("Agent breakdown JSON block not found in the response");
        return None;
    };
    let block = captures.get(0)?;
    let body = captures.get(1)?;

    match serde_json::from_str::<Value>(body.as_str()) {
        Ok(value) => {
            log_info!("Parsed agent breakdown JSON from markdown code block");
            Some((raw[..block.start()].trim().to_string(), value))
        }
        Err(e) => {
            log_error!("Failed to parse JSON from markdown block: {}", e);
            None
        }
    }
}

/// Prose before `index`, without a dangling fence opener.
///
/// When the object sits inside a fence the brace scan succeeds first, so the
/// opener line is still attached to the prose. Only a last line that opens
/// an unclosed fence is dropped; closed code samples stay intact.
fn prose_before(raw: &str, index: usize) -> String {
    let prose = raw[..index].trim_end();
    let fence_lines = prose
        .lines()
        .filter(|line| line.trim_start().starts_with("```"))
        .count();

    let last_line_start = prose.rfind('\n').map_or(0, |i| i + 1);
    let dangling_opener =
        fence_lines % 2 == 1 && prose[last_line_start..].trim_start().starts_with("```");

    let prose = if dangling_opener {
        &prose[..last_line_start]
    } else {
        prose
    };
    prose.trim().to_string()
}

/// Validate a JSON value as an agent breakdown, all or nothing
pub fn validate_breakdown(value: &Value) -> Result<AgentBreakdown, BreakdownError> {
    let object = value.as_object().ok_or(BreakdownError::NotAnObject)?;

    let suggested = object
        .get("suggested_num_agents")
        .ok_or(BreakdownError::MissingKey("suggested_num_agents"))?;
    let agents = object
        .get("agents")
        .ok_or(BreakdownError::MissingKey("agents"))?
        .as_array()
        .ok_or(BreakdownError::AgentsNotArray)?;

    let suggested_num_agents = suggested
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(BreakdownError::InvalidSuggestedCount)?;

    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(agents.len());
    for (index, agent) in agents.iter().enumerate() {
        let task = validate_agent(agent)
            .map_err(|reason| BreakdownError::InvalidAgent { index, reason })?;
        if !seen.insert(task.agent_id) {
            return Err(BreakdownError::DuplicateAgentId(task.agent_id));
        }
        tasks.push(task);
    }

    Ok(AgentBreakdown {
        suggested_num_agents,
        agents: tasks,
    })
}

fn validate_agent(value: &Value) -> Result<AgentTask, String> {
    let agent = value
        .as_object()
        .ok_or_else(|| "agent entry is not an object".to_string())?;

    let agent_id = require(agent, "agent_id")?;
    let task_description = require(agent, "task_description")?;
    let target_files = require(agent, "target_files")?
        .as_array()
        .ok_or_else(|| "'target_files' is not an array".to_string())?;

    let agent_id = agent_id
        .as_u64()
        .and_then(|id| u32::try_from(id).ok())
        .ok_or_else(|| "'agent_id' is not a non-negative integer".to_string())?;

    let task_description = task_description
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| "'task_description' is not a non-empty string".to_string())?
        .to_string();

    let target_files = target_files
        .iter()
        .map(|file| {
            file.as_str()
                .map(str::to_string)
                .ok_or_else(|| "'target_files' entry is not a string".to_string())
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AgentTask {
        agent_id,
        task_description,
        target_files,
    })
}

fn require<'a>(agent: &'a Map<String, Value>, key: &str) -> Result<&'a Value, String> {
    agent.get(key).ok_or_else(|| format!("missing key '{}'", key))
}
