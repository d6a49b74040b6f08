//! Agent log review
//!
//! Turns each agent's raw log into a completion verdict via a review LLM
//! call. Clearly failed agents (missing, unreadable or empty log) get a
//! local verdict without calling the LLM. Agents are reviewed
//! independently; one failure never blocks the others.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use aider_orchestrator_sdk::{
    log_agent_failed, log_agent_summarized, log_debug, log_error, log_info, log_parallel_complete,
    log_parallel_start, log_warning,
};
use serde::{Deserialize, Serialize};

use crate::launcher::agent_log_path;
use crate::llm::{GenerationParams, LlmClient};
use crate::prd::AgentTask;
use crate::workflow_utils::execute_batch_isolated;

/// Log prefix embedded in the review prompt
pub const MAX_LOG_CHARS: usize = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionStatus {
    Completed,
    #[serde(rename = "Partially Completed")]
    PartiallyCompleted,
    Failed,
    Unclear,
    Error,
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompletionStatus::Completed => "Completed",
            CompletionStatus::PartiallyCompleted => "Partially Completed",
            CompletionStatus::Failed => "Failed",
            CompletionStatus::Unclear => "Unclear",
            CompletionStatus::Error => "Error",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Review result for one agent.
///
/// `text` is what gets stored. LLM reviews are kept verbatim and carry no
/// typed verdict; locally decided reviews carry theirs in `verdict`.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentLogSummary {
    pub agent_id: u32,
    pub verdict: Option<(CompletionStatus, Grade)>,
    pub text: String,
}

impl AgentLogSummary {
    fn from_llm(agent_id: u32, text: String) -> Self {
        Self {
            agent_id,
            verdict: None,
            text,
        }
    }

    /// Verdict decided without the LLM, rendered in the review convention
    pub fn local(
        agent_id: u32,
        task: Option<&str>,
        status: CompletionStatus,
        grade: Grade,
        details: &str,
    ) -> Self {
        let mut text = format!("**Agent {} Summary:**\n", agent_id);
        if let Some(task) = task {
            text.push_str(&format!("**Task:** {}\n", task));
        }
        text.push_str(&format!(
            "**Status:** {}\n**Grade:** {}\n**Details:** {}",
            status, grade, details
        ));
        Self {
            agent_id,
            verdict: Some((status, grade)),
            text,
        }
    }

    pub fn used_llm(&self) -> bool {
        self.verdict.is_none()
    }
}

/// Collect summaries into the shape stored on the run record
pub fn into_summary_map(summaries: Vec<AgentLogSummary>) -> BTreeMap<u32, String> {
    summaries
        .into_iter()
        .map(|summary| (summary.agent_id, summary.text))
        .collect()
}

/// Keep the first `MAX_LOG_CHARS` characters of a log
fn log_prefix(log: &str) -> &str {
    match log.char_indices().nth(MAX_LOG_CHARS) {
        Some((byte_index, _)) => &log[..byte_index],
        None => log,
    }
}

pub fn build_summary_prompt(agent_id: u32, task_description: &str, log_content: &str) -> String {
    format!(
        r#"
You are an AI assistant reviewing the work of another AI coding agent (`aider`).
Analyze the following log file for Agent {id}, who was tasked with:

**Task Description:**
{task}

**Agent {id} Log:**
```log
{log}
```
(Log may be truncated)

**Instructions:**

1.  **Summarize:** Briefly describe what the agent attempted to do and what the outcome was according to the log.
2.  **Completion Status:** Did the agent successfully complete the assigned task based *only* on the information in this log? (e.g., Does it show successful application of changes? Does it end without errors related to the core task?) State clearly: "Completed", "Partially Completed", "Failed", or "Unclear".
3.  **Key Events/Changes:** Highlight significant actions, errors encountered, files created/modified, or decisions made by the agent. Mention any specific problems or reasons for failure if applicable.
4.  **Assign Grade:** Give a letter grade (A, B, C, D, F) reflecting how well the agent appeared to perform its specific task according to this log.
    *   A: Task seemingly completed successfully with no major issues noted.
    *   B: Task mostly completed, minor issues or workarounds noted.
    *   C: Task partially completed, significant issues or errors occurred.
    *   D: Agent attempted task but failed due to errors or inability to apply changes.
    *   F: Agent did not make progress, got stuck in loops, or produced unusable results based on the log.

**Output Format:**

Provide the summary in a clear, structured format. Example:

**Agent {id} Summary:**
**Task:** [Brief restatement of task]
**Status:** [Completed/Partially Completed/Failed/Unclear]
**Grade:** [A/B/C/D/F]
**Details:**
[Bulleted list or paragraph summarizing key events, changes, errors, and outcome based on the log.]
"#,
        id = agent_id,
        task = task_description,
        log = log_prefix(log_content),
    )
}

/// Reviews agent logs with one LLM client
#[derive(Clone)]
pub struct LogSummarizer {
    llm: Arc<dyn LlmClient>,
    params: GenerationParams,
    concurrency: usize,
    debug: bool,
}

impl LogSummarizer {
    pub fn new(llm: Arc<dyn LlmClient>, params: GenerationParams, concurrency: usize) -> Self {
        Self {
            llm,
            params,
            concurrency,
            debug: false,
        }
    }

    /// Log prompt and response sizes for every review
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Review one agent's log. Never fails: errors become an `Error`/`F` verdict.
    pub async fn summarize_agent(&self, agent: &AgentTask, log_file: &Path) -> AgentLogSummary {
        let id = agent.agent_id;
        log_info!("Summarizing log for Agent {} from: {}", id, log_file.display());

        let bytes = match tokio::fs::read(log_file).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log_error!("Log file not found: {}", log_file.display());
                return AgentLogSummary::local(
                    id,
                    None,
                    CompletionStatus::Error,
                    Grade::F,
                    &format!("Log file not found at {}.", log_file.display()),
                );
            }
            Err(e) => {
                log_error!("Error reading log file {}: {}", log_file.display(), e);
                return AgentLogSummary::local(
                    id,
                    None,
                    CompletionStatus::Error,
                    Grade::F,
                    &format!("Failed to read log file: {}", e),
                );
            }
        };

        let log_content = String::from_utf8_lossy(&bytes);
        if log_content.trim().is_empty() {
            log_warning!("Log file is empty: {}", log_file.display());
            return AgentLogSummary::local(
                id,
                Some(&agent.task_description),
                CompletionStatus::Unclear,
                Grade::F,
                "Log file is empty. Agent likely did not run or produced no output.",
            );
        }

        let prompt = build_summary_prompt(id, &agent.task_description, &log_content);
        if self.debug {
            log_debug!(
                "Agent {}: log {} chars, prompt {} chars",
                id,
                log_content.chars().count(),
                prompt.chars().count()
            );
        }
        match self.llm.generate(&prompt, &self.params).await {
            Ok(text) => {
                if self.debug {
                    log_debug!("Agent {}: review {} chars", id, text.chars().count());
                }
                AgentLogSummary::from_llm(id, text)
            }
            Err(e) => {
                log_error!("Failed to get summary for Agent {}: {}", id, e);
                AgentLogSummary::local(
                    id,
                    None,
                    CompletionStatus::Error,
                    Grade::F,
                    &format!("Failed to generate summary due to LLM call error: {}", e),
                )
            }
        }
    }

    /// Review every agent's log under `log_dir`, in agent order
    pub async fn summarize_all(
        &self,
        run_id: &str,
        agents: &[AgentTask],
        log_dir: &Path,
    ) -> Vec<AgentLogSummary> {
        log_parallel_start!(agents.len(), "log summaries");

        let items: Vec<(AgentTask, PathBuf)> = agents
            .iter()
            .map(|agent| (agent.clone(), agent_log_path(log_dir, agent.agent_id)))
            .collect();

        let summarizer = self.clone();
        let results = execute_batch_isolated(
            items,
            self.concurrency,
            move |(agent, log_file), ctx| {
                let summarizer = summarizer.clone();
                async move {
                    log_info!(
                        "[{}/{}] Reviewing Agent {}",
                        ctx.task_number,
                        ctx.total_tasks,
                        agent.agent_id
                    );
                    Ok(summarizer.summarize_agent(&agent, &log_file).await)
                }
            },
        )
        .await;

        let summaries: Vec<AgentLogSummary> = agents
            .iter()
            .zip(results)
            .map(|(agent, result)| {
                let summary = result.unwrap_or_else(|e| {
                    AgentLogSummary::local(
                        agent.agent_id,
                        None,
                        CompletionStatus::Error,
                        Grade::F,
                        &format!("Summarization task failed: {}", e),
                    )
                });
                match summary.verdict {
                    Some((CompletionStatus::Error, _)) => {
                        log_agent_failed!(run_id, agent.agent_id, summary.text);
                    }
                    _ => {
                        log_agent_summarized!(run_id, agent.agent_id, summary.used_llm());
                    }
                }
                summary
            })
            .collect();

        log_parallel_complete!(summaries.len(), "log summaries");
        summaries
    }
}
