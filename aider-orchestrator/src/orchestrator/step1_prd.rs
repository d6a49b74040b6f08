//! Step 1: Generate the PRD and agent breakdown
//!
//! Collects repository context (unless supplied), asks the PRD generator LLM
//! for a PRD plus a JSON work plan, and prints an overview for the operator.

use std::path::Path;

use aider_orchestrator_sdk::{log_info, log_phase_start_console, log_warning};

use crate::llm::{GenerationParams, LlmClient};
use crate::orchestrator::utils::{file_size_info, preview_lines, truncate_chars};
use crate::prd::{generate_prd, generate_prd_with_context, PrdError, PrdResult};

/// Lines of PRD shown in the overview
const PRD_PREVIEW_LINES: usize = 10;

/// Characters of each task description shown in the overview
const TASK_PREVIEW_CHARS: usize = 100;

/// Generate the PRD for `proposed_change`.
///
/// `repo_context` skips collection when the caller already has the blob.
pub async fn step1_generate_prd(
    proposed_change: &str,
    repo_path: &Path,
    repo_context: Option<&str>,
    llm: &dyn LlmClient,
    params: &GenerationParams,
    debug: bool,
) -> Result<PrdResult, PrdError> {
    log_phase_start_console!(
        1,
        "PRD Generation",
        "Generate PRD and agent breakdown from repository context"
    );

    match repo_context {
        Some(context) => {
            generate_prd_with_context(proposed_change, context, llm, params, debug).await
        }
        None => generate_prd(proposed_change, repo_path, llm, params, debug).await,
    }
}

/// Print the PRD preview and the planned agents
pub fn display_prd_overview(result: &PrdResult, repo_path: &Path) {
    println!("\n--- Generated PRD (preview) ---");
    let lines = preview_lines(&result.prd_text, PRD_PREVIEW_LINES);
    for line in &lines {
        println!("{}", line);
    }
    if result.prd_text.lines().filter(|l| !l.trim().is_empty()).count() > lines.len() {
        println!("... (full PRD stored in the run state file)");
    }
    println!("-------------------------------\n");

    let Some(breakdown) = &result.breakdown else {
        log_warning!("No valid agent breakdown was produced.");
        return;
    };

    log_info!(
        "Suggested number of agents: {} (agents defined: {})",
        breakdown.suggested_num_agents,
        breakdown.agents.len()
    );

    for agent in &breakdown.agents {
        let sizes = file_size_info(repo_path, &agent.target_files);
        println!(
            "  Agent {}: {}",
            agent.agent_id,
            truncate_chars(&agent.task_description, TASK_PREVIEW_CHARS)
        );
        println!(
            "    Target files: {} ({})",
            agent.target_files.len(),
            sizes.total_display()
        );
    }
    println!();
}
