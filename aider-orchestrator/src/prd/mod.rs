//! PRD generation pipeline
//!
//! Repository context → prompt → LLM → parsed PRD text and agent breakdown.
//!
//! - [`types`] - `AgentTask`, `AgentBreakdown`, `PrdResult`
//! - [`prompt`] - prompt rendering
//! - [`parser`] - response parsing and breakdown validation

pub mod parser;
pub mod prompt;
pub mod types;

use std::path::Path;

use aider_orchestrator_sdk::{log_debug, log_error, log_info, log_warning};
use thiserror::Error;

use crate::context::{collect_repo_context, ContextError};
use crate::llm::{GenerationParams, LlmClient, LlmError};

pub use parser::{parse_prd_response, validate_breakdown, BreakdownError, ParsedResponse};
pub use prompt::build_prd_prompt;
pub use types::{AgentBreakdown, AgentTask, PrdResult};

#[derive(Debug, Error)]
pub enum PrdError {
    #[error("Failed to get repository context: {0}")]
    Context(#[from] ContextError),

    #[error("Failed to call PRD generator LLM: {0}")]
    Llm(#[from] LlmError),

    #[error("LLM response was empty or completely failed parsing")]
    EmptyResponse,
}

/// Collect context for `repo_path`, then generate the PRD
pub async fn generate_prd(
    proposed_change: &str,
    repo_path: &Path,
    llm: &dyn LlmClient,
    params: &GenerationParams,
    debug: bool,
) -> Result<PrdResult, PrdError> {
    let repo_context = collect_repo_context(repo_path).await?;
    generate_prd_with_context(proposed_change, &repo_context, llm, params, debug).await
}

/// Generate the PRD from an already collected context blob
pub async fn generate_prd_with_context(
    proposed_change: &str,
    repo_context: &str,
    llm: &dyn LlmClient,
    params: &GenerationParams,
    debug: bool,
) -> Result<PrdResult, PrdError> {
    log_info!("Starting PRD generation process...");

    let prompt = build_prd_prompt(proposed_change, repo_context);
    if debug {
        log_debug!("Prompt length: {} chars", prompt.chars().count());
    }

    log_info!("Calling LLM: {} (Model: {})", llm.provider(), llm.model());
    let raw_response = llm.generate(&prompt, params).await.map_err(|e| {
        log_error!("Error calling LLM {}: {}", llm.provider(), e);
        e
    })?;
    if debug {
        log_debug!("Response length: {} chars", raw_response.chars().count());
    }

    let ParsedResponse {
        prd_text,
        breakdown,
    } = parse_prd_response(&raw_response);

    let result = PrdResult {
        prd_text,
        breakdown,
        raw_response,
    };
    if result.is_empty() {
        log_error!("LLM response was empty or completely failed parsing.");
        return Err(PrdError::EmptyResponse);
    }
    if result.breakdown.is_none() {
        log_warning!(
            "PRD generated, but failed to get a valid agent breakdown structure from the LLM."
        );
    }

    log_info!("PRD generation complete.");
    Ok(result)
}
