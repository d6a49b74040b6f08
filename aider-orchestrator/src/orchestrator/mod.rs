//! Aider orchestration workflow.
//!
//! Drives a proposed change through PRD generation, approval, parallel agent
//! launch and (on a later invocation) log review.
//!
//! ## Module Structure
//!
//! - `cli` - Command-line argument definitions
//! - `utils` - Size formatting, previews and the yes/no prompt
//! - `step1_prd` - Generate PRD and agent breakdown
//! - `step2_launch` - Launch aider agents
//! - `step3_summarize` - Summarize agent logs
//! - `workflow` - Run/summarize orchestration and state persistence

pub mod cli;
pub mod step1_prd;
pub mod step2_launch;
pub mod step3_summarize;
pub mod utils;
pub mod workflow;

use anyhow::{Context, Result};

use crate::config::OrchestratorConfig;
use crate::launcher::AiderLauncher;
use crate::llm::{build_client, GenerationParams};
use crate::summarizer::LogSummarizer;

pub use cli::{Cli, Command, RunArgs, SummarizeArgs};
pub use workflow::{Approver, AutoAccept, Orchestrator, PromptApprover, WorkflowConfig};

/// Entry point for the orchestrator binary
pub async fn run_workflow(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => run_command(args).await,
        Command::Summarize(args) => summarize_command(args).await,
    }
}

async fn run_command(args: RunArgs) -> Result<()> {
    args.validate()?;
    let config = OrchestratorConfig::load(&args.config)?;
    let workflow = WorkflowConfig::for_run(config, &args);

    let prd_llm = build_client(
        &workflow.config.workflow_llms.prd_generator,
        workflow.config.prd_llm()?,
    )
    .context("Failed to initialize PRD generator LLM")?;
    let launcher = AiderLauncher::from_defaults(&workflow.config.defaults);

    let orchestrator = Orchestrator::new(workflow);
    let state = if args.auto_accept {
        orchestrator
            .run(&args.proposed_change, prd_llm.as_ref(), &launcher, &mut AutoAccept)
            .await?
    } else {
        let mut approver = PromptApprover::stdin();
        orchestrator
            .run(&args.proposed_change, prd_llm.as_ref(), &launcher, &mut approver)
            .await?
    };

    let state_file = orchestrator.store().path_for(&state.run_id);
    println!(
        "\nRun {} finished with status '{}'. State: {}",
        state.run_id,
        state.status,
        state_file.display()
    );

    if state.status.is_failure() {
        anyhow::bail!(
            "Run {} ended with status '{}': {}",
            state.run_id,
            state.status,
            state.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

async fn summarize_command(args: SummarizeArgs) -> Result<()> {
    args.validate()?;
    let config = OrchestratorConfig::load(&args.config)?;
    let workflow = WorkflowConfig::for_summarize(config, &args);

    let llm_config = workflow.config.summarizer_llm()?;
    let llm = build_client(&workflow.config.workflow_llms.log_summarizer, llm_config)
        .context("Failed to initialize log summarizer LLM")?;
    let summarizer = LogSummarizer::new(
        llm,
        GenerationParams::from(llm_config),
        workflow.config.defaults.max_parallel_summaries,
    )
    .with_debug(workflow.debug);

    let orchestrator = Orchestrator::new(workflow);
    orchestrator.summarize(&args.run_id, &summarizer).await?;
    Ok(())
}
