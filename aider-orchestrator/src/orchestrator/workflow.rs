//! Run and summarize workflows
//!
//! `run` drives one change through PRD generation, approval and agent launch,
//! persisting the run record after every status change. `summarize` is the
//! operator's explicit "agents are done" signal and reviews the logs.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use aider_orchestrator_sdk::{
    log_debug, log_error, log_info, log_phase_complete, log_phase_complete_console, log_phase_failed,
    log_phase_start, log_warning,
};
use anyhow::{bail, Context, Result};

use crate::config::OrchestratorConfig;
use crate::launcher::{run_log_dir, ProcessLauncher};
use crate::llm::{GenerationParams, LlmClient};
use crate::orchestrator::cli::{RunArgs, SummarizeArgs};
use crate::orchestrator::step1_prd::{display_prd_overview, step1_generate_prd};
use crate::orchestrator::step2_launch::{approval_question, step2_launch_agents};
use crate::orchestrator::step3_summarize::{display_summaries, step3_summarize_logs};
use crate::orchestrator::utils::confirm_action;
use crate::state::{new_run_id, RunState, RunStatus, StateStore};
use crate::summarizer::{into_summary_map, LogSummarizer};

// ============================================================================
// Approval
// ============================================================================

/// Decides whether an approved PRD may launch agents
pub trait Approver {
    fn approve(&mut self, question: &str) -> Result<bool>;
}

/// `--auto-accept`
pub struct AutoAccept;

impl Approver for AutoAccept {
    fn approve(&mut self, question: &str) -> Result<bool> {
        log_info!("{} [auto-accepted]", question);
        Ok(true)
    }
}

/// Interactive yes/no prompt; empty input accepts
pub struct PromptApprover<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptApprover<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptApprover<io::StdinLock<'static>, io::Stdout> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Approver for PromptApprover<R, W> {
    fn approve(&mut self, question: &str) -> Result<bool> {
        confirm_action(question, true, &mut self.input, &mut self.output)
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Workflow configuration: the loaded config plus CLI overrides
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub config: OrchestratorConfig,
    /// Recorded on every run
    pub config_file: PathBuf,
    pub debug: bool,
}

impl WorkflowConfig {
    pub fn for_run(mut config: OrchestratorConfig, args: &RunArgs) -> Self {
        if let Some(repo_path) = &args.repo_path {
            config.defaults.repo_path = repo_path.clone();
        }
        if let Some(state_dir) = &args.state_dir {
            config.defaults.state_dir = state_dir.clone();
        }
        if let Some(log_dir) = &args.log_dir {
            config.defaults.log_dir = log_dir.clone();
        }
        Self {
            config,
            config_file: args.config.clone(),
            debug: args.debug,
        }
    }

    pub fn for_summarize(mut config: OrchestratorConfig, args: &SummarizeArgs) -> Self {
        if let Some(state_dir) = &args.state_dir {
            config.defaults.state_dir = state_dir.clone();
        }
        if let Some(log_dir) = &args.log_dir {
            config.defaults.log_dir = log_dir.clone();
        }
        Self {
            config,
            config_file: args.config.clone(),
            debug: args.debug,
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

pub struct Orchestrator {
    workflow: WorkflowConfig,
    store: StateStore,
}

impl Orchestrator {
    pub fn new(workflow: WorkflowConfig) -> Self {
        let store = StateStore::new(workflow.config.defaults.state_dir.clone());
        Self { workflow, store }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    fn config(&self) -> &OrchestratorConfig {
        &self.workflow.config
    }

    /// Full run: collect context, generate PRD, approve, launch
    pub async fn run(
        &self,
        proposed_change: &str,
        prd_llm: &dyn LlmClient,
        launcher: &dyn ProcessLauncher,
        approver: &mut dyn Approver,
    ) -> Result<RunState> {
        self.execute(proposed_change, None, prd_llm, launcher, approver)
            .await
    }

    /// Same as [`Orchestrator::run`] with a pre-collected context blob
    pub async fn run_with_context(
        &self,
        proposed_change: &str,
        repo_context: &str,
        prd_llm: &dyn LlmClient,
        launcher: &dyn ProcessLauncher,
        approver: &mut dyn Approver,
    ) -> Result<RunState> {
        self.execute(proposed_change, Some(repo_context), prd_llm, launcher, approver)
            .await
    }

    async fn execute(
        &self,
        proposed_change: &str,
        repo_context: Option<&str>,
        prd_llm: &dyn LlmClient,
        launcher: &dyn ProcessLauncher,
        approver: &mut dyn Approver,
    ) -> Result<RunState> {
        let defaults = &self.config().defaults;
        let run_id = new_run_id();
        log_info!("Starting new run with ID: {}", run_id);

        let mut state = self
            .store
            .create(
                &run_id,
                proposed_change,
                &self.workflow.config_file.to_string_lossy(),
            )
            .context("Failed to create run state")?;

        // Step 1: PRD
        log_phase_start!(run_id, 1, "prd_generation");
        let llm_config = self.config().prd_llm()?;
        let params = GenerationParams::from(llm_config);
        let generated = step1_generate_prd(
            proposed_change,
            &defaults.repo_path,
            repo_context,
            prd_llm,
            &params,
            self.workflow.debug,
        )
        .await;

        let prd = match generated {
            Ok(prd) => prd,
            Err(e) => {
                log_error!("PRD generation failed: {}", e);
                log_phase_failed!(run_id, 1, "prd_generation", e);
                state.record_failure(RunStatus::FailedPrd, e.to_string())?;
                self.store.save(&state)?;
                return Ok(state);
            }
        };

        state.record_prd(&prd)?;
        self.store.save(&state)?;
        log_phase_complete!(run_id, 1, "prd_generation");
        log_phase_complete_console!(1);

        display_prd_overview(&prd, &defaults.repo_path);

        let Some(breakdown) = prd.breakdown.as_ref().filter(|b| !b.is_empty()) else {
            log_warning!("No agents defined in the breakdown. Nothing to launch; review the PRD in the state file.");
            return Ok(state);
        };

        // Approval
        let question = approval_question(breakdown, &defaults.repo_path);
        if !approver.approve(&question)? {
            log_info!("PRD rejected. Run {} stopped before launching agents.", run_id);
            state.transition(RunStatus::PrdRejected)?;
            self.store.save(&state)?;
            return Ok(state);
        }

        // Step 2: launch
        log_phase_start!(run_id, 2, "agent_launch");
        match step2_launch_agents(&run_id, &breakdown.agents, defaults, launcher).await {
            Ok(handle) => {
                state.tmux_session = Some(handle.session_id);
                state.log_dir = Some(handle.log_dir);
                state.transition(RunStatus::AgentsRunning)?;
                self.store.save(&state)?;
                log_phase_complete!(run_id, 2, "agent_launch");
                log_phase_complete_console!(2);
                log_info!(
                    "Agents are running. When they finish, run: aider-orchestrator summarize {}",
                    run_id
                );
            }
            Err(e) => {
                log_error!("Failed to launch agents: {}", e);
                log_phase_failed!(run_id, 2, "agent_launch", e);
                if let Some(started) = e.partial_handle() {
                    log_warning!(
                        "{} agents were started before the failure; their logs are in {}",
                        started.log_files.len(),
                        started.log_dir.display()
                    );
                    state.tmux_session = Some(started.session_id.clone());
                    state.log_dir = Some(started.log_dir.clone());
                }
                state.record_failure(RunStatus::FailedAgentLaunch, e.to_string())?;
                self.store.save(&state)?;
            }
        }

        Ok(state)
    }

    /// Review the logs of a launched run and store the summaries
    pub async fn summarize(&self, run_id: &str, summarizer: &LogSummarizer) -> Result<RunState> {
        let mut state = self
            .store
            .load(run_id)
            .with_context(|| format!("Failed to load state for run {}", run_id))?
            .with_context(|| {
                format!(
                    "No state found for run_id {} in {}",
                    run_id,
                    self.store.dir().display()
                )
            })?;

        if state.status == RunStatus::Summarized {
            log_info!("Run {} was already summarized; showing stored summaries.", run_id);
            if let Some(summaries) = &state.summaries {
                display_summaries(run_id, summaries);
            }
            return Ok(state);
        }

        if state.agents().is_empty() {
            log_warning!("Run {} has no agents; nothing to summarize.", run_id);
            return Ok(state);
        }

        if state.status != RunStatus::AgentsRunning {
            bail!(
                "Run {} has status '{}'; only runs with launched agents can be summarized",
                run_id,
                state.status
            );
        }

        let log_dir = state
            .log_dir
            .clone()
            .unwrap_or_else(|| run_log_dir(&self.config().defaults.log_dir, run_id));
        if self.workflow.debug {
            log_debug!("State file: {}", self.store.path_for(run_id).display());
            log_debug!("Reading agent logs from: {}", log_dir.display());
        }

        log_phase_start!(run_id, 3, "log_summaries");
        let summaries = step3_summarize_logs(run_id, state.agents(), &log_dir, summarizer).await;
        let summaries = into_summary_map(summaries);
        display_summaries(run_id, &summaries);

        state.summaries = Some(summaries);
        state.transition(RunStatus::Summarized)?;
        self.store.save(&state)?;
        log_phase_complete!(run_id, 3, "log_summaries");
        log_phase_complete_console!(3);

        Ok(state)
    }
}
