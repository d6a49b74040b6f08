//! CLI argument definitions for the aider orchestrator.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Multi-agent aider orchestrator
///
/// Turns a proposed change into a PRD and a parallel work plan, launches one
/// aider agent per planned task, and reviews the agents' logs afterwards:
///
/// - Step 1: Generate PRD and agent breakdown from repository context
/// - Step 2: Launch aider agents for the approved breakdown
/// - Step 3: Summarize agent logs (`summarize` command, once agents finish)
#[derive(Parser, Debug, Clone)]
#[command(name = "aider-orchestrator")]
#[command(about = "Multi-agent aider orchestrator")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate a PRD for a change and launch agents for it
    Run(RunArgs),
    /// Review the agent logs of a previous run
    Summarize(SummarizeArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Natural-language description of the change to make
    #[arg(value_name = "PROPOSED_CHANGE")]
    pub proposed_change: String,

    /// Path to the YAML configuration file
    #[arg(short = 'c', long, value_name = "PATH", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Skip the approval prompt and launch agents immediately
    #[arg(long)]
    pub auto_accept: bool,

    /// Repository to analyze and modify (overrides defaults.repo_path)
    #[arg(long, value_name = "PATH")]
    pub repo_path: Option<PathBuf>,

    /// Directory for run state files (overrides defaults.state_dir)
    #[arg(long, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Directory for agent logs (overrides defaults.log_dir)
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl RunArgs {
    pub fn validate(&self) -> Result<()> {
        if self.proposed_change.trim().is_empty() {
            anyhow::bail!("PROPOSED_CHANGE must not be empty");
        }
        Ok(())
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct SummarizeArgs {
    /// Run to summarize (as printed by `run`)
    #[arg(value_name = "RUN_ID")]
    pub run_id: String,

    /// Path to the YAML configuration file
    #[arg(short = 'c', long, value_name = "PATH", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Directory for run state files (overrides defaults.state_dir)
    #[arg(long, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Directory for agent logs (overrides defaults.log_dir)
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl SummarizeArgs {
    pub fn validate(&self) -> Result<()> {
        if self.run_id.trim().is_empty() {
            anyhow::bail!("RUN_ID must not be empty");
        }
        Ok(())
    }
}
