//! Process launcher capability
//!
//! Starts independent coding-agent processes for a set of agent tasks and
//! hands back a session handle. Launched processes are not supervised; they
//! outlive the orchestrator.

mod aider;

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use aider_orchestrator_sdk::async_trait;
use thiserror::Error;

use crate::prd::AgentTask;

pub use aider::{render_worker_script, shell_quote, write_worker_scripts, AiderLauncher, WorkerScript};

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Required executable '{0}' not found on PATH")]
    MissingExecutable(String),

    #[error("No agents to launch")]
    NoAgents,

    #[error("Launch I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Worker `worker` could not be started; earlier workers are running
    #[error(
        "Failed to start worker {worker} ({} agents already running): {source}",
        .started.log_files.len()
    )]
    Spawn {
        worker: usize,
        started: LaunchHandle,
        #[source]
        source: io::Error,
    },
}

impl LaunchError {
    /// Session of the workers started before the failure, if any were
    pub fn partial_handle(&self) -> Option<&LaunchHandle> {
        match self {
            LaunchError::Spawn { started, .. } if !started.log_files.is_empty() => Some(started),
            _ => None,
        }
    }
}

/// What to launch
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub run_id: String,
    pub agents: Vec<AgentTask>,
    /// Number of parallel workers
    pub concurrency: usize,
    /// Working directory of the agents
    pub repo_path: PathBuf,
    /// Per-run directory receiving `agent_<id>.log` files
    pub log_dir: PathBuf,
}

/// Handle to a launched session
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchHandle {
    pub session_id: String,
    pub log_dir: PathBuf,
    pub log_files: BTreeMap<u32, PathBuf>,
}

/// Log file convention shared by launcher and summarizer
pub fn agent_log_path(log_dir: &Path, agent_id: u32) -> PathBuf {
    log_dir.join(format!("agent_{}.log", agent_id))
}

/// Per-run log directory under the configured log root
pub fn run_log_dir(log_root: &Path, run_id: &str) -> PathBuf {
    log_root.join(format!("run_{}", run_id))
}

#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    async fn launch(&self, request: &LaunchRequest) -> Result<LaunchHandle, LaunchError>;
}
