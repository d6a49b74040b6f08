//! Run state persistence
//!
//! One pretty-printed JSON file per run (`run_<run_id>.json`). Every save is
//! a whole-record overwrite through a temp file and rename, so readers only
//! ever observe complete snapshots.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use aider_orchestrator_sdk::{log_info, log_state_saved};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prd::{AgentBreakdown, AgentTask, PrdResult};

// ============================================================================
// Status machine
// ============================================================================

/// Lifecycle tag of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Started,
    PrdGenerated,
    FailedPrd,
    PrdRejected,
    AgentsRunning,
    FailedAgentLaunch,
    Summarized,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Started => "started",
            RunStatus::PrdGenerated => "prd_generated",
            RunStatus::FailedPrd => "failed_prd",
            RunStatus::PrdRejected => "prd_rejected",
            RunStatus::AgentsRunning => "agents_running",
            RunStatus::FailedAgentLaunch => "failed_agent_launch",
            RunStatus::Summarized => "summarized",
        }
    }

    /// Forward-only transition table
    pub fn can_transition_to(self, next: RunStatus) -> bool {
        use RunStatus::*;
        matches!(
            (self, next),
            (Started, PrdGenerated)
                | (Started, FailedPrd)
                | (PrdGenerated, AgentsRunning)
                | (PrdGenerated, FailedAgentLaunch)
                | (PrdGenerated, PrdRejected)
                | (AgentsRunning, Summarized)
        )
    }

    /// Whether the run ended in a failure state
    pub fn is_failure(self) -> bool {
        matches!(self, RunStatus::FailedPrd | RunStatus::FailedAgentLaunch)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("State file I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize run state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Corrupt state file {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: RunStatus, to: RunStatus },
}

// ============================================================================
// Run state record
// ============================================================================

/// Persisted record of one orchestration run.
///
/// Optional fields stay absent until the run reaches the stage that sets
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: String,
    pub status: RunStatus,
    pub proposed_change: String,
    pub config_file: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Local>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prd_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_breakdown: Option<AgentBreakdown>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_prd_response: Option<String>,

    /// Copy of `agent_breakdown.agents`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agents: Option<Vec<AgentTask>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmux_session: Option<String>,

    /// Agent logs directory, recorded at launch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summaries: Option<BTreeMap<u32, String>>,

    /// Reason for a failure status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunState {
    pub fn new(
        run_id: impl Into<String>,
        proposed_change: impl Into<String>,
        config_file: impl Into<String>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            status: RunStatus::Started,
            proposed_change: proposed_change.into(),
            config_file: config_file.into(),
            created_at: Some(Local::now()),
            prd_text: None,
            agent_breakdown: None,
            raw_prd_response: None,
            agents: None,
            tmux_session: None,
            log_dir: None,
            summaries: None,
            error: None,
        }
    }

    /// Move to `next`, rejecting anything outside the transition table
    pub fn transition(&mut self, next: RunStatus) -> Result<(), StateError> {
        if !self.status.can_transition_to(next) {
            return Err(StateError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Store generation output and move to `prd_generated`
    pub fn record_prd(&mut self, result: &PrdResult) -> Result<(), StateError> {
        self.transition(RunStatus::PrdGenerated)?;
        self.prd_text = Some(result.prd_text.clone());
        self.raw_prd_response = Some(result.raw_response.clone());
        self.agent_breakdown = result.breakdown.clone();
        self.agents = result.breakdown.as_ref().map(|b| b.agents.clone());
        Ok(())
    }

    /// Move to a failure status, keeping the reason for post-mortem
    pub fn record_failure(
        &mut self,
        status: RunStatus,
        error: impl Into<String>,
    ) -> Result<(), StateError> {
        self.transition(status)?;
        self.error = Some(error.into());
        Ok(())
    }

    /// Agents of this run (empty before PRD generation)
    pub fn agents(&self) -> &[AgentTask] {
        self.agents.as_deref().unwrap_or(&[])
    }
}

// ============================================================================
// Store
// ============================================================================

/// Generate a sortable, collision-resistant run id
pub fn new_run_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", Local::now().format("%Y%m%d_%H%M%S"), &suffix[..6])
}

/// File-backed run state store
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, run_id: &str) -> PathBuf {
        self.dir.join(format!("run_{}.json", run_id))
    }

    /// Create and persist a fresh `started` record
    pub fn create(
        &self,
        run_id: &str,
        proposed_change: &str,
        config_file: &str,
    ) -> Result<RunState, StateError> {
        let state = RunState::new(run_id, proposed_change, config_file);
        self.save(&state)?;
        Ok(state)
    }

    /// Overwrite the whole record for `state.run_id`
    pub fn save(&self, state: &RunState) -> Result<PathBuf, StateError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: io::Error| StateError::Io { path, source }
        };

        std::fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;

        let path = self.path_for(&state.run_id);
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(state)?;

        std::fs::write(&tmp, content).map_err(io_err(&tmp))?;
        std::fs::rename(&tmp, &path).map_err(io_err(&path))?;

        log_info!("Run state saved to {}", path.display());
        log_state_saved!(state.run_id, state.status, path.display());
        Ok(path)
    }

    /// Load a run; `Ok(None)` when it was never saved
    pub fn load(&self, run_id: &str) -> Result<Option<RunState>, StateError> {
        let path = self.path_for(run_id);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StateError::Io { path, source }),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StateError::Corrupt { path, source })
    }
}
