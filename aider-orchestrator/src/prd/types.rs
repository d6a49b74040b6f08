//! Data types for the PRD-to-agent-breakdown pipeline.
//!
//! 1. **Agent Tasks** - one unit of parallel work per coding agent
//! 2. **Agent Breakdown** - the validated multi-agent plan
//! 3. **PRD Result** - PRD text, breakdown and raw response of one generation call

use serde::{Deserialize, Serialize};

// ============================================================================
// Agent Breakdown Types
// ============================================================================

/// One unit of delegated coding work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTask {
    /// Unique agent ID within the breakdown (conventionally 0..N-1)
    pub agent_id: u32,

    /// What the agent should do
    pub task_description: String,

    /// Files or directories the agent should focus on
    pub target_files: Vec<String>,
}

/// Structured multi-agent work plan extracted from an LLM response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentBreakdown {
    /// Advisory agent count suggested by the model (not enforced)
    pub suggested_num_agents: u32,

    /// Agent tasks, possibly empty
    pub agents: Vec<AgentTask>,
}

impl AgentBreakdown {
    /// True when there is nothing to run in parallel
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// All target files across agents, in agent order
    pub fn all_target_files(&self) -> Vec<String> {
        self.agents
            .iter()
            .flat_map(|agent| agent.target_files.iter().cloned())
            .collect()
    }
}

// ============================================================================
// PRD Result
// ============================================================================

/// Output of one PRD generation call.
///
/// `prd_text` and `breakdown` fail independently; `raw_response` is kept
/// verbatim regardless of the parse outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrdResult {
    pub prd_text: String,
    pub breakdown: Option<AgentBreakdown>,
    pub raw_response: String,
}

impl PrdResult {
    /// Neither PRD text nor breakdown could be recovered
    pub fn is_empty(&self) -> bool {
        self.prd_text.trim().is_empty() && self.breakdown.is_none()
    }
}
