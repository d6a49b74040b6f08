//! Shared logging surface for the aider orchestrator.
//!
//! Two channels:
//! - [`RunEvent`] JSON lines on stderr, prefixed with [`EVENT_PREFIX`], for
//!   tooling that follows a run.
//! - Colored console macros for the operator reading the terminal.

use serde::{Deserialize, Serialize};

// Re-export async trait for the capability traits
pub use async_trait::async_trait;

/// Prefix marking a structured event line on stderr
pub const EVENT_PREFIX: &str = "__AO_EVENT__:";

/// Structured progress events emitted during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// Phase started
    PhaseStarted {
        run_id: String,
        phase: usize,
        name: String,
    },
    /// Phase completed
    PhaseCompleted {
        run_id: String,
        phase: usize,
        name: String,
    },
    /// Phase failed
    PhaseFailed {
        run_id: String,
        phase: usize,
        name: String,
        error: String,
    },
    /// Coding agent handed to the launcher
    AgentLaunched {
        run_id: String,
        agent_id: u32,
        log_file: String,
    },
    /// Summary produced for one agent
    AgentSummarized {
        run_id: String,
        agent_id: u32,
        used_llm: bool,
    },
    /// Agent summary could not be produced
    AgentFailed {
        run_id: String,
        agent_id: u32,
        error: String,
    },
    /// Run state persisted
    StateSaved {
        run_id: String,
        status: String,
        file_path: String,
    },
}

impl RunEvent {
    /// Render the event as a single prefixed line
    pub fn to_line(&self) -> Option<String> {
        serde_json::to_string(self)
            .ok()
            .map(|json| format!("{}{}", EVENT_PREFIX, json))
    }

    /// Parse a stderr line back into an event, if it carries one
    pub fn from_line(line: &str) -> Option<Self> {
        let json = line.strip_prefix(EVENT_PREFIX)?;
        serde_json::from_str(json).ok()
    }

    /// Emit this event to stderr
    pub fn emit(&self) {
        if let Some(line) = self.to_line() {
            use std::io::Write;
            eprintln!("{}", line);
            // Flush so interleaved async output keeps line order
            let _ = std::io::stderr().flush();
        }
    }
}

// ============================================================================
// Structured event macros
// ============================================================================

#[macro_export]
macro_rules! log_phase_start {
    ($run_id:expr, $phase:expr, $name:expr) => {
        $crate::RunEvent::PhaseStarted {
            run_id: $run_id.to_string(),
            phase: $phase,
            name: $name.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_phase_complete {
    ($run_id:expr, $phase:expr, $name:expr) => {
        $crate::RunEvent::PhaseCompleted {
            run_id: $run_id.to_string(),
            phase: $phase,
            name: $name.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_phase_failed {
    ($run_id:expr, $phase:expr, $name:expr, $error:expr) => {
        $crate::RunEvent::PhaseFailed {
            run_id: $run_id.to_string(),
            phase: $phase,
            name: $name.to_string(),
            error: $error.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_agent_launched {
    ($run_id:expr, $agent_id:expr, $log_file:expr) => {
        $crate::RunEvent::AgentLaunched {
            run_id: $run_id.to_string(),
            agent_id: $agent_id,
            log_file: $log_file.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_agent_summarized {
    ($run_id:expr, $agent_id:expr, $used_llm:expr) => {
        $crate::RunEvent::AgentSummarized {
            run_id: $run_id.to_string(),
            agent_id: $agent_id,
            used_llm: $used_llm,
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_agent_failed {
    ($run_id:expr, $agent_id:expr, $error:expr) => {
        $crate::RunEvent::AgentFailed {
            run_id: $run_id.to_string(),
            agent_id: $agent_id,
            error: $error.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_state_saved {
    ($run_id:expr, $status:expr, $path:expr) => {
        $crate::RunEvent::StateSaved {
            run_id: $run_id.to_string(),
            status: $status.to_string(),
            file_path: $path.to_string(),
        }
        .emit();
    };
}

// ============================================================================
// Console Logging Macros
// ============================================================================

/// Logs the start of a workflow step with a header and description.
///
/// # Example
/// ```
/// use aider_orchestrator_sdk::log_phase_start_console;
/// log_phase_start_console!(1, "PRD Generation", "Generate PRD and agent breakdown");
/// ```
///
/// Outputs:
/// ```text
/// ═══ STEP 1: PRD Generation ═══
/// Generate PRD and agent breakdown
/// ```
#[macro_export]
macro_rules! log_phase_start_console {
    ($phase:expr, $title:expr, $description:expr) => {
        println!("\x1b[1;36m═══ STEP {}: {} ═══\x1b[0m", $phase, $title);
        println!("\x1b[36m{}\x1b[0m", $description);
    };
}

/// Logs the completion of a workflow step.
#[macro_export]
macro_rules! log_phase_complete_console {
    ($phase:expr) => {
        println!("\x1b[32m✓ Step {} complete\x1b[0m", $phase);
    };
}

/// Logs the start of parallel execution.
///
/// ```text
/// → Running 3 summaries in parallel
/// ```
#[macro_export]
macro_rules! log_parallel_start {
    ($num_items:expr, $item_type:expr) => {
        println!(
            "\x1b[36m→ Running {} {} in parallel\x1b[0m",
            $num_items, $item_type
        );
    };
}

/// Logs the completion of parallel execution.
#[macro_export]
macro_rules! log_parallel_complete {
    ($num_items:expr, $item_type:expr) => {
        println!("\x1b[32m✓ {} {} completed\x1b[0m", $num_items, $item_type);
    };
}

/// Logs the number of items found.
///
/// ```text
/// Found 14 tracked files
/// ```
#[macro_export]
macro_rules! log_found {
    ($count:expr, $item_type:expr) => {
        println!("\x1b[36mFound {} {}\x1b[0m", $count, $item_type);
    };
}

/// Logs an informational message.
///
/// # Example
/// ```
/// use aider_orchestrator_sdk::log_info;
/// log_info!("Gathering repository context...");
/// let n = 3;
/// log_info!("Launching {} agents", n);
/// ```
#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        println!("\x1b[36mℹ {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[36mℹ {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs a warning message.
///
/// ```text
/// ⚠ Warning: Agent breakdown JSON block not found
/// ```
#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs an error message to stderr.
///
/// ```text
/// ✗ Error: Failed to call PRD generator LLM
/// ```
#[macro_export]
macro_rules! log_error {
    ($message:expr) => {
        eprintln!("\x1b[31m✗ Error: {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        eprintln!("\x1b[31m✗ Error: {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs a debug message (intended to be used conditionally).
///
/// ```text
/// [DEBUG] Prompt length: 41234 chars
/// ```
#[macro_export]
macro_rules! log_debug {
    ($message:expr) => {
        println!("\x1b[2m[DEBUG] {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[2m[DEBUG] {}\x1b[0m", format!($fmt, $($arg)*));
    };
}
