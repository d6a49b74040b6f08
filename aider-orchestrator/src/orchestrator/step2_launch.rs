//! Step 2: Launch aider agents for the approved breakdown

use std::path::Path;

use aider_orchestrator_sdk::{log_info, log_phase_start_console};

use crate::config::Defaults;
use crate::launcher::{run_log_dir, LaunchError, LaunchHandle, LaunchRequest, ProcessLauncher};
use crate::orchestrator::utils::file_size_info;
use crate::prd::{AgentBreakdown, AgentTask};

/// Approval question shown before launching
pub fn approval_question(breakdown: &AgentBreakdown, repo_path: &Path) -> String {
    let files = breakdown.all_target_files();
    let sizes = file_size_info(repo_path, &files);
    format!(
        "Proceed with this PRD using {} agents? (Total files: {}, Size: {})",
        breakdown.agents.len(),
        files.len(),
        sizes.total_display()
    )
}

/// Launch one agent process per task; one worker per agent unless capped
pub async fn step2_launch_agents(
    run_id: &str,
    agents: &[AgentTask],
    defaults: &Defaults,
    launcher: &dyn ProcessLauncher,
) -> Result<LaunchHandle, LaunchError> {
    log_phase_start_console!(2, "Agent Launch", "Launch aider agents for the agent breakdown");

    let concurrency = defaults.max_parallel_agents.unwrap_or(agents.len());
    let request = LaunchRequest {
        run_id: run_id.to_string(),
        agents: agents.to_vec(),
        concurrency,
        repo_path: defaults.repo_path.clone(),
        log_dir: run_log_dir(&defaults.log_dir, run_id),
    };

    let handle = launcher.launch(&request).await?;
    log_info!(
        "Launched {} agents in session '{}'",
        handle.log_files.len(),
        handle.session_id
    );
    log_info!("Agent logs: {}", handle.log_dir.display());
    Ok(handle)
}
