//! Step 3: Summarize agent logs

use std::collections::BTreeMap;
use std::path::Path;

use aider_orchestrator_sdk::log_phase_start_console;

use crate::prd::AgentTask;
use crate::summarizer::{AgentLogSummary, LogSummarizer};

pub async fn step3_summarize_logs(
    run_id: &str,
    agents: &[AgentTask],
    log_dir: &Path,
    summarizer: &LogSummarizer,
) -> Vec<AgentLogSummary> {
    log_phase_start_console!(3, "Log Summaries", "Review agent logs and grade each agent");
    summarizer.summarize_all(run_id, agents, log_dir).await
}

pub fn display_summaries(run_id: &str, summaries: &BTreeMap<u32, String>) {
    println!("\n--- Run Summary: {} ---", run_id);
    for (agent_id, summary) in summaries {
        println!("\n[Agent {}]", agent_id);
        println!("{}", summary.trim());
    }
    println!("\n---------------------------------------");
}
