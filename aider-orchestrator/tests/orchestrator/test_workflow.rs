//! End-to-end tests for the run and summarize workflows

use std::sync::Arc;

use clap::Parser;

use aider_orchestrator::launcher::agent_log_path;
use aider_orchestrator::llm::LlmClient;
use aider_orchestrator::orchestrator::{AutoAccept, Cli, Command, Orchestrator, WorkflowConfig};
use aider_orchestrator::state::RunStatus;
use aider_orchestrator::summarizer::LogSummarizer;

use super::common::{
    params, workflow_config, RecordingLauncher, ScriptedApprover, StubLlm,
    OTP_RESPONSE,
};

const CONTEXT: &str = "Repository Structure (tracked files in repo):\n- a.py\n";

#[tokio::test]
async fn test_run_launches_agents_from_breakdown() {
    let root = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(workflow_config(root.path()));
    let llm = StubLlm::replying(OTP_RESPONSE);
    let launcher = RecordingLauncher::new();
    let mut approver = ScriptedApprover::new(true);

    let state = orchestrator
        .run_with_context("Add OTP login", CONTEXT, &llm, &launcher, &mut approver)
        .await
        .unwrap();

    assert_eq!(state.status, RunStatus::AgentsRunning);
    assert_eq!(state.prd_text.as_deref(), Some("PRD body"));
    assert_eq!(state.raw_prd_response.as_deref(), Some(OTP_RESPONSE));
    assert_eq!(state.agents().len(), 2);
    assert_eq!(state.agents()[1].target_files, vec!["a.py"]);
    assert_eq!(state.tmux_session, Some(format!("test_{}", state.run_id)));

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Add OTP login"));
    assert!(prompts[0].contains(CONTEXT));

    assert_eq!(approver.questions.len(), 1);
    assert!(approver.questions[0].starts_with("Proceed with this PRD using 2 agents?"));

    let requests = launcher.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].agents.len(), 2);
    assert_eq!(requests[0].concurrency, 2);

    let stored = orchestrator.store().load(&state.run_id).unwrap().unwrap();
    assert_eq!(stored, state);
}

#[tokio::test]
async fn test_rejected_prd_launches_nothing() {
    let root = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(workflow_config(root.path()));
    let llm = StubLlm::replying(OTP_RESPONSE);
    let launcher = RecordingLauncher::new();
    let mut approver = ScriptedApprover::new(false);

    let state = orchestrator
        .run_with_context("Add OTP login", CONTEXT, &llm, &launcher, &mut approver)
        .await
        .unwrap();

    assert_eq!(state.status, RunStatus::PrdRejected);
    assert!(launcher.requests().is_empty());
    assert!(state.tmux_session.is_none());

    let stored = orchestrator.store().load(&state.run_id).unwrap().unwrap();
    assert_eq!(stored.status, RunStatus::PrdRejected);
}

#[tokio::test]
async fn test_llm_failure_marks_run_failed() {
    let root = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(workflow_config(root.path()));
    let llm = StubLlm::failing();
    let launcher = RecordingLauncher::new();

    let state = orchestrator
        .run_with_context("Add OTP login", CONTEXT, &llm, &launcher, &mut AutoAccept)
        .await
        .unwrap();

    assert_eq!(state.status, RunStatus::FailedPrd);
    assert!(state.error.is_some());
    assert!(state.prd_text.is_none());
    assert!(launcher.requests().is_empty());

    let stored = orchestrator.store().load(&state.run_id).unwrap().unwrap();
    assert_eq!(stored.status, RunStatus::FailedPrd);
}

#[tokio::test]
async fn test_launch_failure_is_recorded() {
    let root = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(workflow_config(root.path()));
    let llm = StubLlm::replying(OTP_RESPONSE);
    let launcher = RecordingLauncher::failing();

    let state = orchestrator
        .run_with_context("Add OTP login", CONTEXT, &llm, &launcher, &mut AutoAccept)
        .await
        .unwrap();

    assert_eq!(state.status, RunStatus::FailedAgentLaunch);
    assert!(state.error.as_deref().unwrap().contains("aider"));
    assert_eq!(state.agents().len(), 2);
}

#[tokio::test]
async fn test_partial_launch_keeps_session_and_logs() {
    let root = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(workflow_config(root.path()));
    let llm = StubLlm::replying(OTP_RESPONSE);
    let launcher = RecordingLauncher::partially_failing();

    let state = orchestrator
        .run_with_context("Add OTP login", CONTEXT, &llm, &launcher, &mut AutoAccept)
        .await
        .unwrap();

    assert_eq!(state.status, RunStatus::FailedAgentLaunch);
    assert!(state
        .error
        .as_deref()
        .unwrap()
        .contains("1 agents already running"));
    assert_eq!(state.tmux_session, Some(format!("test_{}", state.run_id)));
    assert_eq!(state.log_dir, Some(launcher.requests()[0].log_dir.clone()));

    let stored = orchestrator.store().load(&state.run_id).unwrap().unwrap();
    assert_eq!(stored, state);
}

#[tokio::test]
async fn test_launch_failure_before_start_records_no_session() {
    let root = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(workflow_config(root.path()));
    let llm = StubLlm::replying(OTP_RESPONSE);

    let state = orchestrator
        .run_with_context(
            "Add OTP login",
            CONTEXT,
            &llm,
            &RecordingLauncher::failing(),
            &mut AutoAccept,
        )
        .await
        .unwrap();

    assert_eq!(state.status, RunStatus::FailedAgentLaunch);
    assert!(state.tmux_session.is_none());
    assert!(state.log_dir.is_none());
}

#[tokio::test]
async fn test_prose_only_response_stops_before_launch() {
    let root = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(workflow_config(root.path()));
    let llm = StubLlm::replying("# PRD\nJust prose, no plan.");
    let launcher = RecordingLauncher::new();
    let mut approver = ScriptedApprover::new(true);

    let state = orchestrator
        .run_with_context("Add OTP login", CONTEXT, &llm, &launcher, &mut approver)
        .await
        .unwrap();

    assert_eq!(state.status, RunStatus::PrdGenerated);
    assert_eq!(state.prd_text.as_deref(), Some("# PRD\nJust prose, no plan."));
    assert!(state.agent_breakdown.is_none());
    assert!(approver.questions.is_empty());
    assert!(launcher.requests().is_empty());
}

#[tokio::test]
async fn test_empty_agent_list_stops_before_launch() {
    let root = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(workflow_config(root.path()));
    let llm = StubLlm::replying("PRD\n{\"suggested_num_agents\": 0, \"agents\": []}");
    let launcher = RecordingLauncher::new();

    let state = orchestrator
        .run_with_context("Add OTP login", CONTEXT, &llm, &launcher, &mut AutoAccept)
        .await
        .unwrap();

    assert_eq!(state.status, RunStatus::PrdGenerated);
    assert!(state.agent_breakdown.is_some());
    assert!(state.agents().is_empty());
    assert!(launcher.requests().is_empty());
}

#[tokio::test]
async fn test_summarize_after_launch() {
    let root = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(workflow_config(root.path()));
    let launcher = RecordingLauncher::new();

    let state = orchestrator
        .run_with_context(
            "Add OTP login",
            CONTEXT,
            &StubLlm::replying(OTP_RESPONSE),
            &launcher,
            &mut AutoAccept,
        )
        .await
        .unwrap();

    let log_dir = launcher.requests()[0].log_dir.clone();
    std::fs::create_dir_all(&log_dir).unwrap();
    std::fs::write(agent_log_path(&log_dir, 0), "Applied edit\n").unwrap();
    std::fs::write(agent_log_path(&log_dir, 1), "Applied edit to a.py\n").unwrap();

    let reviewer = Arc::new(StubLlm::replying("**Status:** Completed\n**Grade:** A"));
    let client: Arc<dyn LlmClient> = reviewer.clone();
    let summarizer = LogSummarizer::new(client, params(), 2);

    let summarized = orchestrator
        .summarize(&state.run_id, &summarizer)
        .await
        .unwrap();

    assert_eq!(summarized.status, RunStatus::Summarized);
    let summaries = summarized.summaries.as_ref().unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[&1], "**Status:** Completed\n**Grade:** A");
    assert_eq!(reviewer.call_count(), 2);

    // A second summarize shows the stored result without new reviews
    let again = orchestrator
        .summarize(&state.run_id, &summarizer)
        .await
        .unwrap();
    assert_eq!(again.summaries, summarized.summaries);
    assert_eq!(reviewer.call_count(), 2);
}

#[tokio::test]
async fn test_summarize_missing_log_grades_f() {
    let root = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(workflow_config(root.path()));

    let state = orchestrator
        .run_with_context(
            "Add OTP login",
            CONTEXT,
            &StubLlm::replying(OTP_RESPONSE),
            &RecordingLauncher::new(),
            &mut AutoAccept,
        )
        .await
        .unwrap();

    let reviewer = Arc::new(StubLlm::replying("unused"));
    let client: Arc<dyn LlmClient> = reviewer.clone();
    let summarizer = LogSummarizer::new(client, params(), 2);

    let summarized = orchestrator
        .summarize(&state.run_id, &summarizer)
        .await
        .unwrap();

    let summaries = summarized.summaries.unwrap();
    assert!(summaries[&0].contains("**Grade:** F"));
    assert!(summaries[&1].contains("Log file not found"));
    assert_eq!(reviewer.call_count(), 0);
}

#[tokio::test]
async fn test_summarize_unknown_run_fails() {
    let root = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(workflow_config(root.path()));
    let summarizer = LogSummarizer::new(Arc::new(StubLlm::replying("unused")), params(), 1);

    let err = orchestrator
        .summarize("20990101_000000_ffffff", &summarizer)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("No state found for run_id"));
}

#[tokio::test]
async fn test_summarize_rejected_run_fails() {
    let root = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(workflow_config(root.path()));

    let state = orchestrator
        .run_with_context(
            "Add OTP login",
            CONTEXT,
            &StubLlm::replying(OTP_RESPONSE),
            &RecordingLauncher::new(),
            &mut ScriptedApprover::new(false),
        )
        .await
        .unwrap();

    let summarizer = LogSummarizer::new(Arc::new(StubLlm::replying("unused")), params(), 1);
    let err = orchestrator
        .summarize(&state.run_id, &summarizer)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("prd_rejected"));

    let stored = orchestrator.store().load(&state.run_id).unwrap().unwrap();
    assert_eq!(stored.status, RunStatus::PrdRejected);
}

#[tokio::test]
async fn test_summarize_debug_flag_reaches_workflow() {
    let root = tempfile::tempdir().unwrap();
    let cli = Cli::try_parse_from(["aider-orchestrator", "summarize", "r1", "--debug"]).unwrap();
    let Command::Summarize(args) = cli.command else {
        panic!("Expected summarize command");
    };

    let base = workflow_config(root.path());
    let workflow = WorkflowConfig::for_summarize(base.config.clone(), &args);
    assert!(workflow.debug);
    assert_eq!(workflow.config.defaults.state_dir, base.config.defaults.state_dir);

    // A debug summarize behaves like a normal one
    let orchestrator = Orchestrator::new(workflow);
    let state = orchestrator
        .run_with_context(
            "Add OTP login",
            CONTEXT,
            &StubLlm::replying(OTP_RESPONSE),
            &RecordingLauncher::new(),
            &mut AutoAccept,
        )
        .await
        .unwrap();

    let reviewer = Arc::new(StubLlm::replying("ok"));
    let client: Arc<dyn LlmClient> = reviewer.clone();
    let summarizer = LogSummarizer::new(client, params(), 2).with_debug(true);
    let summarized = orchestrator
        .summarize(&state.run_id, &summarizer)
        .await
        .unwrap();
    assert_eq!(summarized.status, RunStatus::Summarized);
}
