//! Tests for the run state store

use aider_orchestrator::prd::{AgentBreakdown, PrdResult};
use aider_orchestrator::state::{RunState, RunStatus, StateError, StateStore};

use super::common::agent;

fn prd_result() -> PrdResult {
    PrdResult {
        prd_text: "PRD body".to_string(),
        breakdown: Some(AgentBreakdown {
            suggested_num_agents: 2,
            agents: vec![agent(0, "t0", &[]), agent(1, "t1", &["a.py"])],
        }),
        raw_response: "PRD body\n{...}".to_string(),
    }
}

#[test]
fn test_save_then_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state"));

    let mut state = store.create("20260101_120000_abc123", "Add OTP login", "config.yaml").unwrap();
    state.record_prd(&prd_result()).unwrap();
    let path = store.save(&state).unwrap();

    assert_eq!(path, dir.path().join("state/run_20260101_120000_abc123.json"));
    let loaded = store.load("20260101_120000_abc123").unwrap().unwrap();
    assert_eq!(loaded, state);
    assert_eq!(loaded.status, RunStatus::PrdGenerated);
}

#[test]
fn test_load_unknown_run_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    assert!(store.load("missing").unwrap().is_none());
}

#[test]
fn test_load_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    std::fs::write(store.path_for("broken"), "{ not json").unwrap();

    assert!(matches!(store.load("broken"), Err(StateError::Corrupt { .. })));
}

#[test]
fn test_record_prd_copies_agents() {
    let mut state = RunState::new("r1", "change", "config.yaml");
    state.record_prd(&prd_result()).unwrap();

    assert_eq!(state.prd_text.as_deref(), Some("PRD body"));
    assert_eq!(state.raw_prd_response.as_deref(), Some("PRD body\n{...}"));
    assert_eq!(state.agents().len(), 2);
    assert_eq!(
        state.agents(),
        state.agent_breakdown.as_ref().unwrap().agents.as_slice()
    );
}

#[test]
fn test_record_prd_without_breakdown() {
    let mut state = RunState::new("r1", "change", "config.yaml");
    let result = PrdResult {
        prd_text: "prose only".to_string(),
        breakdown: None,
        raw_response: "prose only".to_string(),
    };
    state.record_prd(&result).unwrap();

    assert_eq!(state.status, RunStatus::PrdGenerated);
    assert!(state.agent_breakdown.is_none());
    assert!(state.agents.is_none());
    assert!(state.agents().is_empty());
}

#[test]
fn test_backward_transition_rejected() {
    let mut state = RunState::new("r1", "change", "config.yaml");
    state.record_prd(&prd_result()).unwrap();
    state.transition(RunStatus::AgentsRunning).unwrap();
    state.transition(RunStatus::Summarized).unwrap();

    let err = state.transition(RunStatus::PrdGenerated).unwrap_err();
    assert!(matches!(
        err,
        StateError::InvalidTransition {
            from: RunStatus::Summarized,
            to: RunStatus::PrdGenerated
        }
    ));
    assert_eq!(state.status, RunStatus::Summarized);
}

#[test]
fn test_record_failure_keeps_reason() {
    let mut state = RunState::new("r1", "change", "config.yaml");
    state
        .record_failure(RunStatus::FailedPrd, "LLM call failed")
        .unwrap();

    assert_eq!(state.status, RunStatus::FailedPrd);
    assert_eq!(state.error.as_deref(), Some("LLM call failed"));
    assert!(state.status.is_failure());
}

#[test]
fn test_overwrite_leaves_single_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());

    let mut state = store.create("r1", "change", "config.yaml").unwrap();
    state.record_prd(&prd_result()).unwrap();
    store.save(&state).unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["run_r1.json"]);
}

#[test]
fn test_absent_fields_load_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    std::fs::write(
        store.path_for("r2"),
        r#"{"run_id":"r2","status":"started","proposed_change":"x","config_file":"config.yaml"}"#,
    )
    .unwrap();

    let state = store.load("r2").unwrap().unwrap();
    assert_eq!(state.status, RunStatus::Started);
    assert!(state.created_at.is_none());
    assert!(state.prd_text.is_none());
    assert!(state.summaries.is_none());
    assert!(state.error.is_none());
}

#[test]
fn test_serialized_status_is_snake_case() {
    let mut state = RunState::new("r3", "change", "config.yaml");
    state.record_prd(&prd_result()).unwrap();
    state.transition(RunStatus::FailedAgentLaunch).unwrap();

    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["status"], "failed_agent_launch");
    assert!(json.get("summaries").is_none());
}
