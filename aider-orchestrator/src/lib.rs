//! PRD-driven multi-agent orchestration for aider.
//!
//! - `config` - YAML configuration
//! - `context` - Repository context collection
//! - `llm` - LLM client capability and providers
//! - `prd` - PRD prompt, response parsing and breakdown validation
//! - `state` - Run state record and store
//! - `launcher` - Agent process launcher capability
//! - `summarizer` - Agent log review
//! - `orchestrator` - CLI and workflows

pub mod config;
pub mod context;
pub mod launcher;
pub mod llm;
pub mod orchestrator;
pub mod prd;
pub mod state;
pub mod summarizer;
pub mod workflow_utils;
