//! Orchestrator configuration
//!
//! Loaded once from YAML at startup and passed by reference into every
//! component. API keys are never stored in the file; each LLM entry names
//! the environment variable that holds its key.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use aider_orchestrator_sdk::log_warning;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
    Gemini,
    OpenRouter,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenRouter => "openrouter",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named LLM entry under `llms:`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "type")]
    pub provider: ProviderKind,

    pub model_name: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Falls back to the provider default when absent
    #[serde(default, alias = "max_output_tokens")]
    pub max_tokens: Option<u32>,

    /// API root override (proxies, local gateways), e.g.
    /// `https://api.openai.com/v1`. The client appends the provider's
    /// operation path (`/chat/completions`, `/messages`, `/models/...`).
    #[serde(default)]
    pub base_url: Option<String>,
}

impl LlmConfig {
    pub fn effective_max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(match self.provider {
            ProviderKind::Gemini => 8192,
            _ => 4096,
        })
    }

    /// Read the API key from the environment
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Which LLM entry each workflow step uses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowLlms {
    pub prd_generator: String,
    pub log_summarizer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub repo_path: PathBuf,
    pub tmux_session_prefix: String,
    pub aider_model: String,
    /// Files handed to every agent in addition to its own targets
    pub default_context_files: Vec<String>,
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Worker count for agent launch; one worker per agent when unset
    pub max_parallel_agents: Option<usize>,
    pub max_parallel_summaries: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            repo_path: PathBuf::from("."),
            tmux_session_prefix: "aider_run_".to_string(),
            aider_model: "gpt-4o".to_string(),
            default_context_files: Vec::new(),
            state_dir: PathBuf::from("state"),
            log_dir: PathBuf::from("logs"),
            max_parallel_agents: None,
            max_parallel_summaries: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub llms: BTreeMap<String, LlmConfig>,
    pub workflow_llms: WorkflowLlms,
    #[serde(default)]
    pub defaults: Defaults,
}

fn default_temperature() -> f32 {
    0.7
}

impl OrchestratorConfig {
    /// Load and validate a YAML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Configuration file not found: {}", path.display()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Error parsing configuration file: {}", path.display()))?;
        config.warn_missing_keys();
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (role, name) in [
            ("prd_generator", &self.workflow_llms.prd_generator),
            ("log_summarizer", &self.workflow_llms.log_summarizer),
        ] {
            if !self.llms.contains_key(name) {
                bail!(
                    "workflow_llms.{} refers to '{}', which is not defined under llms",
                    role,
                    name
                );
            }
        }
        if self.defaults.max_parallel_summaries == 0 {
            bail!("defaults.max_parallel_summaries must be greater than 0");
        }
        if self.defaults.max_parallel_agents == Some(0) {
            bail!("defaults.max_parallel_agents must be greater than 0");
        }
        Ok(())
    }

    fn warn_missing_keys(&self) {
        for (name, llm) in &self.llms {
            if llm.api_key().is_none() {
                log_warning!(
                    "Environment variable {} for LLM '{}' not set.",
                    llm.api_key_env,
                    name
                );
            }
        }
    }

    /// Look up a named LLM entry
    pub fn llm(&self, name: &str) -> Result<&LlmConfig> {
        self.llms
            .get(name)
            .with_context(|| format!("LLM configuration for '{}' not found in config", name))
    }

    pub fn prd_llm(&self) -> Result<&LlmConfig> {
        self.llm(&self.workflow_llms.prd_generator)
    }

    pub fn summarizer_llm(&self) -> Result<&LlmConfig> {
        self.llm(&self.workflow_llms.log_summarizer)
    }
}
