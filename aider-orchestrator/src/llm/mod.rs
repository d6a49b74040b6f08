//! LLM client capability
//!
//! Every provider is reduced to one operation: `generate(prompt, params)`.
//! Callers hold an `Arc<dyn LlmClient>` and never see wire formats.
//!
//! - [`openai`] - chat-completions format (OpenAI and OpenRouter)
//! - [`anthropic`] - messages API
//! - [`gemini`] - generateContent API

pub mod anthropic;
pub mod gemini;
pub mod openai;

use std::sync::Arc;
use std::time::Duration;

use aider_orchestrator_sdk::{async_trait, log_info};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::{LlmConfig, ProviderKind};

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

/// Upper bound on a single completion request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API key for LLM '{name}' is missing. Set {env} in the environment or .env file")]
    MissingApiKey { name: String, env: String },

    #[error("{provider} request failed: {source}")]
    Request {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API error (HTTP {status}): {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to parse {provider} response: {message}")]
    Parse {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} returned no text content")]
    EmptyResponse { provider: &'static str },

    #[error("{provider} blocked the request: {reason}")]
    Blocked {
        provider: &'static str,
        reason: String,
    },
}

/// Sampling parameters for one call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&LlmConfig> for GenerationParams {
    fn from(config: &LlmConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.effective_max_tokens(),
        }
    }
}

/// Text-in, text-out completion capability
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider identifier for logs
    fn provider(&self) -> &'static str;

    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError>;
}

/// Build a client for the named config entry, resolving its API key
pub fn build_client(name: &str, config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    let api_key = config.api_key().ok_or_else(|| LlmError::MissingApiKey {
        name: name.to_string(),
        env: config.api_key_env.clone(),
    })?;

    log_info!(
        "Initializing LLM client for: {} (type: {})",
        name,
        config.provider
    );

    let base_url = config.base_url.clone();
    let model = config.model_name.clone();
    let client: Arc<dyn LlmClient> = match config.provider {
        ProviderKind::OpenAI => Arc::new(OpenAiClient::openai(api_key, model, base_url)?),
        ProviderKind::OpenRouter => Arc::new(OpenAiClient::openrouter(api_key, model, base_url)?),
        ProviderKind::Anthropic => Arc::new(AnthropicClient::new(api_key, model, base_url)?),
        ProviderKind::Gemini => Arc::new(GeminiClient::new(api_key, model, base_url)?),
    };
    Ok(client)
}

pub(crate) fn http_client(provider: &'static str) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|source| LlmError::Request { provider, source })
}

/// `base` (without trailing slashes) joined with an operation path
pub(crate) fn endpoint_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Send a request and decode a successful JSON body
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T, LlmError> {
    let response = request
        .send()
        .await
        .map_err(|source| LlmError::Request { provider, source })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| LlmError::Request { provider, source })?;

    if !status.is_success() {
        return Err(LlmError::Api {
            provider,
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| LlmError::Parse {
        provider,
        message: e.to_string(),
    })
}
