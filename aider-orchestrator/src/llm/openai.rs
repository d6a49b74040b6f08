//! Chat-completions client (OpenAI and OpenRouter)

use aider_orchestrator_sdk::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{endpoint_url, http_client, send_json, GenerationParams, LlmClient, LlmError};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

/// Sent to OpenRouter for app attribution
const OPENROUTER_REFERER: &str = "https://github.com/aider-orchestrator";

pub struct OpenAiClient {
    provider: &'static str,
    api_key: String,
    model: String,
    url: String,
    referer: Option<&'static str>,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn openai(
        api_key: String,
        model: String,
        base_url: Option<String>,
    ) -> Result<Self, LlmError> {
        let base = base_url.as_deref().unwrap_or(OPENAI_API_BASE);
        Ok(Self {
            provider: "openai",
            api_key,
            model,
            url: endpoint_url(base, CHAT_COMPLETIONS_PATH),
            referer: None,
            client: http_client("openai")?,
        })
    }

    pub fn openrouter(
        api_key: String,
        model: String,
        base_url: Option<String>,
    ) -> Result<Self, LlmError> {
        let base = base_url.as_deref().unwrap_or(OPENROUTER_API_BASE);
        Ok(Self {
            provider: "openrouter",
            api_key,
            model,
            url: endpoint_url(base, CHAT_COMPLETIONS_PATH),
            referer: Some(OPENROUTER_REFERER),
            client: http_client("openrouter")?,
        })
    }

    fn request_body(&self, prompt: &str, params: &GenerationParams) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn extract_text(provider: &'static str, response: ChatResponse) -> Result<String, LlmError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.is_empty())
        .ok_or(LlmError::EmptyResponse { provider })
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn provider(&self) -> &'static str {
        self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError> {
        let mut request = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt, params));
        if let Some(referer) = self.referer {
            request = request.header("HTTP-Referer", referer);
        }

        let response: ChatResponse = send_json(self.provider, request).await?;
        extract_text(self.provider, response)
    }
}
