//! Anthropic messages API client

use aider_orchestrator_sdk::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{endpoint_url, http_client, send_json, GenerationParams, LlmClient, LlmError};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    api_key: String,
    model: String,
    url: String,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(api_key: String, model: String, base_url: Option<String>) -> Result<Self, LlmError> {
        let base = base_url.as_deref().unwrap_or(ANTHROPIC_API_BASE);
        Ok(Self {
            api_key,
            model,
            url: endpoint_url(base, "messages"),
            client: http_client("anthropic")?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Join every text block; tool-use and other blocks carry no text
fn extract_text(response: MessagesResponse) -> Result<String, LlmError> {
    let blocks: Vec<String> = response
        .content
        .into_iter()
        .filter_map(|block| block.text)
        .collect();

    if blocks.is_empty() {
        return Err(LlmError::EmptyResponse {
            provider: "anthropic",
        });
    }
    Ok(blocks.join("\n"))
}

#[async_trait]
impl LlmClient for AnthropicClient {
    fn provider(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError> {
        let body = json!({
            "model": self.model,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let request = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);

        let response: MessagesResponse = send_json("anthropic", request).await?;
        extract_text(response)
    }
}
