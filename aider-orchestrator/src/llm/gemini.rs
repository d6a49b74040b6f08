//! Gemini generateContent client

use aider_orchestrator_sdk::{async_trait, log_error, log_warning};
use serde::Deserialize;
use serde_json::json;

use super::{endpoint_url, http_client, send_json, GenerationParams, LlmClient, LlmError};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiClient {
    api_key: String,
    /// Always carries the `models/` prefix
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: Option<String>) -> Result<Self, LlmError> {
        let model = if model.starts_with("models/") {
            model
        } else {
            format!("models/{}", model)
        };
        Ok(Self {
            api_key,
            model,
            base_url: base_url.unwrap_or_else(|| GEMINI_API_BASE.to_string()),
            client: http_client("gemini")?,
        })
    }

    fn endpoint(&self) -> String {
        endpoint_url(&self.base_url, &format!("{}:generateContent", self.model))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

fn extract_text(response: GenerateResponse) -> Result<String, LlmError> {
    const PROVIDER: &str = "gemini";

    let Some(candidate) = response.candidates.into_iter().next() else {
        log_warning!("Gemini response has no candidates.");
        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            log_error!("Gemini request blocked. Reason: {}", reason);
            return Err(LlmError::Blocked {
                provider: PROVIDER,
                reason,
            });
        }
        return Err(LlmError::EmptyResponse { provider: PROVIDER });
    };

    let text = candidate
        .content
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text));

    match text {
        Some(text) => Ok(text),
        None => {
            log_warning!("Gemini candidate has no content parts.");
            match candidate.finish_reason.as_deref() {
                Some("SAFETY") => Err(LlmError::Blocked {
                    provider: PROVIDER,
                    reason: "generation stopped due to safety concerns".to_string(),
                }),
                _ => Err(LlmError::EmptyResponse { provider: PROVIDER }),
            }
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "maxOutputTokens": params.max_tokens,
                "temperature": params.temperature,
            },
        });

        let request = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body);

        let response: GenerateResponse = send_json("gemini", request).await?;
        extract_text(response)
    }
}
