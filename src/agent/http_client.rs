//! HTTP model client for OpenAI-compatible chat completion endpoints

use crate::agent::response::ModelError;
use crate::agent::{GenerateRequest, ModelClient};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Configuration for the HTTP model client
#[derive(Debug, Clone)]
pub struct ModelClientConfig {
    /// Base URL of the provider (without trailing slash)
    pub base_url: String,

    /// Bearer token for the provider
    pub api_key: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ModelClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            timeout_secs: 120,
        }
    }
}

impl ModelClientConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Model client speaking the OpenAI-compatible chat completions protocol
#[derive(Debug, Clone)]
pub struct HttpModelClient {
    http: Client,
    base_url: String,
    api_key: String,
    timeout_secs: u64,
}

impl HttpModelClient {
    pub fn new(config: ModelClientConfig) -> Result<Self, ModelError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ModelError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            timeout_secs: config.timeout_secs,
        })
    }

    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<String, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("User-Agent", concat!("dramaturg/", env!("CARGO_PKG_VERSION")))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout(self.timeout_secs)
                } else {
                    ModelError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return match status {
                reqwest::StatusCode::UNAUTHORIZED => {
                    Err(ModelError::Api("invalid API key".to_string()))
                }
                reqwest::StatusCode::TOO_MANY_REQUESTS => {
                    Err(ModelError::Api(format!("rate limited: {body}")))
                }
                reqwest::StatusCode::BAD_REQUEST => {
                    Err(ModelError::Api(format!("rejected request: {body}")))
                }
                _ => Err(ModelError::Transport(format!(
                    "status {status}: {body}"
                ))),
            };
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Malformed(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ModelError::Malformed("response carried no choices".to_string()))
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn generate(&self, request: GenerateRequest) -> Result<JsonValue, ModelError> {
        let system = format!(
            "Respond with a single JSON object matching the '{}' analysis shape. \
             No prose outside the JSON.",
            request.schema.name()
        );

        let content = self
            .chat_completion(ChatCompletionRequest {
                model: request.model,
                messages: vec![
                    ChatMessage {
                        role: "system".to_string(),
                        content: system,
                    },
                    ChatMessage {
                        role: "user".to_string(),
                        content: request.prompt,
                    },
                ],
                temperature: Some(request.temperature),
                max_tokens: request.max_tokens,
                response_format: Some(ResponseFormat {
                    format_type: "json_object".to_string(),
                }),
            })
            .await?;

        serde_json::from_str(&content)
            .map_err(|e| ModelError::Malformed(format!("payload is not valid JSON: {e}")))
    }

    async fn review(&self, text: &str) -> Result<String, ModelError> {
        self.chat_completion(ChatCompletionRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "Give a short, candid review of the following dramatic text."
                        .to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            temperature: Some(0.7),
            max_tokens: Some(1024),
            response_format: None,
        })
        .await
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
