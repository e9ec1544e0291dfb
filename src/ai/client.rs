//! Chat-completion client used for document generation and summaries.

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::info;

use crate::core::models::GenerationConfig;
use crate::errors::{DocError, Service};

/// One text-in/text-out generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub system_instruction: String,
    pub user_text: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl GenerationRequest {
    #[must_use]
    pub fn new(
        model: &str,
        system_instruction: &str,
        user_text: &str,
        max_tokens: u32,
        sampling: GenerationConfig,
    ) -> Self {
        Self {
            model: model.to_string(),
            system_instruction: system_instruction.to_string(),
            user_text: user_text.to_string(),
            max_tokens,
            temperature: sampling.temperature,
            top_p: sampling.top_p,
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the generated text, trimmed.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, DocError>;
}

/// `OpenAI` chat completions over plain HTTP.
pub struct ChatClient {
    http: Client,
    api_key: String,
    org_id: Option<String>,
    base_url: String,
}

impl ChatClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: &str, org_id: Option<String>, base_url: &str) -> Result<Self, DocError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| unavailable(format!("Failed to build OpenAI HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            org_id,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn headers(&self) -> Result<reqwest::header::HeaderMap, DocError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth_value = format!("Bearer {}", self.api_key)
            .parse()
            .map_err(|e| unavailable(format!("Invalid Authorization header: {e}")))?;
        headers.insert("Authorization", auth_value);

        if let Some(org) = &self.org_id {
            let org_value = org
                .parse()
                .map_err(|e| unavailable(format!("Invalid OpenAI-Organization header: {e}")))?;
            headers.insert("OpenAI-Organization", org_value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl TextGenerator for ChatClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, DocError> {
        let prompt = build_prompt(&request.system_instruction, &request.user_text);

        #[cfg(feature = "debug-logs")]
        info!("Using chat prompt:\n{:?}", prompt);

        #[cfg(not(feature = "debug-logs"))]
        info!(
            model = %request.model,
            user_chars = request.user_text.chars().count(),
            max_tokens = request.max_tokens,
            "Requesting chat completion"
        );

        let body = json!({
            "model": request.model,
            "messages": build_chat_messages(&prompt),
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "top_p": request.top_p,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| unavailable(format!("OpenAI API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|e| {
                format!("Failed to read error response body (status {status}): {e}")
            });
            return Err(DocError::BadStatus {
                service: Service::TextGeneration,
                status: status.as_u16().to_string(),
                message: Some(error_text),
            });
        }

        let response_json: Value = response.json().await.map_err(|e| {
            DocError::InvalidResponse {
                service: Service::TextGeneration,
                reason: format!("Failed to parse OpenAI response: {e}"),
            }
        })?;

        extract_completion_text(&response_json).ok_or_else(|| DocError::InvalidResponse {
            service: Service::TextGeneration,
            reason: "response has no choices[0].message.content".to_string(),
        })
    }
}

fn unavailable(reason: String) -> DocError {
    DocError::ServiceUnavailable {
        service: Service::TextGeneration,
        reason,
    }
}

#[must_use]
pub fn build_prompt(system_instruction: &str, user_text: &str) -> Vec<ChatCompletionMessage> {
    vec![
        ChatCompletionMessage {
            role: MessageRole::system,
            content: Content::Text(system_instruction.to_string()),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        },
        ChatCompletionMessage {
            role: MessageRole::user,
            content: Content::Text(user_text.to_string()),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        },
    ]
}

/// Converts prompt messages into the chat-completions `messages` array.
///
/// Image parts are dropped; only text content is ever sent.
pub(crate) fn build_chat_messages(prompt: &[ChatCompletionMessage]) -> Vec<Value> {
    prompt
        .iter()
        .filter_map(|m| {
            let role_str = match m.role {
                MessageRole::system => "system",
                MessageRole::assistant => "assistant",
                MessageRole::user | MessageRole::function | MessageRole::tool => "user",
            };
            match &m.content {
                Content::Text(t) => Some(json!({ "role": role_str, "content": t })),
                Content::ImageUrl(_) => None,
            }
        })
        .collect()
}

/// Pulls `choices[0].message.content`, trimmed; `None` when absent or blank.
#[must_use]
pub fn extract_completion_text(response: &Value) -> Option<String> {
    response
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
