//! Hugging Face router chat completions (OpenAI-compatible)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{ChatMessage, ChatModel, ChatRequest, build_client, missing_key};
use crate::config::InboundAiConfig;
use crate::{InboundAiError, Result};

const SERVICE: &str = "llm";

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
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

/// Content of the first choice of a chat completion response
pub fn parse_completion(json: &str) -> Result<String> {
    let response: CompletionResponse = serde_json::from_str(json)
        .map_err(|e| InboundAiError::llm(format!("malformed completion response: {e}")))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| InboundAiError::llm("completion contained no message content"))
}

/// Chat client for a hosted model. Requests are sent once and never retried.
pub struct HuggingFaceClient {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

impl HuggingFaceClient {
    pub fn new(config: &InboundAiConfig) -> Result<Self> {
        let endpoint = format!(
            "{}/{}/v1/chat/completions",
            config.llm.base_url.trim_end_matches('/'),
            config.llm.model
        );
        Ok(Self {
            client: build_client(config.llm.timeout_seconds)?,
            api_key: config.llm.api_key.clone(),
            endpoint,
            model: config.llm.model.clone(),
            max_tokens: config.llm.max_tokens,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatModel for HuggingFaceClient {
    #[instrument(skip(self, request), fields(model = %self.model, messages = request.messages.len()))]
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| missing_key(SERVICE, "llm.api_key"))?;

        let body = CompletionBody {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Chat completion request failed: {e}");
                InboundAiError::llm(format!("request failed: {e}"))
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| InboundAiError::llm(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            error!(status = status.as_u16(), "Chat completion rejected");
            return Err(InboundAiError::llm(format!("HTTP {status}: {text}")));
        }

        let content = parse_completion(&text)?;
        debug!(chars = content.chars().count(), "Chat completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion() {
        let json = r#"{
          "id": "chatcmpl-1",
          "object": "chat.completion",
          "model": "google/gemma-2-9b-it",
          "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "  1일차: 인천공항 도착\n"},
            "finish_reason": "stop"
          }],
          "usage": {"prompt_tokens": 10, "completion_tokens": 8, "total_tokens": 18}
        }"#;
        assert_eq!(parse_completion(json).unwrap(), "1일차: 인천공항 도착");
    }

    #[test]
    fn test_parse_completion_without_choices() {
        let err = parse_completion(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, InboundAiError::Llm { .. }));

        let err = parse_completion(r#"{"error": "Model is overloaded"}"#).unwrap_err();
        assert!(matches!(err, InboundAiError::Llm { .. }));
    }

    #[test]
    fn test_endpoint_and_missing_key() {
        let config = InboundAiConfig::default();
        let client = HuggingFaceClient::new(&config).unwrap();
        assert!(client.endpoint().ends_with("/google/gemma-2-9b-it/v1/chat/completions"));
        assert!(client.endpoint().starts_with("https://router.huggingface.co/"));
    }

    #[tokio::test]
    async fn test_missing_key_is_config_error() {
        let config = InboundAiConfig::default();
        let client = HuggingFaceClient::new(&config).unwrap();
        let err = client
            .complete(ChatRequest {
                messages: vec![ChatMessage::user("안녕")],
                max_tokens: None,
                temperature: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, InboundAiError::Config { .. }));
    }
}
