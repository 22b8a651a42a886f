//! Clients for the external services the pages read from
//!
//! Each service sits behind a trait so pages and tests can swap in fakes. The
//! data APIs share a retrying client; the language model client never retries.

pub mod kakao;
pub mod llm;
pub mod naver;
pub mod tour;

use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::{Attraction, BlogSnippet, Coordinates, Festival, Place, YearMonth};
use crate::{InboundAiError, Result};

pub use kakao::KakaoClient;
pub use llm::HuggingFaceClient;
pub use naver::NaverBlogClient;
pub use tour::TourApiClient;

const USER_AGENT: &str = concat!("InboundAI/", env!("CARGO_PKG_VERSION"));

/// Festival and seasonal attraction lookups
#[async_trait]
pub trait TourismApi: Send + Sync {
    /// Festivals starting from the first day of `period`
    async fn festivals(&self, period: YearMonth) -> Result<Vec<Festival>>;

    /// Attractions matching a keyword such as a season name
    async fn keyword_attractions(&self, keyword: &str) -> Result<Vec<Attraction>>;
}

/// Map keyword search and address geocoding
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn keyword(&self, query: &str, size: u32) -> Result<Vec<Place>>;

    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>>;
}

#[async_trait]
pub trait BlogSearch: Send + Sync {
    /// Most relevant blog post for the query
    async fn top_post(&self, query: &str) -> Result<Option<BlogSnippet>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Hosted chat-completion model
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<String>;
}

/// HTTP client with exponential-backoff retries on transient failures
pub fn build_retrying_client(timeout_seconds: u32, max_retries: u32) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(u64::from(timeout_seconds)))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| InboundAiError::config(format!("Failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Plain HTTP client for calls that must not be repeated
pub fn build_client(timeout_seconds: u32) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(u64::from(timeout_seconds)))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| InboundAiError::config(format!("Failed to create HTTP client: {e}")))
}

/// `base/path?k=v&...` with every value percent-encoded
#[must_use]
pub fn build_url(base: &str, path: &str, params: &[(&str, &str)]) -> String {
    let mut url = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    for (i, (key, value)) in params.iter().enumerate() {
        url.push(if i == 0 { '?' } else { '&' });
        url.push_str(key);
        url.push('=');
        url.push_str(&urlencoding::encode(value));
    }
    url
}

/// Turn a non-success response into an API error carrying the status
async fn ensure_success(service: &'static str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = match status.as_u16() {
        401 | 403 => format!("authentication rejected: {body}"),
        429 => "rate limit exceeded".to_string(),
        _ => format!("HTTP {status}: {body}"),
    };
    Err(InboundAiError::api_status(service, status.as_u16(), message))
}

fn missing_key(service: &'static str, key: &str) -> InboundAiError {
    InboundAiError::config(format!("{service} requires `{key}` to be configured"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_encodes_values() {
        let url = build_url(
            "https://dapi.kakao.com/v2/local/",
            "/search/keyword.json",
            &[("query", "서울특별시 강남구 관광지"), ("size", "15")],
        );
        assert!(url.starts_with("https://dapi.kakao.com/v2/local/search/keyword.json?query=%EC%84%9C"));
        assert!(url.ends_with("&size=15"));
        assert!(!url.contains(' '));
    }

    #[test]
    fn test_build_url_without_params() {
        assert_eq!(build_url("http://a", "b", &[]), "http://a/b");
    }

    #[test]
    fn test_chat_request_serialization() {
        let request = ChatRequest {
            messages: vec![ChatMessage::system("s"), ChatMessage::user("u")],
            max_tokens: Some(1024),
            temperature: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["max_tokens"], 1024);
        assert!(json.get("temperature").is_none());
    }
}
