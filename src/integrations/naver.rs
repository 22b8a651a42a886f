//! Naver blog search, used for short place and festival descriptions

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use super::{BlogSearch, build_retrying_client, build_url, ensure_success, missing_key};
use crate::cache::{PersistentCache, get_or_fetch};
use crate::config::InboundAiConfig;
use crate::models::BlogSnippet;
use crate::text::clean_html;
use crate::{InboundAiError, Result};

const SERVICE: &str = "naver";

#[derive(Debug, Deserialize)]
struct BlogResponse {
    #[serde(default)]
    items: Vec<BlogItem>,
}

#[derive(Debug, Deserialize)]
struct BlogItem {
    #[serde(default)]
    description: String,
    #[serde(default)]
    link: String,
}

/// First post of a blog search response, description cleaned of markup
pub fn parse_top_post(json: &str) -> Result<Option<BlogSnippet>> {
    let response: BlogResponse = serde_json::from_str(json)
        .map_err(|e| InboundAiError::api(SERVICE, format!("malformed blog response: {e}")))?;
    Ok(response.items.into_iter().next().map(|item| BlogSnippet {
        description: clean_html(&item.description),
        link: item.link,
    }))
}

pub struct NaverBlogClient {
    client: ClientWithMiddleware,
    client_id: Option<String>,
    client_secret: Option<String>,
    base_url: String,
    cache: Option<Arc<PersistentCache>>,
    ttl: Duration,
}

impl NaverBlogClient {
    pub fn new(config: &InboundAiConfig, cache: Option<Arc<PersistentCache>>) -> Result<Self> {
        Ok(Self {
            client: build_retrying_client(config.apis.timeout_seconds, config.apis.max_retries)?,
            client_id: config.apis.naver_client_id.clone(),
            client_secret: config.apis.naver_client_secret.clone(),
            base_url: config.apis.naver_base_url.clone(),
            cache,
            ttl: Duration::from_secs(u64::from(config.cache.blog_ttl_minutes) * 60),
        })
    }

    async fn search(&self, query: &str) -> Result<Option<BlogSnippet>> {
        let id = self
            .client_id
            .as_deref()
            .ok_or_else(|| missing_key(SERVICE, "apis.naver_client_id"))?;
        let secret = self
            .client_secret
            .as_deref()
            .ok_or_else(|| missing_key(SERVICE, "apis.naver_client_secret"))?;

        let url = build_url(
            &self.base_url,
            "blog.json",
            &[("query", query), ("display", "1"), ("sort", "sim")],
        );
        let response = self
            .client
            .get(&url)
            .header("X-Naver-Client-Id", id)
            .header("X-Naver-Client-Secret", secret)
            .send()
            .await
            .map_err(|e| InboundAiError::api(SERVICE, format!("request failed: {e}")))?;
        let body = ensure_success(SERVICE, response)
            .await?
            .text()
            .await
            .map_err(|e| InboundAiError::api(SERVICE, format!("failed to read body: {e}")))?;
        parse_top_post(&body)
    }
}

#[async_trait]
impl BlogSearch for NaverBlogClient {
    #[instrument(skip(self))]
    async fn top_post(&self, query: &str) -> Result<Option<BlogSnippet>> {
        let cache_key = format!("naver:blog:{query}");
        get_or_fetch(self.cache.as_deref(), &cache_key, self.ttl, move || self.search(query)).await
    }
}
