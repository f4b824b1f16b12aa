use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{NewswireError, Result};
use crate::types::{GNewsResponse, NewsArticle};
use crate::NewsSearchProvider;

const GNEWS_BASE_URL: &str = "https://gnews.io/api/v4";

/// GNews search client. The API key travels as the `token` query
/// parameter.
pub struct GNewsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GNewsClient {
    pub fn new(api_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: GNEWS_BASE_URL.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl NewsSearchProvider for GNewsClient {
    fn name(&self) -> &str {
        "gnews"
    }

    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<NewsArticle>> {
        let url = format!("{}/search", self.base_url);
        debug!(query, max_results, "GNews search request");

        let max = max_results.to_string();
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("token", self.api_key.as_str()),
                ("lang", "en"),
                ("max", max.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(NewswireError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GNewsResponse = resp.json().await?;
        Ok(body.articles.into_iter().map(NewsArticle::from).collect())
    }
}
