use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{NewswireError, Result};
use crate::types::{NewsApiResponse, NewsArticle};
use crate::NewsSearchProvider;

const NEWSAPI_BASE_URL: &str = "https://newsapi.org/v2";

/// NewsAPI `everything` search client. The API key travels as the
/// `apiKey` query parameter.
pub struct NewsApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    pub fn new(api_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: NEWSAPI_BASE_URL.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl NewsSearchProvider for NewsApiClient {
    fn name(&self) -> &str {
        "newsapi"
    }

    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<NewsArticle>> {
        let url = format!("{}/everything", self.base_url);
        debug!(query, max_results, "NewsAPI search request");

        let page_size = max_results.to_string();
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("apiKey", self.api_key.as_str()),
                ("language", "en"),
                ("pageSize", page_size.as_str()),
                ("sortBy", "relevancy"),
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

        let body: NewsApiResponse = resp.json().await?;
        Ok(body.articles.into_iter().map(NewsArticle::from).collect())
    }
}
