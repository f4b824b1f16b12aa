//! Provider pool: fixed-priority failover over news-search backends
//! under the global call budget.

use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use newswire_client::{NewsArticle, NewsSearchProvider};

use crate::budget::CallBudget;

/// Queries longer than this are truncated before hitting a provider.
const MAX_QUERY_CHARS: usize = 100;

/// Consecutive request-level failures (connect/timeout) before a
/// provider is treated as gone for the run.
const MAX_REQUEST_FAILURES: u32 = 2;

static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").unwrap());

struct PoolEntry {
    provider: Arc<dyn NewsSearchProvider>,
    available: bool,
    request_failures: u32,
}

/// One `search()` call walks the providers in priority order, spending
/// one budget unit per attempt. A provider that signals quota or
/// permission failure is exhausted for the rest of the run.
pub struct NewsProviderPool {
    entries: Vec<PoolEntry>,
    budget: Arc<CallBudget>,
    max_results: u32,
}

impl NewsProviderPool {
    pub fn new(
        providers: Vec<Arc<dyn NewsSearchProvider>>,
        budget: Arc<CallBudget>,
        max_results: u32,
    ) -> Self {
        let entries = providers
            .into_iter()
            .map(|provider| PoolEntry {
                provider,
                available: true,
                request_failures: 0,
            })
            .collect();

        Self {
            entries,
            budget,
            max_results,
        }
    }

    /// Search across providers. Returns the articles and the name of
    /// the provider that supplied them, or `([], "none")` when the
    /// budget is spent, every provider is exhausted, or nothing came
    /// back for either query form.
    pub async fn search(&mut self, query: &str) -> (Vec<NewsArticle>, String) {
        if self.budget.is_exhausted() {
            warn!(
                used = self.budget.used(),
                ceiling = self.budget.ceiling(),
                "Call budget reached, skipping search"
            );
            return (Vec::new(), "none".to_string());
        }

        let sanitized = sanitize_query(query);
        if let Some(hit) = self.provider_pass(&sanitized).await {
            return hit;
        }

        // Nothing from the full pass: one more pass with a shortened
        // query, still under the same budget.
        let alternative = alternative_query(&sanitized);
        if alternative == sanitized {
            return (Vec::new(), "none".to_string());
        }
        info!(query = alternative.as_str(), "Retrying with alternative query");
        if let Some(hit) = self.provider_pass(&alternative).await {
            return hit;
        }

        (Vec::new(), "none".to_string())
    }

    /// Walk every available provider once with the given query.
    /// `Some` only for a non-empty article list; an empty success
    /// falls through to the next provider.
    async fn provider_pass(&mut self, query: &str) -> Option<(Vec<NewsArticle>, String)> {
        for idx in 0..self.entries.len() {
            if !self.entries[idx].available {
                continue;
            }
            // One budget unit per attempt, spent before the result is
            // inspected.
            if !self.budget.try_consume() {
                warn!(ceiling = self.budget.ceiling(), "Call budget reached mid-pass");
                return None;
            }

            let provider = self.entries[idx].provider.clone();
            let name = provider.name().to_string();
            info!(
                provider = name.as_str(),
                query,
                call = self.budget.used(),
                ceiling = self.budget.ceiling(),
                "News API call"
            );

            match provider.search(query, self.max_results).await {
                Ok(articles) if !articles.is_empty() => {
                    info!(provider = name.as_str(), count = articles.len(), "Articles found");
                    self.entries[idx].request_failures = 0;
                    return Some((articles, name));
                }
                Ok(_) => {
                    info!(provider = name.as_str(), "No articles, trying next provider");
                    self.entries[idx].request_failures = 0;
                }
                Err(e) if e.is_quota() => {
                    warn!(provider = name.as_str(), error = %e, "Provider exhausted for this run");
                    self.entries[idx].available = false;
                }
                Err(e) if e.is_request_failure() => {
                    self.entries[idx].request_failures += 1;
                    if self.entries[idx].request_failures >= MAX_REQUEST_FAILURES {
                        warn!(provider = name.as_str(), error = %e, "Repeated request failures, provider exhausted");
                        self.entries[idx].available = false;
                    } else {
                        warn!(provider = name.as_str(), error = %e, "Request failed, trying next provider");
                    }
                }
                Err(e) => {
                    warn!(provider = name.as_str(), error = %e, "Provider error, trying next provider");
                }
            }
        }
        None
    }
}

/// Strip punctuation, collapse whitespace, and cap length so the query
/// survives every provider's URL rules.
pub fn sanitize_query(query: &str) -> String {
    let cleaned = NON_WORD_RE.replace_all(query, " ");
    let cleaned = WHITESPACE_RE.replace_all(&cleaned, " ");
    let cleaned = cleaned.trim();
    match cleaned.char_indices().nth(MAX_QUERY_CHARS) {
        Some((byte_idx, _)) => cleaned[..byte_idx].trim_end().to_string(),
        None => cleaned.to_string(),
    }
}

/// A shorter fallback query: the first few keywords of the original.
pub fn alternative_query(query: &str) -> String {
    let terms: Vec<&str> = WORD_RE.find_iter(query).map(|m| m.as_str()).collect();
    if terms.len() >= 3 {
        terms[..3].join(" ")
    } else if terms.len() == 2 {
        terms[..2].join(" ")
    } else {
        query.to_string()
    }
}
