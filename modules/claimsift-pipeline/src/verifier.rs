//! Per-claim verification: knowledge path, budget gate, news search,
//! full-text evidence assembly.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use claimsift_common::{token_budget, Article, Claim, VerificationOutcome, VerifiedClaim};
use newswire_client::NewsArticle;

use crate::budget::CallBudget;
use crate::fetcher::ContentFetcher;
use crate::pool::NewsProviderPool;

/// Pause between claims that hit the news providers.
pub const DEFAULT_CLAIM_DELAY: Duration = Duration::from_secs(1);

pub struct ClaimVerifier {
    pool: NewsProviderPool,
    fetcher: Arc<dyn ContentFetcher>,
    budget: Arc<CallBudget>,
    claim_delay: Duration,
}

impl ClaimVerifier {
    pub fn new(
        pool: NewsProviderPool,
        fetcher: Arc<dyn ContentFetcher>,
        budget: Arc<CallBudget>,
        claim_delay: Duration,
    ) -> Self {
        Self {
            pool,
            fetcher,
            budget,
            claim_delay,
        }
    }

    /// Budget shared with the provider pool, exposed for run summaries.
    pub fn budget(&self) -> &CallBudget {
        &self.budget
    }

    /// Verify one claim. Exactly one of the knowledge path or the
    /// external path runs; the claim itself is never mutated.
    pub async fn verify(&mut self, claim: &Claim) -> VerifiedClaim {
        let mut result = base_result(claim);

        if !claim.needs_external_verification {
            // Knowledge path: no search, no fetch, no budget.
            result.verification_result = VerificationOutcome::VerifiedByKnowledge;
            result.historical_evidence = claim.historical_evidence.clone();
            info!(claim = claim.claim.as_str(), "Verified from model knowledge, skipping search");
            return result;
        }

        if self.budget.is_exhausted() {
            result.verification_result = VerificationOutcome::SkippedBudgetExhausted;
            info!(
                claim = claim.claim.as_str(),
                ceiling = self.budget.ceiling(),
                "Call budget exhausted, skipping external verification"
            );
            return result;
        }

        let (articles, provider) = self.pool.search(claim.effective_query()).await;

        if articles.is_empty() {
            result.verification_result = VerificationOutcome::NoArticlesFound;
            info!(claim = claim.claim.as_str(), "No articles found");
        } else {
            info!(
                claim = claim.claim.as_str(),
                provider = provider.as_str(),
                count = articles.len(),
                "Fetching full article content"
            );
            for hit in &articles {
                result.articles.push(self.fetch_article(hit).await);
            }
            result.total_tokens = result.articles.iter().map(|a| a.content_tokens).sum();
            result.verification_result = if result.total_tokens > 0 {
                VerificationOutcome::ContentFound
            } else {
                VerificationOutcome::NoContentFound
            };
        }

        // Politeness pause toward the providers this claim just hit.
        if !self.claim_delay.is_zero() {
            tokio::time::sleep(self.claim_delay).await;
        }

        result
    }

    /// Fetch one article's full text. A failed fetch records null
    /// content and zero tokens; it never aborts the claim.
    async fn fetch_article(&self, hit: &NewsArticle) -> Article {
        let content = self.fetcher.fetch(&hit.url).await;
        let content_tokens = content.as_deref().map(token_budget::count).unwrap_or(0);

        Article {
            title: hit.title.clone(),
            description: hit.description.clone(),
            url: hit.url.clone(),
            source: hit.source.clone(),
            published_at: hit.published_at.clone(),
            content,
            content_tokens,
        }
    }
}

fn base_result(claim: &Claim) -> VerifiedClaim {
    VerifiedClaim {
        claim: claim.claim.clone(),
        original_claim: claim.original_claim.clone(),
        search_query: claim.search_query.clone(),
        category: claim.category.clone(),
        confidence: claim.confidence.clone(),
        explanation: claim.explanation.clone(),
        fact_check_notes: claim.fact_check_notes.clone(),
        potential_impact: claim.potential_impact.clone(),
        source_url: claim.source_url.clone(),
        post_number: claim.post_number,
        articles: Vec::new(),
        total_tokens: 0,
        verification_result: VerificationOutcome::NoArticlesFound,
        needs_external_verification: claim.needs_external_verification,
        historical_evidence: None,
    }
}
