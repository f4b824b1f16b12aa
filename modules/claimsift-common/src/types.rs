use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Claims input ---

fn default_true() -> bool {
    true
}

/// A candidate factual assertion produced by the upstream extraction
/// stage. Read-only for the whole run; verification attaches a
/// [`VerifiedClaim`] instead of mutating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub claim: String,
    #[serde(default)]
    pub original_claim: String,
    #[serde(default)]
    pub search_query: String,
    #[serde(default = "default_true")]
    pub needs_external_verification: bool,
    #[serde(default)]
    pub is_historical_claim: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_evidence: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub fact_check_notes: String,
    #[serde(default)]
    pub potential_impact: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_number: Option<u32>,
}

impl Claim {
    /// Query string handed to the provider pool: the extracted search
    /// query, or the claim text itself when extraction left it empty.
    pub fn effective_query(&self) -> &str {
        if self.search_query.trim().is_empty() {
            &self.claim
        } else {
            &self.search_query
        }
    }
}

// --- Evidence ---

/// One evidence unit embedded in the fact-check artifact. `content` is
/// null when the full-text fetch failed; `content_tokens` always
/// reflects the current `content` value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub url: String,
    pub source: String,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
    pub content: Option<String>,
    pub content_tokens: usize,
}

// --- Verification ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    VerifiedByKnowledge,
    ContentFound,
    NoContentFound,
    NoArticlesFound,
    SkippedBudgetExhausted,
}

impl std::fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationOutcome::VerifiedByKnowledge => write!(f, "verified_by_knowledge"),
            VerificationOutcome::ContentFound => write!(f, "content_found"),
            VerificationOutcome::NoContentFound => write!(f, "no_content_found"),
            VerificationOutcome::NoArticlesFound => write!(f, "no_articles_found"),
            VerificationOutcome::SkippedBudgetExhausted => write!(f, "skipped_budget_exhausted"),
        }
    }
}

/// Outcome of fact-checking one claim. Invariant: `total_tokens` is
/// zero unless `verification_result` is `content_found`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedClaim {
    pub claim: String,
    pub original_claim: String,
    pub search_query: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    pub explanation: String,
    pub fact_check_notes: String,
    pub potential_impact: String,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_number: Option<u32>,
    pub articles: Vec<Article>,
    pub total_tokens: usize,
    pub verification_result: VerificationOutcome,
    pub needs_external_verification: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_evidence: Option<String>,
}

/// Fact-check artifact envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactCheckReport {
    pub timestamp: DateTime<Utc>,
    pub verified_claims: Vec<VerifiedClaim>,
}

// --- Classification ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    True,
    False,
    Unverifiable,
    Error,
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::True => write!(f, "TRUE"),
            Label::False => write!(f, "FALSE"),
            Label::Unverifiable => write!(f, "UNVERIFIABLE"),
            Label::Error => write!(f, "ERROR"),
        }
    }
}

/// Outcome of the LLM judgment on one claim. Invariant: label is
/// `UNVERIFIABLE` whenever no articles reached the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimClassification {
    pub claim: String,
    pub original_claim: String,
    pub search_query: String,
    pub category: String,
    pub label: Label,
    pub llm_response: String,
    pub articles_used: usize,
    pub total_tokens: usize,
}

/// Classification artifact envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub timestamp: DateTime<Utc>,
    pub model_used: String,
    pub max_tokens: usize,
    pub classifications: Vec<ClaimClassification>,
}
