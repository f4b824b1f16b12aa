//! LLM judgment over a token-bounded evidence bundle.
//!
//! The backend may deliver the response in arbitrary fragments; they
//! are accumulated into one buffer and label extraction runs exactly
//! once per claim.

use std::sync::Arc;
use std::sync::LazyLock;

use anyhow::Result;
use futures::StreamExt;
use regex::Regex;
use tracing::{info, warn};

use ai_client::{ChatBackend, ChatRequest, Message};
use claimsift_common::{token_budget, Article, ClaimClassification, Label, VerifiedClaim};

/// Context window the evidence budget is computed against.
pub const MAX_CONTEXT_TOKENS: usize = 8192;

/// Reserved for the system instruction and message scaffolding.
const PROMPT_OVERHEAD_TOKENS: usize = 300;

/// Reserved for the claim text inside the user message.
const CLAIM_OVERHEAD_TOKENS: usize = 200;

const SYSTEM_PROMPT: &str = "You are a fact-checking assistant. Judge the claim strictly against \
the reference articles: supported means TRUE, contradicted means FALSE, and if the articles are \
unreliable or insufficient the claim is UNVERIFIABLE.\n\n\
Respond in EXACTLY this format:\n\
LABEL: [TRUE, FALSE, or UNVERIFIABLE]\n\
EXPLANATION: [2-3 sentences explaining your decision]";

static EXPLANATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)EXPLANATION:\s*(.+?)(?:\n\s*\n|\z)").unwrap());

pub struct ClaimClassifier {
    backend: Arc<dyn ChatBackend>,
    max_response_tokens: usize,
}

impl ClaimClassifier {
    pub fn new(backend: Arc<dyn ChatBackend>, max_response_tokens: usize) -> Self {
        Self {
            backend,
            max_response_tokens,
        }
    }

    pub fn model(&self) -> &str {
        self.backend.model()
    }

    /// Tokens left for article evidence after the fixed overheads and
    /// the response reserve. Fixed-priority split of the context
    /// window: scaffolding and the response reserve come first,
    /// evidence takes whatever remains.
    fn article_budget(&self) -> usize {
        let granted = token_budget::allocate(
            &[
                PROMPT_OVERHEAD_TOKENS,
                CLAIM_OVERHEAD_TOKENS,
                self.max_response_tokens,
                usize::MAX,
            ],
            MAX_CONTEXT_TOKENS,
        );
        granted[3]
    }

    /// Classify one verified claim. Never errors: backend failures
    /// surface as the `ERROR` label with the message as the response.
    pub async fn classify(&self, verified: &VerifiedClaim) -> ClaimClassification {
        let mut record = ClaimClassification {
            claim: verified.claim.clone(),
            original_claim: verified.original_claim.clone(),
            search_query: verified.search_query.clone(),
            category: verified.category.clone(),
            label: Label::Unverifiable,
            llm_response: String::new(),
            articles_used: 0,
            total_tokens: verified.total_tokens,
        };

        if verified.articles.is_empty() {
            record.llm_response = "No articles available for verification.".to_string();
            info!(claim = verified.claim.as_str(), "No evidence, claim unverifiable");
            return record;
        }

        let (evidence, used) = assemble_evidence(&verified.articles, self.article_budget());
        record.articles_used = used;

        let request = ChatRequest::new()
            .message(Message::system(SYSTEM_PROMPT))
            .message(Message::user(user_prompt(&verified.claim, &evidence)))
            .max_tokens(self.max_response_tokens as u32)
            .temperature(0.1);

        info!(
            claim = verified.claim.as_str(),
            articles = used,
            evidence_tokens = token_budget::count(&evidence),
            "Classifying claim"
        );

        let response = match self.collect_response(request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(claim = verified.claim.as_str(), error = %e, "Backend invocation failed");
                record.label = Label::Error;
                record.llm_response = format!("Error: {e}");
                return record;
            }
        };

        record.label = extract_label(&response);
        match extract_explanation(&response) {
            Some(explanation) => info!(
                label = %record.label,
                explanation = explanation.as_str(),
                "Claim classified"
            ),
            None => info!(label = %record.label, "Claim classified"),
        }
        record.llm_response = response;
        record
    }

    /// Drain the delta stream into one buffer.
    async fn collect_response(&self, request: ChatRequest) -> Result<String> {
        let mut stream = self.backend.chat_stream(request).await?;
        let mut response = String::new();
        while let Some(delta) = stream.next().await {
            response.push_str(&delta?);
        }
        Ok(response)
    }
}

fn user_prompt(claim: &str, evidence: &str) -> String {
    format!(
        "CLAIM TO VERIFY: {claim}\n\n\
         REFERENCE ARTICLES:\n{evidence}\n\n\
         Decide whether the claim is supported (TRUE), contradicted (FALSE), or not decidable \
         from these articles (UNVERIFIABLE)."
    )
}

/// Concatenate article blocks until the budget would overflow; the
/// first overflowing block is truncated rather than dropped so the
/// bundle fills the budget as tightly as possible. Returns the bundle
/// and the number of articles that contributed to it.
pub fn assemble_evidence(articles: &[Article], max_tokens: usize) -> (String, usize) {
    let mut evidence = String::new();
    let mut remaining = max_tokens;
    let mut used = 0;

    for (i, article) in articles.iter().enumerate() {
        if remaining == 0 {
            break;
        }

        // Prefer fetched full text, fall back to the provider summary.
        let content = article
            .content
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(&article.description);

        let block = format!(
            "\n\nArticle {}:\nTitle: {}\nSource: {}\nPublished: {}\nSummary: {}\nContent: {}",
            i + 1,
            article.title,
            article.source,
            article.published_at,
            article.description,
            content,
        );

        let block_tokens = token_budget::count(&block);
        if block_tokens <= remaining {
            evidence.push_str(&block);
            remaining -= block_tokens;
            used += 1;
        } else {
            evidence.push_str(&token_budget::truncate(&block, remaining));
            used += 1;
            break;
        }
    }

    (evidence, used)
}

/// Deterministic verdict extraction. Priority: the exact label lines,
/// case-insensitive; then a bare true/false not negated by "not";
/// otherwise UNVERIFIABLE.
pub fn extract_label(response: &str) -> Label {
    let upper = response.to_uppercase();
    if upper.contains("LABEL: TRUE") {
        return Label::True;
    }
    if upper.contains("LABEL: FALSE") {
        return Label::False;
    }
    if upper.contains("LABEL: UNVERIFIABLE") {
        return Label::Unverifiable;
    }

    let lower = response.to_lowercase();
    if lower.contains("false") {
        if lower.contains("not false") || lower.contains("isn't false") {
            return Label::True;
        }
        return Label::False;
    }
    if lower.contains("true") {
        if lower.contains("not true") || lower.contains("isn't true") {
            return Label::False;
        }
        return Label::True;
    }

    Label::Unverifiable
}

/// Explanation line from the declared output format, up to the next
/// blank line.
pub fn extract_explanation(response: &str) -> Option<String> {
    let caps = EXPLANATION_RE.captures(response)?;
    let explanation = caps[1].trim().to_string();
    (!explanation.is_empty()).then_some(explanation)
}
