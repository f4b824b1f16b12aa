//! End-to-end pipeline tests against scripted in-memory collaborators:
//! no network, real budget accounting, real artifacts on disk.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use ai_client::{ChatBackend, ChatRequest, TextStream};
use claimsift_pipeline::{
    ArticleFetcher, CallBudget, ClaimClassifier, ClaimVerifier, ContentFetcher, NewsProviderPool,
    PipelineDriver,
};
use newswire_client::{NewsArticle, NewsSearchProvider, NewswireError, Result as NewswireResult};

// ---------------------------------------------------------------------------
// Scripted collaborators
// ---------------------------------------------------------------------------

struct ScriptedProvider {
    name: &'static str,
    script: Mutex<VecDeque<NewswireResult<Vec<NewsArticle>>>>,
    default_hit: bool,
    calls: AtomicU32,
}

impl ScriptedProvider {
    /// Replays `script`, then keeps returning one article per call.
    fn always_finding(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            script: Mutex::new(VecDeque::new()),
            default_hit: true,
            calls: AtomicU32::new(0),
        })
    }

    fn scripted(
        name: &'static str,
        script: Vec<NewswireResult<Vec<NewsArticle>>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            script: Mutex::new(script.into()),
            default_hit: false,
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NewsSearchProvider for ScriptedProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn search(&self, _query: &str, _max: u32) -> NewswireResult<Vec<NewsArticle>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            return next;
        }
        if self.default_hit {
            Ok(vec![news_hit("scripted-hit")])
        } else {
            Ok(Vec::new())
        }
    }
}

struct StaticFetcher {
    content: Option<String>,
    calls: AtomicU32,
}

impl StaticFetcher {
    fn with_content(text: &str) -> Arc<Self> {
        Arc::new(Self {
            content: Some(text.to_string()),
            calls: AtomicU32::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            content: None,
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentFetcher for StaticFetcher {
    async fn fetch(&self, _url: &str) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.content.clone()
    }
}

struct ScriptedBackend {
    response: &'static str,
    calls: AtomicU32,
}

impl ScriptedBackend {
    fn new(response: &'static str) -> Arc<Self> {
        Arc::new(Self {
            response,
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    fn model(&self) -> &str {
        "scripted-test-model"
    }

    async fn chat_stream(&self, _request: ChatRequest) -> Result<TextStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Deliver the canned response in two fragments to exercise
        // accumulation.
        let mid = self.response.len() / 2;
        let deltas = vec![
            Ok(self.response[..mid].to_string()),
            Ok(self.response[mid..].to_string()),
        ];
        Ok(Box::pin(futures::stream::iter(deltas)))
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

fn news_hit(title: &str) -> NewsArticle {
    NewsArticle {
        title: title.to_string(),
        description: format!("{title} summary"),
        url: format!("https://example.com/{title}"),
        source: "Example Wire".to_string(),
        published_at: "2025-07-01T00:00:00Z".to_string(),
        content: String::new(),
    }
}

fn verifier_with(
    providers: Vec<Arc<dyn NewsSearchProvider>>,
    fetcher: Arc<dyn ContentFetcher>,
    ceiling: u32,
) -> (ClaimVerifier, Arc<CallBudget>) {
    let budget = Arc::new(CallBudget::new(ceiling));
    let pool = NewsProviderPool::new(providers, budget.clone(), 10);
    let verifier = ClaimVerifier::new(pool, fetcher, budget.clone(), Duration::ZERO);
    (verifier, budget)
}

fn write_claims(path: &Path, json: &str) {
    std::fs::write(path, json).unwrap();
}

const THREE_EXTERNAL_CLAIMS: &str = r#"[
    {"claim": "the dam released water without warning", "search_query": "dam water release", "needs_external_verification": true, "category": "disaster"},
    {"claim": "the bridge collapsed last night", "search_query": "bridge collapse", "needs_external_verification": true, "category": "disaster"},
    {"claim": "schools closed for a week", "search_query": "school closure", "needs_external_verification": true, "category": "civic"}
]"#;

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ceiling_of_one_skips_later_claims_without_network_activity() {
    let dir = tempfile::tempdir().unwrap();
    let claims_path = dir.path().join("claims.json");
    write_claims(&claims_path, THREE_EXTERNAL_CLAIMS);

    let provider = ScriptedProvider::always_finding("gnews");
    let fetcher = StaticFetcher::with_content(
        "Officials confirmed the spillway gates were opened after the overnight inflow surge.",
    );
    let (verifier, budget) = verifier_with(vec![provider.clone()], fetcher.clone(), 1);
    let classifier = ClaimClassifier::new(ScriptedBackend::new("LABEL: TRUE"), 1000);
    let mut driver = PipelineDriver::new(verifier, classifier);

    let out_path = dir.path().join("fact_check_results.json");
    let produced = driver.run_verification(&claims_path, &out_path).await;
    assert_eq!(produced.as_deref(), Some(out_path.as_path()));

    // One provider call total; the single allowed unit went to claim 1.
    assert_eq!(provider.calls(), 1);
    assert_eq!(budget.used(), 1);
    assert_eq!(fetcher.calls(), 1);

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out_path).unwrap()).unwrap();
    let claims = report["verified_claims"].as_array().unwrap();
    assert_eq!(claims.len(), 3);
    assert_eq!(claims[0]["verification_result"], "content_found");
    assert_eq!(claims[1]["verification_result"], "skipped_budget_exhausted");
    assert_eq!(claims[2]["verification_result"], "skipped_budget_exhausted");
    assert_eq!(claims[1]["total_tokens"], 0);
    assert_eq!(claims[2]["total_tokens"], 0);
}

#[tokio::test]
async fn knowledge_path_touches_neither_providers_nor_fetcher() {
    let dir = tempfile::tempdir().unwrap();
    let claims_path = dir.path().join("claims.json");
    write_claims(
        &claims_path,
        r#"[{
            "claim": "the 2004 tsunami struck on December 26",
            "search_query": "2004 tsunami date",
            "needs_external_verification": false,
            "is_historical_claim": true,
            "historical_evidence": "Extensively documented event."
        }]"#,
    );

    let provider = ScriptedProvider::always_finding("gnews");
    let fetcher = StaticFetcher::with_content("irrelevant");
    let (verifier, budget) = verifier_with(vec![provider.clone()], fetcher.clone(), 10);
    let classifier = ClaimClassifier::new(ScriptedBackend::new("LABEL: TRUE"), 1000);
    let mut driver = PipelineDriver::new(verifier, classifier);

    let out_path = dir.path().join("fact_check_results.json");
    driver.run_verification(&claims_path, &out_path).await.unwrap();

    assert_eq!(provider.calls(), 0);
    assert_eq!(fetcher.calls(), 0);
    assert_eq!(budget.used(), 0);

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out_path).unwrap()).unwrap();
    let claim = &report["verified_claims"][0];
    assert_eq!(claim["verification_result"], "verified_by_knowledge");
    assert_eq!(claim["total_tokens"], 0);
    assert_eq!(claim["historical_evidence"], "Extensively documented event.");
}

#[tokio::test]
async fn no_articles_yields_unverifiable_without_model_calls() {
    let dir = tempfile::tempdir().unwrap();
    let claims_path = dir.path().join("claims.json");
    write_claims(
        &claims_path,
        r#"[{"claim": "a new tax was announced yesterday", "search_query": "new tax announcement", "needs_external_verification": true}]"#,
    );

    // Every provider pass comes back empty.
    let provider = ScriptedProvider::scripted("gnews", Vec::new());
    let fetcher = StaticFetcher::with_content("irrelevant");
    let (verifier, _budget) = verifier_with(vec![provider.clone()], fetcher.clone(), 10);
    let backend = ScriptedBackend::new("LABEL: TRUE");
    let classifier = ClaimClassifier::new(backend.clone(), 1000);
    let mut driver = PipelineDriver::new(verifier, classifier);

    let fact_check_out = dir.path().join("fact_check_results.json");
    let classification_out = dir.path().join("classification_results.json");
    let produced = driver
        .run(&claims_path, &fact_check_out, &classification_out)
        .await;
    assert_eq!(produced.as_deref(), Some(classification_out.as_path()));

    assert_eq!(fetcher.calls(), 0);
    assert_eq!(backend.calls(), 0);

    let fact_check: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&fact_check_out).unwrap()).unwrap();
    assert_eq!(
        fact_check["verified_claims"][0]["verification_result"],
        "no_articles_found"
    );

    let classification: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&classification_out).unwrap()).unwrap();
    assert_eq!(classification["classifications"][0]["label"], "UNVERIFIABLE");
    assert_eq!(classification["classifications"][0]["articles_used"], 0);
}

#[tokio::test]
async fn quota_failover_consumes_two_budget_units_in_one_claim() {
    let dir = tempfile::tempdir().unwrap();
    let claims_path = dir.path().join("claims.json");
    write_claims(
        &claims_path,
        r#"[{"claim": "the dam released water without warning", "search_query": "dam water release", "needs_external_verification": true}]"#,
    );

    let primary = ScriptedProvider::scripted(
        "gnews",
        vec![Err(NewswireError::Api {
            status: 429,
            message: "quota exceeded".to_string(),
        })],
    );
    let secondary = ScriptedProvider::scripted("newsapi", vec![Ok(vec![news_hit("hit")])]);
    let fetcher = StaticFetcher::with_content(
        "The irrigation department said the release followed standard operating procedure.",
    );
    let (verifier, budget) = verifier_with(
        vec![primary.clone(), secondary.clone()],
        fetcher.clone(),
        10,
    );
    let classifier = ClaimClassifier::new(ScriptedBackend::new("LABEL: FALSE"), 1000);
    let mut driver = PipelineDriver::new(verifier, classifier);

    let out_path = dir.path().join("fact_check_results.json");
    driver.run_verification(&claims_path, &out_path).await.unwrap();

    assert_eq!(primary.calls(), 1);
    assert_eq!(secondary.calls(), 1);
    assert_eq!(budget.used(), 2);

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out_path).unwrap()).unwrap();
    assert_eq!(
        report["verified_claims"][0]["verification_result"],
        "content_found"
    );
}

#[tokio::test]
async fn rerun_with_existing_artifacts_makes_zero_network_calls() {
    let dir = tempfile::tempdir().unwrap();
    let claims_path = dir.path().join("claims.json");
    write_claims(&claims_path, THREE_EXTERNAL_CLAIMS);

    let provider = ScriptedProvider::always_finding("gnews");
    let fetcher = StaticFetcher::with_content("Some recoverable article body for the record.");
    let (verifier, _) = verifier_with(vec![provider.clone()], fetcher.clone(), 10);
    let backend = ScriptedBackend::new("LABEL: TRUE\nEXPLANATION: Supported by the articles.");
    let classifier = ClaimClassifier::new(backend.clone(), 1000);
    let mut driver = PipelineDriver::new(verifier, classifier);

    let fact_check_out = dir.path().join("fact_check_results.json");
    let classification_out = dir.path().join("classification_results.json");

    let first = driver
        .run(&claims_path, &fact_check_out, &classification_out)
        .await
        .unwrap();
    let provider_calls = provider.calls();
    let backend_calls = backend.calls();
    let first_artifact = std::fs::read_to_string(&classification_out).unwrap();

    let second = driver
        .run(&claims_path, &fact_check_out, &classification_out)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(provider.calls(), provider_calls);
    assert_eq!(backend.calls(), backend_calls);
    assert_eq!(
        std::fs::read_to_string(&classification_out).unwrap(),
        first_artifact
    );
}

#[tokio::test]
async fn failed_fetches_record_null_content_and_no_content_found() {
    let dir = tempfile::tempdir().unwrap();
    let claims_path = dir.path().join("claims.json");
    write_claims(
        &claims_path,
        r#"[{"claim": "the bridge collapsed last night", "search_query": "bridge collapse", "needs_external_verification": true}]"#,
    );

    let provider = ScriptedProvider::scripted(
        "gnews",
        vec![Ok(vec![news_hit("first"), news_hit("second")])],
    );
    let fetcher = StaticFetcher::failing();
    let (verifier, _) = verifier_with(vec![provider.clone()], fetcher.clone(), 10);
    let classifier = ClaimClassifier::new(ScriptedBackend::new("LABEL: UNVERIFIABLE"), 1000);
    let mut driver = PipelineDriver::new(verifier, classifier);

    let out_path = dir.path().join("fact_check_results.json");
    driver.run_verification(&claims_path, &out_path).await.unwrap();

    // Both articles were attempted; neither fetch aborted the claim.
    assert_eq!(fetcher.calls(), 2);

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out_path).unwrap()).unwrap();
    let claim = &report["verified_claims"][0];
    assert_eq!(claim["verification_result"], "no_content_found");
    assert_eq!(claim["total_tokens"], 0);
    let articles = claim["articles"].as_array().unwrap();
    assert_eq!(articles.len(), 2);
    for article in articles {
        assert!(article["content"].is_null());
        assert_eq!(article["content_tokens"], 0);
        assert!(article["publishedAt"].is_string());
    }
}

#[tokio::test]
async fn classification_artifact_carries_model_and_token_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let claims_path = dir.path().join("claims.json");
    write_claims(
        &claims_path,
        r#"[{"claim": "the dam released water without warning", "search_query": "dam water release", "needs_external_verification": true, "original_claim": "dam released water!!", "category": "disaster"}]"#,
    );

    let provider = ScriptedProvider::always_finding("gnews");
    let fetcher = StaticFetcher::with_content(
        "District officials said sirens sounded forty minutes before the gates opened.",
    );
    let (verifier, _) = verifier_with(vec![provider.clone()], fetcher.clone(), 10);
    let backend =
        ScriptedBackend::new("LABEL: FALSE\nEXPLANATION: The articles describe advance warnings.");
    let classifier = ClaimClassifier::new(backend.clone(), 1000);
    let mut driver = PipelineDriver::new(verifier, classifier);

    let fact_check_out = dir.path().join("fact_check_results.json");
    let classification_out = dir.path().join("classification_results.json");
    driver
        .run(&claims_path, &fact_check_out, &classification_out)
        .await
        .unwrap();

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&classification_out).unwrap()).unwrap();
    assert_eq!(report["model_used"], "scripted-test-model");
    assert_eq!(report["max_tokens"], 8192);
    assert!(report["timestamp"].is_string());

    let record = &report["classifications"][0];
    assert_eq!(record["label"], "FALSE");
    assert_eq!(record["original_claim"], "dam released water!!");
    assert_eq!(record["articles_used"], 1);
    assert!(record["llm_response"]
        .as_str()
        .unwrap()
        .contains("advance warnings"));
    assert!(record["total_tokens"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn missing_input_aborts_without_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let claims_path = dir.path().join("does_not_exist.json");

    let provider = ScriptedProvider::always_finding("gnews");
    let (verifier, _) = verifier_with(
        vec![provider.clone()],
        StaticFetcher::with_content("x"),
        10,
    );
    let classifier = ClaimClassifier::new(ScriptedBackend::new("LABEL: TRUE"), 1000);
    let mut driver = PipelineDriver::new(verifier, classifier);

    let out_path = dir.path().join("fact_check_results.json");
    let produced = driver.run_verification(&claims_path, &out_path).await;

    assert!(produced.is_none());
    assert!(!out_path.exists());
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn unparsable_input_aborts_without_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let claims_path = dir.path().join("claims.json");
    write_claims(&claims_path, "{not json");

    let (verifier, _) = verifier_with(
        vec![ScriptedProvider::always_finding("gnews")],
        StaticFetcher::with_content("x"),
        10,
    );
    let classifier = ClaimClassifier::new(ScriptedBackend::new("LABEL: TRUE"), 1000);
    let mut driver = PipelineDriver::new(verifier, classifier);

    let out_path = dir.path().join("fact_check_results.json");
    assert!(driver.run_verification(&claims_path, &out_path).await.is_none());
    assert!(!out_path.exists());
}

#[tokio::test]
async fn real_fetcher_refuses_blocked_domain_article() {
    // The production fetcher, not a mock: a blocked-domain URL must
    // come back as null content with no request attempted (nothing is
    // listening on the URL, and the call returns immediately).
    let fetcher = ArticleFetcher::new();
    let verdict = fetcher.fetch("https://www.ndtv.com/india-news/story").await;
    assert!(verdict.is_none());
}
