use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ai_client::{ChatBackend, Claude, Ollama};
use claimsift_common::AppConfig;
use claimsift_pipeline::verifier::DEFAULT_CLAIM_DELAY;
use claimsift_pipeline::{
    ArticleFetcher, CallBudget, ClaimClassifier, ClaimVerifier, NewsProviderPool, PipelineDriver,
};
use newswire_client::{GNewsClient, NewsApiClient, NewsSearchProvider};

const DEFAULT_MAX_RESULTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    /// Remote Anthropic messages backend.
    Claude,
    /// Local Ollama backend.
    Ollama,
}

#[derive(Parser, Debug)]
#[command(name = "claimsift", about = "Fact-check extracted claims against news sources")]
struct Args {
    /// Claims input file (JSON array from the extraction stage).
    #[arg(long)]
    claims: PathBuf,

    /// Directory for the fact-check and classification artifacts.
    #[arg(long, default_value = "results")]
    out_dir: PathBuf,

    /// Ceiling on news-API calls for this run (overrides MAX_API_CALLS).
    #[arg(long)]
    max_api_calls: Option<u32>,

    /// Response-token bound for the classifier (overrides MAX_RESPONSE_TOKENS).
    #[arg(long)]
    max_response_tokens: Option<usize>,

    /// Generative backend for classification.
    #[arg(long, value_enum, default_value_t = BackendKind::Ollama)]
    backend: BackendKind,

    /// Model name for the chosen backend.
    #[arg(long, default_value = "qwen2.5:1.5b")]
    model: String,

    /// Stop after the verification stage.
    #[arg(long)]
    skip_classification: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("claimsift=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::from_env()?;

    let max_api_calls = args.max_api_calls.unwrap_or(config.max_api_calls);
    let max_response_tokens = args
        .max_response_tokens
        .unwrap_or(config.max_response_tokens);

    info!("Claimsift starting...");

    // Providers in fixed priority order: GNews first, NewsAPI fallback.
    let mut providers: Vec<Arc<dyn NewsSearchProvider>> = Vec::new();
    if let Some(ref key) = config.gnews_api_key {
        providers.push(Arc::new(GNewsClient::new(key)));
    }
    if let Some(ref key) = config.newsapi_key {
        providers.push(Arc::new(NewsApiClient::new(key)));
    }
    if providers.is_empty() {
        warn!("No news provider keys configured; external verification will find no articles");
    }

    let backend: Arc<dyn ChatBackend> = match args.backend {
        BackendKind::Claude => Arc::new(Claude::from_env(&args.model)?),
        BackendKind::Ollama => {
            let url = config
                .ollama_url
                .as_deref()
                .unwrap_or("http://localhost:11434");
            Arc::new(Ollama::new(url, &args.model))
        }
    };

    let budget = Arc::new(CallBudget::new(max_api_calls));
    let pool = NewsProviderPool::new(providers, budget.clone(), DEFAULT_MAX_RESULTS);
    let verifier = ClaimVerifier::new(
        pool,
        Arc::new(ArticleFetcher::new()),
        budget,
        DEFAULT_CLAIM_DELAY,
    );
    let classifier = ClaimClassifier::new(backend, max_response_tokens);
    let mut driver = PipelineDriver::new(verifier, classifier);

    let fact_check_out = args.out_dir.join("fact_check_results.json");
    let classification_out = args.out_dir.join("fact_check_classification_results.json");

    let outcome = if args.skip_classification {
        driver.run_verification(&args.claims, &fact_check_out).await
    } else {
        driver
            .run(&args.claims, &fact_check_out, &classification_out)
            .await
    };

    match outcome {
        Some(path) => {
            info!(path = %path.display(), "Pipeline complete");
            Ok(())
        }
        None => bail!("pipeline aborted during setup; see log for details"),
    }
}
