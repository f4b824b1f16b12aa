use anyhow::Result;

/// Application configuration loaded from environment variables.
/// Secrets and env-specific values only; paths and per-run limits come
/// from the CLI.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // News providers
    pub gnews_api_key: Option<String>,
    pub newsapi_key: Option<String>,

    // Generative backends
    pub anthropic_api_key: Option<String>,
    pub ollama_url: Option<String>,

    // Budgets
    pub max_api_calls: u32,
    pub max_response_tokens: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            gnews_api_key: std::env::var("GNEWS_API_KEY").ok(),
            newsapi_key: std::env::var("NEWSAPI_KEY").ok(),
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            ollama_url: std::env::var("OLLAMA_URL").ok(),
            max_api_calls: std::env::var("MAX_API_CALLS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            max_response_tokens: std::env::var("MAX_RESPONSE_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
        };

        config.log_keys();
        Ok(config)
    }

    fn log_keys(&self) {
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => {
                    let n = v.len().min(5);
                    format!("{}...({} chars)", &v[..n], v.len())
                }
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  GNEWS_API_KEY: {}", preview_opt(&self.gnews_api_key));
        tracing::info!("  NEWSAPI_KEY: {}", preview_opt(&self.newsapi_key));
        tracing::info!(
            "  ANTHROPIC_API_KEY: {}",
            preview_opt(&self.anthropic_api_key)
        );
        tracing::info!("  OLLAMA_URL: {}", preview_opt(&self.ollama_url));
        tracing::info!("  MAX_API_CALLS: {}", self.max_api_calls);
    }
}
