//! Full-text article retrieval with best-effort HTML extraction.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};
use url::Url;

/// Domains known to block scraping bots. Checked before any network
/// call is made.
const BLOCKED_DOMAINS: &[&str] = &["ndtv.com"];

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Fragments shorter than this (in chars) are discarded as nav/boilerplate.
const MIN_SENTENCE_LEN: usize = 10;

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap());
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap());
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static ARTICLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<article[^>]*>(.*?)</article>").unwrap());
static ARTICLE_DIV_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div[^>]*class="[^"]*article[^"]*"[^>]*>(.*?)</div>"#).unwrap()
});
static CONTENT_DIV_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div[^>]*class="[^"]*content[^"]*"[^>]*>(.*?)</div>"#).unwrap()
});
static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p[^>]*>(.*?)</p>").unwrap());
static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body[^>]*>(.*?)</body>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static SENTENCE_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());

/// Seam between the verifier and the network. The production
/// implementation is [`ArticleFetcher`].
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Best-effort article body for a URL. `None` on any failure;
    /// never errors to the caller.
    async fn fetch(&self, url: &str) -> Option<String>;
}

pub struct ArticleFetcher {
    client: reqwest::Client,
}

impl ArticleFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }
}

impl Default for ArticleFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentFetcher for ArticleFetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        if is_blocked_domain(url) {
            warn!(url, "Skipping known blocked domain");
            return None;
        }

        let response = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(url, error = %e, "Article fetch failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(url, status = response.status().as_u16(), "Article fetch non-2xx");
            return None;
        }

        let html = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!(url, error = %e, "Failed to read article body");
                return None;
            }
        };

        let content = extract_content(&html);
        debug!(
            url,
            chars = content.as_deref().map(str::len).unwrap_or(0),
            "Article content extracted"
        );
        content
    }
}

/// Whether the URL's host is (or is a subdomain of) a blocked domain.
pub fn is_blocked_domain(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    BLOCKED_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
}

/// Structural extraction ladder over raw HTML. Tries a primary content
/// container first, then paragraph text, then the whole body.
pub fn extract_content(html: &str) -> Option<String> {
    let html = SCRIPT_RE.replace_all(html, "");
    let html = STYLE_RE.replace_all(&html, "");
    let html = COMMENT_RE.replace_all(&html, "");

    let container = [&*ARTICLE_RE, &*ARTICLE_DIV_RE, &*CONTENT_DIV_RE]
        .iter()
        .find_map(|re| re.captures(&html).map(|c| c[1].to_string()));

    let raw = match container {
        Some(inner) => inner,
        None => {
            let paragraphs: Vec<String> = PARAGRAPH_RE
                .captures_iter(&html)
                .map(|c| c[1].to_string())
                .collect();
            if !paragraphs.is_empty() {
                paragraphs.join("\n")
            } else {
                BODY_RE
                    .captures(&html)
                    .map(|c| c[1].to_string())
                    .unwrap_or_else(|| html.to_string())
            }
        }
    };

    let text = TAG_RE.replace_all(&raw, "");
    let text = WHITESPACE_RE.replace_all(&text, " ");

    let sentences: Vec<&str> = SENTENCE_SPLIT_RE
        .split(text.trim())
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_LEN)
        .collect();

    if sentences.is_empty() {
        None
    } else {
        Some(sentences.join(". "))
    }
}
