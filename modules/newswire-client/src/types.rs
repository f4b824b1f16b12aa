use serde::Deserialize;

/// Provider-normalized search hit. Every provider adapter maps its own
/// wire schema into this shape; `content` holds whatever snippet the
/// provider returned, full text comes later from the article fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsArticle {
    pub title: String,
    pub description: String,
    pub url: String,
    pub source: String,
    pub published_at: String,
    pub content: String,
}

// --- GNews wire schema ---

#[derive(Debug, Deserialize)]
pub(crate) struct GNewsResponse {
    #[serde(default)]
    pub articles: Vec<GNewsArticle>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GNewsArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "publishedAt")]
    pub published_at: String,
    #[serde(default)]
    pub source: GNewsSource,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GNewsSource {
    #[serde(default)]
    pub name: String,
}

impl From<GNewsArticle> for NewsArticle {
    fn from(a: GNewsArticle) -> Self {
        NewsArticle {
            title: a.title,
            description: a.description,
            url: a.url,
            source: a.source.name,
            published_at: a.published_at,
            content: a.content,
        }
    }
}

// --- NewsAPI wire schema ---

#[derive(Debug, Deserialize)]
pub(crate) struct NewsApiResponse {
    #[serde(default)]
    pub articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewsApiArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "publishedAt")]
    pub published_at: String,
    #[serde(default)]
    pub source: NewsApiSource,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NewsApiSource {
    #[serde(default)]
    pub name: String,
}

impl From<NewsApiArticle> for NewsArticle {
    fn from(a: NewsApiArticle) -> Self {
        NewsArticle {
            title: a.title,
            description: a.description.unwrap_or_default(),
            url: a.url,
            source: a.source.name,
            published_at: a.published_at,
            content: a.content.unwrap_or_default(),
        }
    }
}
