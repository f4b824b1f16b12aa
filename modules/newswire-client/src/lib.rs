pub mod error;
pub mod gnews;
pub mod newsapi;
pub mod types;

pub use error::{NewswireError, Result};
pub use gnews::GNewsClient;
pub use newsapi::NewsApiClient;
pub use types::NewsArticle;

use async_trait::async_trait;

/// A news-search backend. Adding a provider means adding an adapter
/// that implements this trait, not branching at call sites.
#[async_trait]
pub trait NewsSearchProvider: Send + Sync {
    /// Short provider name used in logs and result records.
    fn name(&self) -> &str;

    /// Search news for a query. A well-formed empty article list is a
    /// success, not an error.
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<NewsArticle>>;
}
