//! Scrape collaborator interface and enrichment strategies
//!
//! Main-content extraction lives behind the scraper traits. The
//! pipeline selects one enrichment strategy at construction time: a
//! native async scraper, or a blocking scraper dispatched to the
//! runtime's worker pool. Either way the caller's semaphore bounds how
//! many fetches run at once, so the strategy never changes the
//! pipeline's backpressure.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use newswire_types::ArticleRecord;

/// Scrape error types
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// The fetch itself failed (network, HTTP, parse)
    #[error("full content fetch failed: {0}")]
    Fetch(String),

    /// The fetch succeeded but produced no usable text
    #[error("no content extracted")]
    NoContent,

    /// The pooled fetch task was torn down before finishing
    #[error("scrape task aborted")]
    Aborted,
}

/// Async scrape collaborator.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Fetch the cleaned full text for exactly one article.
    async fn scrape_full_text(&self, article: &ArticleRecord) -> Result<String, ScrapeError>;
}

/// Blocking scrape collaborator, for extraction stacks without an
/// async client.
pub trait BlockingScraper: Send + Sync {
    fn scrape_full_text(&self, article: &ArticleRecord) -> Result<String, ScrapeError>;
}

/// Enrichment strategy, fixed at construction time.
#[derive(Clone)]
pub enum Enricher {
    /// Scraper with a native async fetch path
    Native(Arc<dyn Scraper>),
    /// Blocking scraper run on the worker pool
    Pooled(Arc<dyn BlockingScraper>),
}

impl Enricher {
    pub fn native(scraper: Arc<dyn Scraper>) -> Self {
        Self::Native(scraper)
    }

    pub fn pooled(scraper: Arc<dyn BlockingScraper>) -> Self {
        Self::Pooled(scraper)
    }

    /// Fetch the full text for one article. Empty or whitespace-only
    /// content counts as a failed enrichment.
    pub async fn enrich(&self, article: &ArticleRecord) -> Result<String, ScrapeError> {
        let content = match self {
            Self::Native(scraper) => scraper.scrape_full_text(article).await?,
            Self::Pooled(scraper) => {
                let scraper = Arc::clone(scraper);
                let article = article.clone();
                tokio::task::spawn_blocking(move || scraper.scrape_full_text(&article))
                    .await
                    .map_err(|_| ScrapeError::Aborted)??
            }
        };
        if content.trim().is_empty() {
            return Err(ScrapeError::NoContent);
        }
        Ok(content)
    }
}
