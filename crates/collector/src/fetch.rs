//! Feed fetch collaborator interface
//!
//! RSS parsing, feed validation and dedup live behind this trait. The
//! collaborator swallows and logs per-feed errors itself; an `Err`
//! from `fetch_summaries` means the whole fetch pass failed.

use async_trait::async_trait;
use newswire_types::ArticleRecord;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("feed fetch failed: {0}")]
pub struct FetchError(pub String);

/// External collaborator producing deduplicated summary records,
/// grouped by category.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch summary articles for the given categories, or all
    /// categories when `None`. Order is stable within a category.
    async fn fetch_summaries(
        &self,
        categories: Option<&[String]>,
    ) -> Result<HashMap<String, Vec<ArticleRecord>>, FetchError>;
}
