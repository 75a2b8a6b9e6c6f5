//! Storage collaborator interface
//!
//! The persistent article store is external; the pipeline only relies
//! on its idempotence contract: records are keyed by link, and a
//! stored non-empty `full_content` is never cleared or overwritten.
//! That contract is what makes redelivered messages safe to reprocess.
//! [`MemoryArticleStore`] is an in-process reference implementation
//! used by tests and embedders.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

use newswire_types::ArticleRecord;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// External article store, idempotent on link.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Insert or update the record for `article.link`. Returns whether
    /// a new row was created. Must never replace an existing non-empty
    /// `full_content`.
    async fn upsert_article(&self, article: &ArticleRecord) -> Result<bool, StorageError>;

    /// Release any held connections. Called once on shutdown.
    async fn close(&self) {}
}

/// In-memory store honoring the idempotence contract.
#[derive(Default)]
pub struct MemoryArticleStore {
    articles: RwLock<HashMap<String, ArticleRecord>>,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, link: &str) -> Option<ArticleRecord> {
        self.articles.read().await.get(link).cloned()
    }

    pub async fn len(&self) -> usize {
        self.articles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.articles.read().await.is_empty()
    }
}

fn non_empty(content: Option<String>) -> Option<String> {
    content.filter(|c| !c.is_empty())
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn upsert_article(&self, article: &ArticleRecord) -> Result<bool, StorageError> {
        if article.link.is_empty() {
            return Err(StorageError::Backend("article link is empty".to_string()));
        }

        let mut articles = self.articles.write().await;
        match articles.get_mut(&article.link) {
            Some(existing) => {
                let kept = non_empty(existing.full_content.take())
                    .or_else(|| non_empty(article.full_content.clone()));
                let mut updated = article.clone();
                updated.full_content = kept;
                *existing = updated;
                Ok(false)
            }
            None => {
                let mut inserted = article.clone();
                inserted.full_content = non_empty(inserted.full_content);
                articles.insert(article.link.clone(), inserted);
                Ok(true)
            }
        }
    }
}
