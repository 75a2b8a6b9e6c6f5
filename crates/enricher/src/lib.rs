//! Newswire enricher
//!
//! The consumer side of the pipeline: polls summary envelopes from the
//! raw-items topic, scrapes the full article body, persists it through
//! the storage collaborator and republishes an enriched envelope to
//! the cleaned topic. Offsets are committed only after all side
//! effects succeed, giving at-least-once delivery; failures emit a
//! best-effort alert and leave the offset uncommitted.
//!
//! Two pipelines share the per-message state machine:
//! [`SyncConsumer`] processes one message at a time,
//! [`BatchConsumer`] processes a bounded window concurrently and
//! commits once per batch.

pub mod alert;
pub mod batch;
pub mod error;
pub mod scrape;
pub mod storage;
pub mod sync;

mod process;

pub use batch::BatchConsumer;
pub use error::{EnricherError, Result};
pub use process::ConsumerContext;
pub use scrape::{BlockingScraper, Enricher, ScrapeError, Scraper};
pub use storage::{ArticleStore, MemoryArticleStore, StorageError};
pub use sync::SyncConsumer;

use std::time::Duration;

/// Runtime settings shared by both consumer pipelines.
#[derive(Debug, Clone)]
pub struct ConsumerOptions {
    /// Topic for enriched envelopes
    pub cleaned_topic: String,
    /// Topic for best-effort failure alerts
    pub alerts_topic: String,
    /// Bounded wait for each poll call
    pub poll_timeout: Duration,
    /// Concurrency bound for the batch pipeline
    pub concurrency: usize,
    /// Interval between periodic metrics log lines
    pub metrics_interval: Duration,
    /// Bounded wait for alert publishes
    pub alert_timeout: Duration,
    /// Bounded wait for the shutdown producer flush
    pub flush_timeout: Duration,
}

impl Default for ConsumerOptions {
    fn default() -> Self {
        Self {
            cleaned_topic: "articles.cleaned".to_string(),
            alerts_topic: "alerts.feed_failures".to_string(),
            poll_timeout: Duration::from_secs(1),
            concurrency: 5,
            metrics_interval: Duration::from_secs(10),
            alert_timeout: Duration::from_secs(5),
            flush_timeout: Duration::from_secs(10),
        }
    }
}
