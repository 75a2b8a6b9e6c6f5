//! Producer pipeline
//!
//! Fetches summary articles, builds wire envelopes and publishes them
//! to the raw-items topic. One message's failure never aborts the
//! batch: queue exhaustion gets one flush-and-retry, every other
//! publish error is counted and skipped.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use thiserror::Error;
use tracing::{error, info, warn};

use newswire_broker::{MessagePublisher, PublishError};
use newswire_types::{codec, ArticleRecord, ArticleSummaryEnvelope, PipelineMetrics, ShutdownFlag};

use crate::fetch::{FeedFetcher, FetchError};

#[derive(Error, Debug)]
pub enum CollectorError {
    /// The whole fetch pass failed; the batch is abandoned
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

pub type Result<T> = std::result::Result<T, CollectorError>;

/// Producer pipeline over the raw-items topic.
pub struct FeedProducer {
    fetcher: Arc<dyn FeedFetcher>,
    publisher: Arc<dyn MessagePublisher>,
    topic: String,
    metrics: Arc<PipelineMetrics>,
    flush_timeout: Duration,
}

impl FeedProducer {
    pub fn new(
        fetcher: Arc<dyn FeedFetcher>,
        publisher: Arc<dyn MessagePublisher>,
        topic: impl Into<String>,
        metrics: Arc<PipelineMetrics>,
        flush_timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            publisher,
            topic: topic.into(),
            metrics,
            flush_timeout,
        }
    }

    /// Fetch one batch of summaries and publish them all, returning
    /// the number of successfully submitted (not necessarily acked)
    /// messages.
    pub async fn produce_batch(&self, categories: Option<&[String]>) -> Result<usize> {
        let by_category = self.fetcher.fetch_summaries(categories).await?;
        let articles: Vec<ArticleRecord> =
            by_category.into_values().flatten().collect();

        info!(count = articles.len(), topic = %self.topic, "producing summary articles");

        let mut submitted = 0usize;
        for article in &articles {
            if article.link.is_empty() {
                warn!(title = %article.title, "skipping article without link");
                self.metrics.incr_produce_error();
                continue;
            }

            let envelope = ArticleSummaryEnvelope::from_record(article);
            let payload = match codec::encode(&envelope) {
                Ok(payload) => payload,
                Err(e) => {
                    error!(link = %envelope.link, error = %e, "envelope encode failed");
                    self.metrics.incr_produce_error();
                    continue;
                }
            };

            match self.submit_with_retry(&envelope.link, &payload).await {
                Ok(()) => {
                    submitted += 1;
                    self.metrics.incr_produced();
                }
                Err(e) => {
                    error!(link = %envelope.link, error = %e, "produce error");
                    self.metrics.incr_produce_error();
                }
            }
        }

        // Surface delivery confirmations before returning.
        if let Err(e) = self.publisher.flush(self.flush_timeout).await {
            warn!(error = %e, "producer flush error");
        }
        self.metrics.log();
        Ok(submitted)
    }

    /// Submit one envelope keyed by link. On local queue exhaustion,
    /// flush once and retry the publish once before giving up.
    async fn submit_with_retry(
        &self,
        link: &str,
        payload: &[u8],
    ) -> std::result::Result<(), PublishError> {
        match self
            .publisher
            .submit(&self.topic, Some(link.as_bytes()), payload)
        {
            Err(PublishError::QueueFull) => {
                warn!("producer queue full; flushing");
                if let Err(e) = self.publisher.flush(self.flush_timeout).await {
                    warn!(error = %e, "flush after queue-full failed");
                }
                self.publisher
                    .submit(&self.topic, Some(link.as_bytes()), payload)
            }
            other => other,
        }
    }

    /// One-shot mode: produce a single batch and return.
    pub async fn run_once(&self, categories: Option<&[String]>) -> Result<usize> {
        self.produce_batch(categories).await
    }

    /// Polling mode: produce a batch every `interval` (plus up to
    /// `jitter_max` of random extra sleep) until shutdown. A failed
    /// batch is logged and the loop continues with the next iteration.
    pub async fn run_polling(
        &self,
        interval: Duration,
        jitter_max: Duration,
        categories: Option<&[String]>,
        shutdown: &ShutdownFlag,
    ) {
        info!(
            interval_secs = interval.as_secs(),
            topic = %self.topic,
            "starting polling producer"
        );

        while !shutdown.is_triggered() {
            let start = Instant::now();
            match self.produce_batch(categories).await {
                Ok(count) => {
                    info!(
                        count,
                        elapsed_secs = format!("{:.1}", start.elapsed().as_secs_f64()),
                        "produced batch"
                    );
                }
                Err(e) => error!(error = %e, "batch production error"),
            }

            if shutdown.is_triggered() {
                break;
            }

            let jitter = rand::rng().random_range(0.0..=jitter_max.as_secs_f64());
            let total = interval + Duration::from_secs_f64(jitter);
            info!(
                sleep_secs = format!("{:.1}", total.as_secs_f64()),
                "sleeping before next batch"
            );
            shutdown.sleep_interruptible(total).await;
        }

        info!("producer shutdown complete");
    }
}
