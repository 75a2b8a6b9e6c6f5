//! Shared fakes for enricher integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use newswire_broker::{MessagePublisher, MessageSource, PolledMessage, PublishError, SourceError};
use newswire_enricher::{
    ArticleStore, ConsumerContext, ConsumerOptions, Enricher, MemoryArticleStore, ScrapeError,
    Scraper,
};
use newswire_types::{codec, ArticleRecord, ArticleSummaryEnvelope, PipelineMetrics};

pub const RAW_TOPIC: &str = "rss.items";
pub const CLEANED_TOPIC: &str = "articles.cleaned";
pub const ALERTS_TOPIC: &str = "alerts.feed_failures";

/// Route pipeline logs to the test writer. Safe to call from every
/// test; only the first call installs the subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One message captured by [`RecordingPublisher`].
#[derive(Debug, Clone)]
pub struct SubmittedMessage {
    pub topic: String,
    pub key: Option<Vec<u8>>,
    pub payload: Vec<u8>,
}

/// In-process publisher capturing everything submitted or published.
#[derive(Default)]
pub struct RecordingPublisher {
    pub messages: Mutex<Vec<SubmittedMessage>>,
    pub flushes: AtomicUsize,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_topic(&self, topic: &str) -> Vec<SubmittedMessage> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MessagePublisher for RecordingPublisher {
    fn submit(
        &self,
        topic: &str,
        key: Option<&[u8]>,
        payload: &[u8],
    ) -> Result<(), PublishError> {
        self.messages.lock().unwrap().push(SubmittedMessage {
            topic: topic.to_string(),
            key: key.map(|k| k.to_vec()),
            payload: payload.to_vec(),
        });
        Ok(())
    }

    async fn publish_acked(
        &self,
        topic: &str,
        key: Option<&[u8]>,
        payload: &[u8],
        _timeout: Duration,
    ) -> Result<(), PublishError> {
        self.submit(topic, key, payload)
    }

    async fn flush(&self, _timeout: Duration) -> Result<(), PublishError> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-process message source replaying a fixed script and recording
/// every commit.
#[derive(Default)]
pub struct ScriptedSource {
    queue: Mutex<VecDeque<PolledMessage>>,
    pub committed: Mutex<Vec<PolledMessage>>,
    pub batch_commits: Mutex<Vec<Vec<PolledMessage>>>,
    pub closed: AtomicBool,
}

impl ScriptedSource {
    pub fn new(messages: Vec<PolledMessage>) -> Self {
        Self {
            queue: Mutex::new(messages.into()),
            ..Self::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn commit_count(&self) -> usize {
        self.committed.lock().unwrap().len()
    }

    pub fn batch_commit_count(&self) -> usize {
        self.batch_commits.lock().unwrap().len()
    }
}

#[async_trait]
impl MessageSource for ScriptedSource {
    async fn poll(&self, timeout: Duration) -> Result<Option<PolledMessage>, SourceError> {
        let next = self.queue.lock().unwrap().pop_front();
        if next.is_none() {
            tokio::time::sleep(timeout).await;
        }
        Ok(next)
    }

    fn commit_message(&self, message: &PolledMessage) -> Result<(), SourceError> {
        self.committed.lock().unwrap().push(message.clone());
        Ok(())
    }

    fn commit_batch(&self, messages: &[PolledMessage]) -> Result<(), SourceError> {
        self.batch_commits.lock().unwrap().push(messages.to_vec());
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Scraper returning fixed content.
pub struct FixedScraper(pub &'static str);

#[async_trait]
impl Scraper for FixedScraper {
    async fn scrape_full_text(&self, _article: &ArticleRecord) -> Result<String, ScrapeError> {
        Ok(self.0.to_string())
    }
}

/// Scraper that always fails.
pub struct FailingScraper;

#[async_trait]
impl Scraper for FailingScraper {
    async fn scrape_full_text(&self, _article: &ArticleRecord) -> Result<String, ScrapeError> {
        Err(ScrapeError::Fetch("connection refused".to_string()))
    }
}

/// Scraper that sleeps per call and tracks the highest number of
/// concurrent calls it observed.
#[derive(Default)]
pub struct SlowScraper {
    pub delay: Duration,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl SlowScraper {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Scraper for SlowScraper {
    async fn scrape_full_text(&self, _article: &ArticleRecord) -> Result<String, ScrapeError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok("FULL".to_string())
    }
}

pub fn article(link: &str) -> ArticleRecord {
    ArticleRecord {
        title: "Title".to_string(),
        link: link.to_string(),
        publish_date: "2025-01-01".to_string(),
        source: "Example".to_string(),
        category: "tech".to_string(),
        content: "summary text".to_string(),
        full_content: None,
    }
}

/// A polled raw-items message carrying a summary envelope for `link`.
pub fn summary_message(link: &str, offset: i64) -> PolledMessage {
    let envelope = ArticleSummaryEnvelope::from_record(&article(link));
    PolledMessage {
        topic: RAW_TOPIC.to_string(),
        partition: 0,
        offset,
        key: Some(link.as_bytes().to_vec()),
        payload: Some(codec::encode(&envelope).unwrap()),
    }
}

pub fn raw_message(payload: Option<&[u8]>, offset: i64) -> PolledMessage {
    PolledMessage {
        topic: RAW_TOPIC.to_string(),
        partition: 0,
        offset,
        key: None,
        payload: payload.map(|p| p.to_vec()),
    }
}

pub fn test_options(concurrency: usize) -> ConsumerOptions {
    ConsumerOptions {
        cleaned_topic: CLEANED_TOPIC.to_string(),
        alerts_topic: ALERTS_TOPIC.to_string(),
        poll_timeout: Duration::from_millis(10),
        concurrency,
        metrics_interval: Duration::from_secs(60),
        alert_timeout: Duration::from_millis(100),
        flush_timeout: Duration::from_millis(100),
    }
}

pub struct Harness {
    pub source: Arc<ScriptedSource>,
    pub publisher: Arc<RecordingPublisher>,
    pub store: Arc<MemoryArticleStore>,
    pub metrics: Arc<PipelineMetrics>,
    pub ctx: ConsumerContext,
}

pub fn harness(messages: Vec<PolledMessage>, scraper: Arc<dyn Scraper>, concurrency: usize) -> Harness {
    init_tracing();
    let source = Arc::new(ScriptedSource::new(messages));
    let publisher = Arc::new(RecordingPublisher::new());
    let store = Arc::new(MemoryArticleStore::new());
    let metrics = Arc::new(PipelineMetrics::default());
    let ctx = ConsumerContext {
        source: source.clone() as Arc<dyn MessageSource>,
        publisher: publisher.clone() as Arc<dyn MessagePublisher>,
        store: store.clone() as Arc<dyn ArticleStore>,
        enricher: Enricher::native(scraper),
        metrics: metrics.clone(),
        options: test_options(concurrency),
    };
    Harness {
        source,
        publisher,
        store,
        metrics,
        ctx,
    }
}
