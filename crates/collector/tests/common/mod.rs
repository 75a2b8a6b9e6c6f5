//! Shared fakes for collector integration tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use newswire_broker::{MessagePublisher, PublishError};
use newswire_collector::{FeedFetcher, FetchError};
use newswire_types::ArticleRecord;

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

/// In-process publisher capturing submits; can simulate local queue
/// exhaustion for a configurable number of submit calls.
#[derive(Default)]
pub struct RecordingPublisher {
    pub messages: Mutex<Vec<SubmittedMessage>>,
    pub flushes: AtomicUsize,
    queue_full_remaining: AtomicUsize,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_with_queue_full(times: usize) -> Self {
        Self {
            queue_full_remaining: AtomicUsize::new(times),
            ..Self::default()
        }
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
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
        if self
            .queue_full_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(PublishError::QueueFull);
        }
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

/// Fetcher returning a fixed category map.
pub struct StaticFetcher {
    by_category: HashMap<String, Vec<ArticleRecord>>,
}

impl StaticFetcher {
    pub fn new(by_category: HashMap<String, Vec<ArticleRecord>>) -> Self {
        Self { by_category }
    }
}

#[async_trait]
impl FeedFetcher for StaticFetcher {
    async fn fetch_summaries(
        &self,
        _categories: Option<&[String]>,
    ) -> Result<HashMap<String, Vec<ArticleRecord>>, FetchError> {
        Ok(self.by_category.clone())
    }
}

/// Fetcher that always fails.
pub struct FailingFetcher;

#[async_trait]
impl FeedFetcher for FailingFetcher {
    async fn fetch_summaries(
        &self,
        _categories: Option<&[String]>,
    ) -> Result<HashMap<String, Vec<ArticleRecord>>, FetchError> {
        Err(FetchError("all feeds unreachable".to_string()))
    }
}

pub fn article(title: &str, link: &str, content: &str, source: &str) -> ArticleRecord {
    ArticleRecord {
        title: title.to_string(),
        link: link.to_string(),
        publish_date: String::new(),
        source: source.to_string(),
        category: "tech".to_string(),
        content: content.to_string(),
        full_content: None,
    }
}
