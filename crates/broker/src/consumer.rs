//! Consumer adapter
//!
//! Builds a `StreamConsumer` with manual offset commits and exposes
//! the [`MessageSource`] seam the consumer pipelines poll through.
//! Offsets are only ever committed explicitly, after the pipeline's
//! side effects have succeeded.

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::{Message, Offset, TopicPartitionList};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::{resolve_bootstrap, BrokerError, Result};

/// Consumer configuration invariants.
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    /// Bootstrap address (host:port)
    pub bootstrap_servers: String,
    /// Consumer group ID for this pipeline stage
    pub group_id: String,
    /// Static topic subscription
    pub topics: Vec<String>,
    /// Session timeout, in milliseconds
    pub session_timeout_ms: u64,
    /// Max interval between polls before eviction, in milliseconds
    pub max_poll_interval_ms: u64,
}

impl Default for ConsumerSettings {
    fn default() -> Self {
        Self {
            bootstrap_servers: "localhost:29092".to_string(),
            group_id: "newswire-consumer".to_string(),
            topics: vec![],
            session_timeout_ms: 45_000,
            max_poll_interval_ms: 300_000,
        }
    }
}

/// Build a consumer subscribed to the configured topics.
///
/// Auto-commit is disabled; the caller owns the poll loop and commits
/// offsets after its side effects succeed.
pub fn build_consumer(settings: &ConsumerSettings) -> Result<StreamConsumer> {
    if settings.topics.is_empty() {
        return Err(BrokerError::InvalidSettings(
            "consumer requires at least one topic".to_string(),
        ));
    }

    let bootstrap = resolve_bootstrap(&settings.bootstrap_servers);
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", &bootstrap)
        .set("group.id", &settings.group_id)
        .set("enable.auto.commit", "false")
        .set("auto.offset.reset", "earliest")
        .set(
            "session.timeout.ms",
            settings.session_timeout_ms.to_string(),
        )
        .set(
            "max.poll.interval.ms",
            settings.max_poll_interval_ms.to_string(),
        )
        .create()?;

    let topic_refs: Vec<&str> = settings.topics.iter().map(|s| s.as_str()).collect();
    consumer.subscribe(&topic_refs)?;

    info!(
        group = %settings.group_id,
        topics = ?settings.topics,
        bootstrap = %bootstrap,
        "consumer subscribed"
    );
    Ok(consumer)
}

/// Source error types
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("kafka consume error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
}

/// One polled message, detached from the underlying consumer so it can
/// be moved into a processing task.
#[derive(Debug, Clone)]
pub struct PolledMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<Vec<u8>>,
    pub payload: Option<Vec<u8>>,
}

/// Seam through which the consumer pipelines poll and commit.
/// Implemented by [`KafkaMessageSource`] in production and by
/// in-process fakes in tests.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Wait up to `timeout` for one message. `Ok(None)` means the
    /// timeout elapsed with nothing to consume; `Err` is a
    /// broker-level error on the polled position.
    async fn poll(&self, timeout: Duration)
        -> std::result::Result<Option<PolledMessage>, SourceError>;

    /// Synchronously commit the position after `message`. Blocks until
    /// the broker acknowledges the commit.
    fn commit_message(&self, message: &PolledMessage) -> std::result::Result<(), SourceError>;

    /// Synchronously commit the highest offset per partition covered
    /// by `messages`, once for the whole batch.
    fn commit_batch(&self, messages: &[PolledMessage]) -> std::result::Result<(), SourceError>;

    /// Release the subscription. Called once on shutdown.
    fn close(&self) {}
}

/// Highest offset per (topic, partition) in a batch. The committed
/// position is one past the highest consumed offset.
pub(crate) fn highest_offsets(messages: &[PolledMessage]) -> HashMap<(String, i32), i64> {
    let mut highest: HashMap<(String, i32), i64> = HashMap::new();
    for message in messages {
        let entry = highest
            .entry((message.topic.clone(), message.partition))
            .or_insert(message.offset);
        if message.offset > *entry {
            *entry = message.offset;
        }
    }
    highest
}

/// rdkafka-backed message source.
pub struct KafkaMessageSource {
    consumer: StreamConsumer,
}

impl KafkaMessageSource {
    pub fn new(settings: &ConsumerSettings) -> Result<Self> {
        Ok(Self {
            consumer: build_consumer(settings)?,
        })
    }

    pub fn from_consumer(consumer: StreamConsumer) -> Self {
        Self { consumer }
    }

    fn commit_offsets(
        &self,
        offsets: HashMap<(String, i32), i64>,
    ) -> std::result::Result<(), SourceError> {
        let mut tpl = TopicPartitionList::new();
        for ((topic, partition), offset) in offsets {
            tpl.add_partition_offset(&topic, partition, Offset::Offset(offset + 1))?;
        }
        self.consumer.commit(&tpl, CommitMode::Sync)?;
        Ok(())
    }
}

#[async_trait]
impl MessageSource for KafkaMessageSource {
    async fn poll(
        &self,
        timeout: Duration,
    ) -> std::result::Result<Option<PolledMessage>, SourceError> {
        match tokio::time::timeout(timeout, self.consumer.recv()).await {
            Err(_elapsed) => Ok(None),
            Ok(Err(e)) => Err(SourceError::Kafka(e)),
            Ok(Ok(message)) => Ok(Some(PolledMessage {
                topic: message.topic().to_string(),
                partition: message.partition(),
                offset: message.offset(),
                key: message.key().map(|k| k.to_vec()),
                payload: message.payload().map(|p| p.to_vec()),
            })),
        }
    }

    fn commit_message(&self, message: &PolledMessage) -> std::result::Result<(), SourceError> {
        self.commit_offsets(HashMap::from([(
            (message.topic.clone(), message.partition),
            message.offset,
        )]))
    }

    fn commit_batch(&self, messages: &[PolledMessage]) -> std::result::Result<(), SourceError> {
        if messages.is_empty() {
            return Ok(());
        }
        self.commit_offsets(highest_offsets(messages))
    }

    fn close(&self) {
        self.consumer.unsubscribe();
    }
}
