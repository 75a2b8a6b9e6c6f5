//! Producer adapter
//!
//! Builds an idempotent `FutureProducer` and exposes the
//! [`MessagePublisher`] seam the pipelines publish through. `submit`
//! enqueues without waiting for the broker and surfaces local queue
//! exhaustion immediately; delivery confirmations are awaited on a
//! detached task and logged, and `flush` bounds the wait for
//! outstanding deliveries.

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::util::Timeout;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::{resolve_bootstrap, BrokerError, Result};

/// Producer configuration invariants. The defaults mirror the broker
/// contract the consumers depend on: idempotent delivery, full acks,
/// bounded linger/batch and compression.
#[derive(Debug, Clone)]
pub struct ProducerSettings {
    /// Bootstrap address (host:port)
    pub bootstrap_servers: String,
    /// Client ID
    pub client_id: String,
    /// Preferred compression codec
    pub compression: String,
    /// Broker-side retry count for idempotent resends
    pub retries: u32,
    /// Linger time for batching, in milliseconds
    pub linger_ms: u64,
    /// Max messages batched per request
    pub batch_num_messages: u64,
    /// Per-message timeout, in milliseconds
    pub message_timeout_ms: u64,
    /// Total delivery timeout, in milliseconds
    pub delivery_timeout_ms: u64,
}

impl Default for ProducerSettings {
    fn default() -> Self {
        Self {
            bootstrap_servers: "localhost:29092".to_string(),
            client_id: "newswire-producer".to_string(),
            compression: "lz4".to_string(),
            retries: 5,
            linger_ms: 100,
            batch_num_messages: 1000,
            message_timeout_ms: 90_000,
            delivery_timeout_ms: 120_000,
        }
    }
}

fn create_producer(settings: &ProducerSettings, compression: &str) -> Result<FutureProducer> {
    let bootstrap = resolve_bootstrap(&settings.bootstrap_servers);
    let producer = ClientConfig::new()
        .set("bootstrap.servers", &bootstrap)
        .set("client.id", &settings.client_id)
        .set("enable.idempotence", "true")
        .set("acks", "all")
        .set("retries", settings.retries.to_string())
        .set("linger.ms", settings.linger_ms.to_string())
        .set("batch.num.messages", settings.batch_num_messages.to_string())
        .set("compression.type", compression)
        .set("message.timeout.ms", settings.message_timeout_ms.to_string())
        .set(
            "delivery.timeout.ms",
            settings.delivery_timeout_ms.to_string(),
        )
        .create()?;
    Ok(producer)
}

/// Build a producer with the pipeline invariants.
///
/// If client creation fails with the preferred compression codec
/// (codecs are build-time options of the native library), retry once
/// with gzip, which is always available.
pub fn build_producer(settings: &ProducerSettings) -> Result<FutureProducer> {
    match create_producer(settings, &settings.compression) {
        Ok(producer) => Ok(producer),
        Err(e) if settings.compression != "gzip" => {
            warn!(
                preferred = %settings.compression,
                error = %e,
                "compression codec unavailable; falling back to gzip"
            );
            create_producer(settings, "gzip")
        }
        Err(e) => Err(e),
    }
}

/// Publish error types
#[derive(Error, Debug)]
pub enum PublishError {
    /// The local producer queue is full; flush and retry
    #[error("local producer queue full")]
    QueueFull,

    /// Any other broker-side publish failure
    #[error("kafka publish error: {0}")]
    Kafka(#[from] KafkaError),
}

/// Seam through which the pipelines publish envelopes. Implemented by
/// [`KafkaPublisher`] in production and by in-process fakes in tests.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Enqueue a message without waiting for the broker ack. Fails
    /// fast with [`PublishError::QueueFull`] on local buffer
    /// exhaustion.
    fn submit(&self, topic: &str, key: Option<&[u8]>, payload: &[u8])
        -> std::result::Result<(), PublishError>;

    /// Enqueue a message and wait up to `timeout` for the broker ack.
    async fn publish_acked(
        &self,
        topic: &str,
        key: Option<&[u8]>,
        payload: &[u8],
        timeout: Duration,
    ) -> std::result::Result<(), PublishError>;

    /// Wait up to `timeout` for outstanding deliveries.
    async fn flush(&self, timeout: Duration) -> std::result::Result<(), PublishError>;
}

/// rdkafka-backed publisher.
pub struct KafkaPublisher {
    producer: FutureProducer,
}

impl KafkaPublisher {
    pub fn new(settings: &ProducerSettings) -> Result<Self> {
        Ok(Self {
            producer: build_producer(settings)?,
        })
    }

    pub fn from_producer(producer: FutureProducer) -> Self {
        Self { producer }
    }
}

#[async_trait]
impl MessagePublisher for KafkaPublisher {
    fn submit(
        &self,
        topic: &str,
        key: Option<&[u8]>,
        payload: &[u8],
    ) -> std::result::Result<(), PublishError> {
        let delivery = match key {
            Some(k) => self
                .producer
                .send_result(FutureRecord::to(topic).payload(payload).key(k))
                .map_err(|(e, _)| e),
            None => self
                .producer
                .send_result(FutureRecord::<(), _>::to(topic).payload(payload))
                .map_err(|(e, _)| e),
        }
        .map_err(|e| match e {
            KafkaError::MessageProduction(RDKafkaErrorCode::QueueFull) => PublishError::QueueFull,
            other => PublishError::Kafka(other),
        })?;

        // Detach the delivery confirmation; failures are logged, not
        // propagated, because submit callers handle them via flush.
        let topic = topic.to_string();
        tokio::spawn(async move {
            match delivery.await {
                Ok(Ok((partition, offset))) => {
                    debug!(topic = %topic, partition, offset, "delivered");
                }
                Ok(Err((e, _))) => {
                    error!(topic = %topic, error = %e, "delivery failed");
                }
                Err(_) => {
                    warn!(topic = %topic, "delivery confirmation dropped");
                }
            }
        });

        Ok(())
    }

    async fn publish_acked(
        &self,
        topic: &str,
        key: Option<&[u8]>,
        payload: &[u8],
        timeout: Duration,
    ) -> std::result::Result<(), PublishError> {
        let result = match key {
            Some(k) => {
                self.producer
                    .send(
                        FutureRecord::to(topic).payload(payload).key(k),
                        Timeout::After(timeout),
                    )
                    .await
            }
            None => {
                self.producer
                    .send(
                        FutureRecord::<(), _>::to(topic).payload(payload),
                        Timeout::After(timeout),
                    )
                    .await
            }
        };
        result.map(|_| ()).map_err(|(e, _)| PublishError::Kafka(e))
    }

    async fn flush(&self, timeout: Duration) -> std::result::Result<(), PublishError> {
        self.producer
            .flush(Timeout::After(timeout))
            .map_err(PublishError::Kafka)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_default_to_the_broker_contract() {
        let settings = ProducerSettings::default();
        assert_eq!(settings.compression, "lz4");
        assert_eq!(settings.retries, 5);
        assert_eq!(settings.linger_ms, 100);
        assert_eq!(settings.delivery_timeout_ms, 120_000);
    }

    #[test]
    fn queue_full_error_is_distinguishable() {
        let err = PublishError::QueueFull;
        assert!(err.to_string().contains("queue full"));
        assert!(matches!(err, PublishError::QueueFull));
    }
}
