//! Broker client adapters
//!
//! Thin wrappers around rdkafka that produce ready-to-use producer and
//! consumer handles with the pipeline's non-negotiable configuration:
//! idempotent producer with `acks=all` and bounded linger/batch,
//! manual offset commits, earliest offset reset for new groups, and an
//! explicit static topic subscription. Connection and configuration
//! failures propagate to the caller and are fatal at startup;
//! produce/consume-time errors are handled per message by the
//! pipelines.

pub mod consumer;
pub mod producer;

use thiserror::Error;
use tracing::info;

pub use consumer::{
    build_consumer, ConsumerSettings, KafkaMessageSource, MessageSource, PolledMessage,
    SourceError,
};
pub use producer::{
    build_producer, KafkaPublisher, MessagePublisher, ProducerSettings, PublishError,
};

/// Broker adapter error types
#[derive(Error, Debug)]
pub enum BrokerError {
    /// Client creation or configuration failed
    #[error("kafka client error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    /// Settings failed local validation
    #[error("invalid broker settings: {0}")]
    InvalidSettings(String),
}

pub type Result<T> = std::result::Result<T, BrokerError>;

/// Resolve a bootstrap address that may not be reachable from the
/// caller's network context.
///
/// Compose files advertise the internal listener as `kafka:9092`; from
/// the host network that hostname usually does not resolve. Substitute
/// the externally mapped listener and log the adjustment rather than
/// hang on DNS. Set the bootstrap address explicitly to override.
pub fn resolve_bootstrap(bootstrap: &str) -> String {
    let Some((host, port)) = bootstrap.split_once(':') else {
        return bootstrap.to_string();
    };
    if host == "kafka" && port == "9092" {
        let alt = "localhost:29092";
        info!(
            configured = bootstrap,
            fallback = alt,
            "bootstrap address not resolvable from host context; using fallback"
        );
        return alt.to_string();
    }
    bootstrap.to_string()
}
