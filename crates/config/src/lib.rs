//! Configuration management for the newswire pipeline
//!
//! Settings are layered: built-in defaults, then an optional YAML
//! file, then environment variables prefixed with `NEWSWIRE_` (nested
//! fields separated by `__`, e.g. `NEWSWIRE_TOPICS__RAW_ITEMS`). The
//! legacy `KAFKA_BOOTSTRAP_SERVERS` variable is honored as a direct
//! override of the broker address. Every field has a default, so an
//! empty environment never fails startup.

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadError(String),

    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub broker: BrokerConfig,
    pub topics: TopicsConfig,
    pub producer: ProducerConfig,
    pub consumer: ConsumerConfig,
}

/// Broker connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Bootstrap address (host:port). May name the docker-internal
    /// listener; the broker adapter resolves unreachable aliases.
    pub bootstrap_servers: String,
}

/// Topic names for the three pipeline streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicsConfig {
    /// Summary envelopes from the producer pipeline
    pub raw_items: String,
    /// Enriched envelopes from the consumer pipelines
    pub cleaned: String,
    /// Best-effort failure alerts
    pub alerts: String,
}

/// Producer pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducerConfig {
    /// Max random extra seconds added to each polling interval
    pub sleep_jitter_max_secs: u64,
    /// Bounded wait for producer flushes
    pub flush_timeout_secs: u64,
}

/// Consumer pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Consumer group for the sync pipeline
    pub group_id: String,
    /// Consumer group for the concurrent pipeline (kept distinct so
    /// the two deployments never steal each other's partitions)
    pub async_group_id: String,
    /// Upper bound on concurrent enrichments per poll batch
    pub concurrency: usize,
    /// Bounded wait for each poll call, in milliseconds
    pub poll_timeout_ms: u64,
    /// Seconds between periodic metrics log lines
    pub metrics_interval_secs: u64,
    /// Bounded wait for best-effort alert publishes, in seconds
    pub alert_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            broker: BrokerConfig {
                bootstrap_servers: "localhost:29092".to_string(),
            },
            topics: TopicsConfig {
                raw_items: "rss.items".to_string(),
                cleaned: "articles.cleaned".to_string(),
                alerts: "alerts.feed_failures".to_string(),
            },
            producer: ProducerConfig {
                sleep_jitter_max_secs: 20,
                flush_timeout_secs: 10,
            },
            consumer: ConsumerConfig {
                group_id: "scraper-workers".to_string(),
                async_group_id: "scraper-workers-async".to_string(),
                concurrency: 5,
                poll_timeout_ms: 1000,
                metrics_interval_secs: 10,
                alert_timeout_secs: 5,
            },
        }
    }
}

impl PipelineConfig {
    /// Load configuration from defaults, an optional file and the
    /// environment.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(PipelineConfig::default()));

        if let Some(path) = config_path {
            figment = figment.merge(Yaml::file(path));
        }

        figment = figment.merge(Env::prefixed("NEWSWIRE_").split("__"));

        let mut config: PipelineConfig = figment
            .extract()
            .map_err(|e| ConfigError::LoadError(e.to_string()))?;

        // Compatibility override used by the docker-compose tooling.
        if let Ok(bootstrap) = std::env::var("KAFKA_BOOTSTRAP_SERVERS") {
            if !bootstrap.is_empty() {
                config.broker.bootstrap_servers = bootstrap;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    pub fn validate(&self) -> Result<()> {
        if self.broker.bootstrap_servers.is_empty() {
            return Err(ConfigError::ValidationError(
                "bootstrap_servers must not be empty".to_string(),
            ));
        }
        for (name, topic) in [
            ("topics.raw_items", &self.topics.raw_items),
            ("topics.cleaned", &self.topics.cleaned),
            ("topics.alerts", &self.topics.alerts),
        ] {
            if topic.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must not be empty"
                )));
            }
        }
        if self.consumer.concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "consumer.concurrency must be at least 1".to_string(),
            ));
        }
        if self.consumer.poll_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "consumer.poll_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
