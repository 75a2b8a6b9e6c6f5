//! Shared types for the newswire streaming pipeline
//!
//! This crate provides the envelope types exchanged over the broker
//! topics, the compact JSON wire codec, the process-wide metrics
//! registry and the cooperative shutdown flag used by every pipeline
//! loop.

pub mod codec;
pub mod envelope;
pub mod metrics;
pub mod shutdown;

pub use codec::{decode, encode, CodecError};
pub use envelope::{
    now_iso, AlertEnvelope, ArticleRecord, ArticleSummaryEnvelope, EnrichedArticleEnvelope,
};
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use shutdown::ShutdownFlag;
