//! Process-wide pipeline metrics
//!
//! A small injected registry of atomic counters shared by the producer
//! and consumer pipelines. Increments are lock-free and safe from any
//! number of concurrent tasks; the registry is periodically logged as
//! a single structured line.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// Counters tracked across the pipeline.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    messages_produced: AtomicU64,
    produce_errors: AtomicU64,
    messages_consumed: AtomicU64,
    processing_success: AtomicU64,
    processing_failures: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_produced: u64,
    pub produce_errors: u64,
    pub messages_consumed: u64,
    pub processing_success: u64,
    pub processing_failures: u64,
}

impl PipelineMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn incr_produced(&self) {
        self.messages_produced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_produce_error(&self) {
        self.produce_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_consumed(&self) {
        self.messages_consumed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_success(&self) {
        self.processing_success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_failure(&self) {
        self.processing_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_produced: self.messages_produced.load(Ordering::Relaxed),
            produce_errors: self.produce_errors.load(Ordering::Relaxed),
            messages_consumed: self.messages_consumed.load(Ordering::Relaxed),
            processing_success: self.processing_success.load(Ordering::Relaxed),
            processing_failures: self.processing_failures.load(Ordering::Relaxed),
        }
    }

    /// Emit the current counters as one structured log line.
    pub fn log(&self) {
        let s = self.snapshot();
        info!(
            produced = s.messages_produced,
            produce_errors = s.produce_errors,
            consumed = s.messages_consumed,
            success = s.processing_success,
            failures = s.processing_failures,
            "pipeline metrics"
        );
    }
}
