//! Concurrent consumer pipeline
//!
//! Polls a bounded window of messages per iteration and processes
//! them as independent tasks gated by a semaphore, so no more than
//! the configured number of enrichments (each doing network I/O) run
//! at once regardless of batch size. Offsets are committed once per
//! batch, after every unit has finished; one unit's failure never
//! cancels its siblings.

use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{error, info};

use newswire_broker::PolledMessage;
use newswire_types::ShutdownFlag;

use crate::process::ConsumerContext;

/// Wait this long for batch stragglers after the first message.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(10);

pub struct BatchConsumer {
    ctx: ConsumerContext,
    shutdown: ShutdownFlag,
}

impl BatchConsumer {
    pub fn new(ctx: ConsumerContext, shutdown: ShutdownFlag) -> Self {
        Self { ctx, shutdown }
    }

    /// Consume until shutdown, or until `max_messages` messages have
    /// reached a terminal state. Returns the number of terminally
    /// processed messages.
    ///
    /// Offset commits are all-or-nothing per batch: a unit that failed
    /// still has its offset advanced once the batch commits. Failed
    /// units are surfaced through the failure counter and the alerts
    /// topic rather than through redelivery.
    pub async fn run(&self, max_messages: Option<usize>) -> usize {
        let concurrency = self.ctx.options.concurrency;
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut processed = 0usize;
        let mut last_metrics = Instant::now();
        info!(concurrency, "batch consumer started");

        while !self.shutdown.is_triggered() {
            if max_messages.is_some_and(|max| processed >= max) {
                break;
            }
            let budget = match max_messages {
                Some(max) => concurrency.min(max - processed),
                None => concurrency,
            };

            let batch = self.poll_batch(budget).await;
            if batch.is_empty() {
                if last_metrics.elapsed() >= self.ctx.options.metrics_interval {
                    self.ctx.metrics.log();
                    last_metrics = Instant::now();
                }
                continue;
            }

            let mut tasks = Vec::with_capacity(batch.len());
            for message in &batch {
                let ctx = self.ctx.clone();
                let semaphore = Arc::clone(&semaphore);
                let message = message.clone();
                tasks.push(tokio::spawn(async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return;
                    };
                    ctx.metrics.incr_consumed();
                    match ctx.process_message(&message).await {
                        Ok(()) => ctx.metrics.incr_success(),
                        Err(e) => ctx.record_failure(&e).await,
                    }
                }));
            }

            // Await every unit, successes and failures alike, before
            // the batch commit.
            for result in join_all(tasks).await {
                if let Err(e) = result {
                    error!(error = %e, "processing task panicked");
                }
            }

            if let Err(e) = self.ctx.source.commit_batch(&batch) {
                error!(error = %e, "batch offset commit failed");
                break;
            }
            processed += batch.len();

            if last_metrics.elapsed() >= self.ctx.options.metrics_interval {
                self.ctx.metrics.log();
                last_metrics = Instant::now();
            }
        }

        self.ctx.shutdown_cleanup().await;
        info!(processed, "batch consumer stopped");
        processed
    }

    /// Gather up to `budget` messages: one bounded poll for the first,
    /// then a short drain for whatever is already buffered.
    async fn poll_batch(&self, budget: usize) -> Vec<PolledMessage> {
        let mut batch = Vec::new();
        while batch.len() < budget {
            let timeout = if batch.is_empty() {
                self.ctx.options.poll_timeout
            } else {
                DRAIN_TIMEOUT
            };
            match self.ctx.source.poll(timeout).await {
                Ok(Some(message)) => batch.push(message),
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "kafka message error");
                    break;
                }
            }
        }
        batch
    }
}
