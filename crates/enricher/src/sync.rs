//! Synchronous consumer pipeline
//!
//! One message at a time: poll, enrich, persist, republish, then
//! commit the offset synchronously. The commit is the point of no
//! return; a message that fails anywhere before it stays uncommitted
//! and is redelivered on restart or rebalance (at-least-once).

use std::time::Instant;
use tracing::{error, info};

use newswire_types::ShutdownFlag;

use crate::error::Result;
use crate::process::ConsumerContext;

pub struct SyncConsumer {
    ctx: ConsumerContext,
    shutdown: ShutdownFlag,
}

impl SyncConsumer {
    pub fn new(ctx: ConsumerContext, shutdown: ShutdownFlag) -> Self {
        Self { ctx, shutdown }
    }

    /// Consume until shutdown, or until `max_messages` messages have
    /// reached a terminal state (success and failure both count).
    /// Returns the number of terminally processed messages.
    pub async fn run(&self, max_messages: Option<usize>) -> usize {
        let mut processed = 0usize;
        let mut last_metrics = Instant::now();
        info!(
            poll_timeout_ms = self.ctx.options.poll_timeout.as_millis() as u64,
            "sync consumer started"
        );

        while !self.shutdown.is_triggered() {
            if max_messages.is_some_and(|max| processed >= max) {
                break;
            }

            let message = match self.ctx.source.poll(self.ctx.options.poll_timeout).await {
                Ok(Some(message)) => message,
                Ok(None) => {
                    if last_metrics.elapsed() >= self.ctx.options.metrics_interval {
                        self.ctx.metrics.log();
                        last_metrics = Instant::now();
                    }
                    continue;
                }
                Err(e) => {
                    // Broker-level error on the polled position: skip
                    // without committing.
                    error!(error = %e, "kafka message error");
                    continue;
                }
            };

            self.ctx.metrics.incr_consumed();
            match self.handle(&message).await {
                Ok(()) => self.ctx.metrics.incr_success(),
                Err(e) => self.ctx.record_failure(&e).await,
            }
            processed += 1;
        }

        self.ctx.shutdown_cleanup().await;
        info!(processed, "sync consumer stopped");
        processed
    }

    async fn handle(&self, message: &newswire_broker::PolledMessage) -> Result<()> {
        self.ctx.process_message(message).await?;
        // Blocking commit: only after this does the next poll fetch a
        // new offset range.
        self.ctx.source.commit_message(message)?;
        Ok(())
    }
}
