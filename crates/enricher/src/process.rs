//! Shared per-message state machine
//!
//! POLLED → DECODED → ENRICHED → PERSISTED → REPUBLISHED, with the
//! offset commit left to the calling pipeline (per message for the
//! sync consumer, per batch for the concurrent one). Any step's error
//! routes the message to FAILURE: counted, logged, alerted
//! best-effort, offset uncommitted.

use std::sync::Arc;
use tracing::{error, info, warn};

use newswire_broker::{MessagePublisher, MessageSource, PolledMessage};
use newswire_types::{
    codec, AlertEnvelope, ArticleSummaryEnvelope, EnrichedArticleEnvelope, PipelineMetrics,
};

use crate::alert::publish_alert;
use crate::error::{EnricherError, Result};
use crate::scrape::Enricher;
use crate::storage::ArticleStore;
use crate::ConsumerOptions;

/// Dependencies shared by both consumer pipelines. Cloning is cheap;
/// the batch pipeline hands one clone to each in-flight task.
#[derive(Clone)]
pub struct ConsumerContext {
    pub source: Arc<dyn MessageSource>,
    pub publisher: Arc<dyn MessagePublisher>,
    pub store: Arc<dyn ArticleStore>,
    pub enricher: Enricher,
    pub metrics: Arc<PipelineMetrics>,
    pub options: ConsumerOptions,
}

impl ConsumerContext {
    /// Run one polled message through decode, enrich, persist and
    /// republish. The caller commits the offset only after this
    /// returns `Ok`.
    pub async fn process_message(&self, message: &PolledMessage) -> Result<()> {
        let payload = message
            .payload
            .as_deref()
            .ok_or(EnricherError::EmptyMessage)?;
        let envelope: ArticleSummaryEnvelope = codec::decode(payload)?;

        let mut record = envelope.to_article_record();
        let full_content = self.enricher.enrich(&record).await?;
        record.full_content = Some(full_content.clone());

        // Idempotent on link; an existing full_content is never
        // overwritten, so redelivery after a missed commit is safe.
        self.store.upsert_article(&record).await?;

        let enriched = EnrichedArticleEnvelope::new(envelope, full_content);
        self.republish(&enriched);

        Ok(())
    }

    /// Publish the enriched envelope to the cleaned topic. The record
    /// is already durably stored at this point, so a publish error is
    /// counted and logged but does not fail the message.
    fn republish(&self, enriched: &EnrichedArticleEnvelope) {
        let payload = match codec::encode(enriched) {
            Ok(payload) => payload,
            Err(e) => {
                self.metrics.incr_produce_error();
                error!(link = %enriched.summary.link, error = %e, "enriched envelope encode failed");
                return;
            }
        };
        match self.publisher.submit(
            &self.options.cleaned_topic,
            Some(enriched.summary.link.as_bytes()),
            &payload,
        ) {
            Ok(()) => self.metrics.incr_produced(),
            Err(e) => {
                self.metrics.incr_produce_error();
                error!(link = %enriched.summary.link, error = %e, "failed producing enriched record");
            }
        }
    }

    /// FAILURE bookkeeping shared by both pipelines: count, log, emit
    /// a best-effort alert.
    pub(crate) async fn record_failure(&self, error: &EnricherError) {
        self.metrics.incr_failure();
        error!(error = %error, "processing failure");
        let alert = AlertEnvelope::enrichment_failure(error.to_string());
        publish_alert(
            self.publisher.as_ref(),
            &self.options.alerts_topic,
            &alert,
            self.options.alert_timeout,
        )
        .await;
    }

    /// Flush and release held resources on loop exit.
    pub(crate) async fn shutdown_cleanup(&self) {
        info!("flushing producer and closing consumer");
        if let Err(e) = self.publisher.flush(self.options.flush_timeout).await {
            warn!(error = %e, "producer flush error on shutdown");
        }
        self.source.close();
        self.store.close().await;
        self.metrics.log();
    }
}
