//! Best-effort alert fan-out
//!
//! Fire-and-forget publish to the alerts topic with a bounded wait.
//! This helper never propagates failure: a lost alert must not turn a
//! handled per-message error into a second failure.

use std::time::Duration;
use tracing::debug;

use newswire_broker::MessagePublisher;
use newswire_types::{codec, AlertEnvelope};

pub async fn publish_alert(
    publisher: &dyn MessagePublisher,
    topic: &str,
    alert: &AlertEnvelope,
    timeout: Duration,
) {
    let payload = match codec::encode(alert) {
        Ok(payload) => payload,
        Err(e) => {
            debug!(error = %e, "alert encode failed");
            return;
        }
    };
    if let Err(e) = publisher.publish_acked(topic, None, &payload, timeout).await {
        debug!(error = %e, topic, "alert publish failed");
    }
}
