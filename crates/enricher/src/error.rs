//! Error types for the enricher pipelines

use thiserror::Error;

use newswire_broker::SourceError;
use newswire_types::CodecError;

use crate::scrape::ScrapeError;
use crate::storage::StorageError;

/// Per-message processing error. Any variant routes the message to
/// its FAILURE state: counted, logged, alerted, offset left
/// uncommitted.
#[derive(Error, Debug)]
pub enum EnricherError {
    /// Payload was not a valid envelope
    #[error("malformed payload: {0}")]
    Malformed(#[from] CodecError),

    /// Full-content fetch failed or returned nothing
    #[error("enrichment failed: {0}")]
    Scrape(#[from] ScrapeError),

    /// Storage collaborator rejected the upsert
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Broker-level failure (commit)
    #[error("broker error: {0}")]
    Broker(#[from] SourceError),

    /// Message arrived without a payload
    #[error("message has no payload")]
    EmptyMessage,
}

pub type Result<T> = std::result::Result<T, EnricherError>;
