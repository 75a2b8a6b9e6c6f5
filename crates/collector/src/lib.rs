//! Newswire collector
//!
//! The producer side of the pipeline: pulls summary-level articles
//! from the feed fetch collaborator, wraps them in summary envelopes
//! and publishes them to the raw-items topic keyed by link. Supports a
//! one-shot batch mode and a continuous polling mode with jittered
//! sleeps.

pub mod fetch;
pub mod pipeline;

pub use fetch::{FeedFetcher, FetchError};
pub use pipeline::{CollectorError, FeedProducer};
