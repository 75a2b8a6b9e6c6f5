//! Envelope types exchanged over the pipeline topics
//!
//! Envelopes are immutable value objects: each pipeline stage builds
//! the envelope it publishes and never mutates one it received. The
//! enriched envelope is a strict superset of the summary envelope so
//! downstream consumers of the cleaned topic can read either shape.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current UTC time as an RFC 3339 string, the timestamp format used
/// in every envelope field.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn default_source() -> String {
    "Unknown".to_string()
}

fn default_category() -> String {
    "uncategorized".to_string()
}

/// Article record as exchanged with the external collaborators (feed
/// fetcher, scraper, storage). `content` carries the summary text;
/// `full_content` is set only after enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    #[serde(default)]
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub publish_date: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub full_content: Option<String>,
}

/// Summary-level article envelope published to the raw-items topic.
///
/// `link` is the dedup/partition key and must be non-empty; `id` is
/// freshly generated at publish time, so a redelivered article gets a
/// new id but keeps its link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummaryEnvelope {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub publish_date: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub summary: String,
    pub fetched_at: String,
}

impl ArticleSummaryEnvelope {
    /// Build a publishable envelope from a fetched record, generating
    /// a fresh id and stamping the fetch time.
    pub fn from_record(record: &ArticleRecord) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: record.title.clone(),
            link: record.link.clone(),
            publish_date: record.publish_date.clone(),
            source: record.source.clone(),
            category: record.category.clone(),
            summary: record.content.clone(),
            fetched_at: now_iso(),
        }
    }

    /// Map back to the record shape the scrape/storage collaborators
    /// expect: the envelope `summary` becomes the record `content`.
    pub fn to_article_record(&self) -> ArticleRecord {
        ArticleRecord {
            title: self.title.clone(),
            link: self.link.clone(),
            publish_date: self.publish_date.clone(),
            source: self.source.clone(),
            category: self.category.clone(),
            content: self.summary.clone(),
            full_content: None,
        }
    }
}

/// Enriched article envelope published to the cleaned topic: the
/// original summary envelope (flattened on the wire) plus the scraped
/// body and the enrichment timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedArticleEnvelope {
    #[serde(flatten)]
    pub summary: ArticleSummaryEnvelope,
    pub full_content: String,
    pub enriched_at: String,
}

impl EnrichedArticleEnvelope {
    pub fn new(summary: ArticleSummaryEnvelope, full_content: String) -> Self {
        Self {
            summary,
            full_content,
            enriched_at: now_iso(),
        }
    }
}

/// Best-effort failure alert published to the alerts topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub error: String,
    pub ts: String,
}

impl AlertEnvelope {
    pub fn enrichment_failure(error: impl Into<String>) -> Self {
        Self {
            kind: "enrichment_failure".to_string(),
            error: error.into(),
            ts: now_iso(),
        }
    }
}
