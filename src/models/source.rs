//! Source: a retrieved web reference attached to a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A web document linked to a research run.
///
/// Created by the searcher stage with only `url` and `title`; the reader
/// stage fills `raw_content` and `summary` later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub run_id: Uuid,
    pub url: String,
    pub title: String,
    /// Extracted page text, bounded to 20,000 chars.
    pub raw_content: Option<String>,
    /// Condensed text, bounded to 900 chars.
    pub summary: Option<String>,
    pub relevance_score: Option<f64>,
    /// Provider-specific metadata (search provider id, source type, ...).
    pub extra_metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Source {
    /// Create a source with no content yet.
    pub fn new(run_id: Uuid, url: String, title: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id,
            url,
            title,
            raw_content: None,
            summary: None,
            relevance_score: None,
            extra_metadata: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }

    pub fn with_relevance_score(mut self, score: f64) -> Self {
        self.relevance_score = Some(score);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.extra_metadata = Some(metadata);
        self
    }
}
