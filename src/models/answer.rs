//! Answer: the synthesized result of a run, at most one per run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Synthesized prose plus a citation map (citation index -> source id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub id: Uuid,
    pub run_id: Uuid,
    pub content: String,
    pub citations: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Answer {
    pub fn new(run_id: Uuid, content: String, citations: Option<serde_json::Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id,
            content,
            citations,
            created_at: Utc::now(),
        }
    }
}
