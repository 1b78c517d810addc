//! Research run: the root aggregate of the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a research run.
///
/// `pending` on creation; `running` once a non-planner stage commits;
/// `completed` only after the synthesizer commits; `failed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A single user-initiated research task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRun {
    /// Unique identifier.
    pub id: Uuid,
    /// The user's research question.
    pub query: String,
    /// Optional display title.
    pub title: Option<String>,
    /// Current lifecycle status.
    pub status: RunStatus,
    /// Provider label, e.g. `"ollama:llama3"`.
    pub model_provider: String,
    /// Failure message from the last failed execution, if any.
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResearchRun {
    /// Create a new pending run.
    pub fn new(query: String, title: Option<String>, model_provider: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            query,
            title,
            status: RunStatus::Pending,
            model_provider,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            RunStatus::Pending,
            RunStatus::Running,
            RunStatus::Completed,
            RunStatus::Failed,
        ] {
            assert_eq!(RunStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(RunStatus::from_str("bogus"), None);
    }

    #[test]
    fn test_new_run_is_pending() {
        let run = ResearchRun::new("why is the sky blue".into(), None, "dummy:dev".into());
        assert_eq!(run.status, RunStatus::Pending);
        assert!(run.error_message.is_none());
    }
}
