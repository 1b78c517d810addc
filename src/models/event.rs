//! Pipeline events: the append-only audit log for `execute` invocations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Started,
    Completed,
    Failed,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "started" => Some(Self::Started),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Pipeline execution mode.
///
/// `dummy` is deterministic and performs no external I/O; `real` uses the
/// search, fetch, and LLM collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Dummy,
    Real,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dummy => "dummy",
            Self::Real => "real",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "dummy" => Some(Self::Dummy),
            "real" => Some(Self::Real),
            _ => None,
        }
    }
}

/// One audit record. Events are inserted and never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub id: Uuid,
    pub run_id: Uuid,
    pub event_type: EventType,
    pub mode: ExecutionMode,
    /// Stage tag carried by terminal events.
    pub stage: Option<String>,
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PipelineEvent {
    pub fn new(run_id: Uuid, event_type: EventType, mode: ExecutionMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id,
            event_type,
            mode,
            stage: None,
            duration_ms: None,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_stage(mut self, stage: &str) -> Self {
        self.stage = Some(stage.to_string());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: i64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_error(mut self, message: &str) -> Self {
        self.error_message = Some(message.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trip() {
        assert_eq!(ExecutionMode::from_str("dummy"), Some(ExecutionMode::Dummy));
        assert_eq!(ExecutionMode::from_str("real"), Some(ExecutionMode::Real));
        assert_eq!(ExecutionMode::from_str("live"), None);
    }

    #[test]
    fn test_event_builders() {
        let event = PipelineEvent::new(Uuid::new_v4(), EventType::Failed, ExecutionMode::Real)
            .with_stage("execute_pipeline")
            .with_duration_ms(125)
            .with_error("boom");
        assert_eq!(event.stage.as_deref(), Some("execute_pipeline"));
        assert_eq!(event.duration_ms, Some(125));
        assert_eq!(event.error_message.as_deref(), Some("boom"));
    }
}
