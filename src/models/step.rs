//! Research step: one execution of a pipeline stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The pipeline stage a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    Planner,
    Searcher,
    Reader,
    Synthesizer,
}

impl StepType {
    /// All stage types in dependency order.
    pub const ALL: [StepType; 4] = [
        Self::Planner,
        Self::Searcher,
        Self::Reader,
        Self::Synthesizer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planner => "planner",
            Self::Searcher => "searcher",
            Self::Reader => "reader",
            Self::Synthesizer => "synthesizer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "planner" => Some(Self::Planner),
            "searcher" => Some(Self::Searcher),
            "reader" => Some(Self::Reader),
            "synthesizer" => Some(Self::Synthesizer),
            _ => None,
        }
    }
}

/// Execution status of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl StepStatus {
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

/// One execution of a stage within a run.
///
/// `step_index` is the 0-based commit ordinal within the run; `input` and
/// `output` are opaque JSON payloads owned by the stage that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchStep {
    pub id: Uuid,
    pub run_id: Uuid,
    pub step_index: i32,
    pub step_type: StepType,
    pub status: StepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub input: Option<serde_json::Value>,
    pub output: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl ResearchStep {
    /// Build a completed step with the given timestamps and payloads.
    pub fn completed(
        run_id: Uuid,
        step_index: i32,
        step_type: StepType,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        input: Option<serde_json::Value>,
        output: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id,
            step_index,
            step_type,
            status: StepStatus::Completed,
            started_at: Some(started_at),
            completed_at: Some(completed_at),
            error_message: None,
            input,
            output,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_type_round_trip() {
        for step_type in StepType::ALL {
            assert_eq!(StepType::from_str(step_type.as_str()), Some(step_type));
        }
        assert_eq!(StepType::from_str("verifier"), None);
    }

    #[test]
    fn test_completed_constructor() {
        let run_id = Uuid::new_v4();
        let now = Utc::now();
        let step = ResearchStep::completed(run_id, 2, StepType::Reader, now, now, None, None);
        assert_eq!(step.status, StepStatus::Completed);
        assert_eq!(step.step_index, 2);
        assert!(step.started_at.is_some());
        assert!(step.completed_at.is_some());
    }
}
