//! State projection: a per-run snapshot derived from persisted rows.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{ResearchStep, RunStatus, StepStatus, StepType};
use crate::repository::RunDetail;

/// Projected state of one stage kind.
#[derive(Debug, Clone, Serialize)]
pub struct StepState {
    pub status: StepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl StepState {
    fn pending() -> Self {
        Self {
            status: StepStatus::Pending,
            started_at: None,
            completed_at: None,
            error_message: None,
        }
    }
}

impl From<&ResearchStep> for StepState {
    fn from(step: &ResearchStep) -> Self {
        Self {
            status: step.status,
            started_at: step.started_at,
            completed_at: step.completed_at,
            error_message: step.error_message.clone(),
        }
    }
}

/// Snapshot of a run: one status per stage kind plus source counts.
#[derive(Debug, Clone, Serialize)]
pub struct RunState {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub steps: BTreeMap<&'static str, StepState>,
    pub source_count: usize,
    pub sources_with_summary: usize,
}

/// Project a run's detail into a state snapshot.
///
/// Stage kinds with no persisted step project as `pending`. If a kind
/// somehow repeats, the step with the highest index wins.
pub fn project_state(detail: &RunDetail) -> RunState {
    let mut latest_by_type: BTreeMap<StepType, &ResearchStep> = BTreeMap::new();
    for step in &detail.steps {
        // detail.steps is ordered by step_index, so later wins
        latest_by_type.insert(step.step_type, step);
    }

    let steps = StepType::ALL
        .iter()
        .map(|step_type| {
            let state = latest_by_type
                .get(step_type)
                .map(|step| StepState::from(*step))
                .unwrap_or_else(StepState::pending);
            (step_type.as_str(), state)
        })
        .collect();

    let sources_with_summary = detail
        .sources
        .iter()
        .filter(|s| s.summary.as_deref().map(str::trim).is_some_and(|s| !s.is_empty()))
        .count();

    RunState {
        run_id: detail.run.id,
        status: detail.run.status,
        steps,
        source_count: detail.sources.len(),
        sources_with_summary,
    }
}
