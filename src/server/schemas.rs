//! Request and response shapes for the API.

use serde::{Deserialize, Serialize};

use crate::models::{Answer, PipelineEvent, ResearchRun, ResearchStep, Source};
use crate::repository::RunDetail;

/// Payload for creating a new research run.
#[derive(Debug, Deserialize)]
pub struct CreateRunRequest {
    pub query: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Pagination for listing runs.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Payload for executing the pipeline.
#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub mode: String,
}

/// Detailed view of a run, including steps, sources, answer, and events.
#[derive(Debug, Serialize)]
pub struct RunDetailRead {
    #[serde(flatten)]
    pub run: ResearchRun,
    pub steps: Vec<ResearchStep>,
    pub sources: Vec<Source>,
    pub answer: Option<Answer>,
    pub events: Vec<PipelineEvent>,
}

impl From<RunDetail> for RunDetailRead {
    fn from(detail: RunDetail) -> Self {
        Self {
            run: detail.run,
            steps: detail.steps,
            sources: detail.sources,
            answer: detail.answer,
            events: detail.events,
        }
    }
}
