//! Pipeline orchestrator: the public façade over the research pipeline.
//!
//! Central place for orchestration rules. Validates run state, composes
//! the stage runners, records pipeline events around `execute`, and maps
//! any stage error into a recoverable failed-run state. Route handlers
//! stay thin; business rules live here where they are testable.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::fetcher::WebFetcher;
use crate::llm::{create_llm_client, LlmClient};
use crate::models::{
    EventType, ExecutionMode, PipelineEvent, ResearchRun, ResearchStep, StepType,
};
use crate::pipeline::planner::derive_plan;
use crate::pipeline::state::{project_state, RunState};
use crate::repository::{AsyncSqlitePool, ResearchRepository, RunDetail};
use crate::search::{create_search_client, SearchClient};

/// Default and maximum page sizes for listing runs.
const DEFAULT_LIST_LIMIT: i64 = 20;
const MAX_LIST_LIMIT: i64 = 100;

/// Sequences pipeline stages over one run at a time.
#[derive(Clone)]
pub struct PipelineOrchestrator {
    pub(super) repo: ResearchRepository,
    pub(super) llm: Arc<dyn LlmClient>,
    pub(super) search: Arc<dyn SearchClient>,
    pub(super) fetcher: WebFetcher,
    model_provider: String,
}

impl PipelineOrchestrator {
    pub fn new(
        repo: ResearchRepository,
        llm: Arc<dyn LlmClient>,
        search: Arc<dyn SearchClient>,
        fetcher: WebFetcher,
        model_provider: String,
    ) -> Self {
        Self {
            repo,
            llm,
            search,
            fetcher,
            model_provider,
        }
    }

    /// Build an orchestrator from settings (pool, LLM, and search clients).
    pub fn from_settings(settings: &crate::config::Settings) -> Result<Self> {
        let repo = ResearchRepository::new(AsyncSqlitePool::new(&settings.database_url));
        let llm = create_llm_client(settings)
            .map_err(|e| PipelineError::InvalidState(format!("LLM client unavailable: {e}")))?;

        Ok(Self::new(
            repo,
            llm,
            create_search_client(),
            WebFetcher::new(),
            settings.model_provider_label(),
        ))
    }

    pub fn repository(&self) -> &ResearchRepository {
        &self.repo
    }

    /// Create a run in `pending` with its seeded planner step.
    pub async fn create_run(&self, query: &str, title: Option<String>) -> Result<ResearchRun> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PipelineError::InvalidState(
                "Query must not be empty.".to_string(),
            ));
        }

        let run = ResearchRun::new(query.to_string(), title, self.model_provider.clone());

        let now = Utc::now();
        let planner_step = ResearchStep::completed(
            run.id,
            0,
            StepType::Planner,
            now,
            now,
            Some(serde_json::json!({ "query": query })),
            Some(serde_json::json!({ "sub_questions": derive_plan(query) })),
        );

        self.repo.insert_run(&run, &planner_step).await?;
        info!("Created research run {} for query: {}", run.id, query);
        Ok(run)
    }

    /// Load a run's core attributes.
    pub async fn get_run(&self, run_id: Uuid) -> Result<ResearchRun> {
        self.require_run(run_id).await
    }

    /// Canonical detail loader: run + steps + sources + answer + events.
    pub async fn get_detail(&self, run_id: Uuid) -> Result<RunDetail> {
        self.repo
            .get_detail(run_id)
            .await?
            .ok_or_else(run_not_found)
    }

    /// List runs newest-first. `limit` defaults to 20 and is clamped to
    /// 1..=100; `offset` defaults to 0.
    pub async fn list_runs(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ResearchRun>> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        let offset = offset.unwrap_or(0).max(0);
        Ok(self.repo.list_runs(limit, offset).await?)
    }

    /// Per-run state snapshot: one status per stage kind plus source counts.
    pub async fn get_state(&self, run_id: Uuid) -> Result<RunState> {
        let detail = self.get_detail(run_id).await?;
        Ok(project_state(&detail))
    }

    /// Run the pipeline to completion and return the resulting detail.
    ///
    /// Records exactly one `started` event and one terminal event. Stages
    /// whose type already exists are skipped, so a retried call resumes
    /// from the first missing stage. On a stage error the run is marked
    /// failed, a `failed` event is recorded, and the error is re-raised.
    pub async fn execute(&self, run_id: Uuid, mode: ExecutionMode) -> Result<RunDetail> {
        self.require_run(run_id).await?;

        let started = Instant::now();
        self.repo
            .append_event(&PipelineEvent::new(run_id, EventType::Started, mode))
            .await?;

        let (stage, result) = match mode {
            ExecutionMode::Dummy => (
                "execute_dummy_pipeline",
                self.execute_dummy_pipeline(run_id).await,
            ),
            ExecutionMode::Real => ("execute_pipeline", self.execute_real_pipeline(run_id).await),
        };

        let duration_ms = started.elapsed().as_millis() as i64;

        match result {
            Ok(()) => {
                self.repo
                    .append_event(
                        &PipelineEvent::new(run_id, EventType::Completed, mode)
                            .with_stage(stage)
                            .with_duration_ms(duration_ms),
                    )
                    .await?;
                info!(
                    "Pipeline for run {} completed in {} ms ({} mode)",
                    run_id,
                    duration_ms,
                    mode.as_str()
                );
                self.get_detail(run_id).await
            }
            Err(err) => {
                // Best-effort failure bookkeeping; the original error wins.
                let message = err.to_string();
                if let Err(db_err) = self.repo.mark_run_failed(run_id, &message).await {
                    warn!("Failed to mark run {} failed: {}", run_id, db_err);
                }
                if let Err(db_err) = self
                    .repo
                    .append_event(
                        &PipelineEvent::new(run_id, EventType::Failed, mode)
                            .with_stage(stage)
                            .with_duration_ms(duration_ms)
                            .with_error(&message),
                    )
                    .await
                {
                    warn!("Failed to record failed event for run {}: {}", run_id, db_err);
                }
                warn!("Pipeline for run {} failed at {}: {}", run_id, stage, message);
                Err(err)
            }
        }
    }

    async fn execute_dummy_pipeline(&self, run_id: Uuid) -> Result<()> {
        if !self.repo.has_step_type(run_id, StepType::Searcher).await? {
            self.run_dummy_search(run_id).await?;
        }
        if !self.repo.has_step_type(run_id, StepType::Reader).await? {
            self.run_dummy_reader(run_id).await?;
        }
        if !self.repo.has_step_type(run_id, StepType::Synthesizer).await? {
            self.run_dummy_synthesis(run_id).await?;
        }
        Ok(())
    }

    async fn execute_real_pipeline(&self, run_id: Uuid) -> Result<()> {
        if !self.repo.has_step_type(run_id, StepType::Searcher).await? {
            self.run_web_search(run_id, 5).await?;
        }
        if !self.repo.has_step_type(run_id, StepType::Reader).await? {
            self.run_web_reader(run_id, 5).await?;
        }
        if !self.repo.has_step_type(run_id, StepType::Synthesizer).await? {
            self.run_llm_synthesis(run_id).await?;
        }
        Ok(())
    }

    pub(super) async fn require_run(&self, run_id: Uuid) -> Result<ResearchRun> {
        self.repo.get_run(run_id).await?.ok_or_else(run_not_found)
    }
}

pub(super) fn run_not_found() -> PipelineError {
    PipelineError::NotFound("Research run not found".to_string())
}
