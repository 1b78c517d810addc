//! Diesel-based repository for research runs and their children.
//!
//! This is the orchestrator's single shared mutable resource. Every stage
//! persists its results through [`StepCommit`], a unit applied inside one
//! transaction: the new step, any produced or updated sources, an optional
//! answer, and the run-status transition either all land or none do.

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use super::pool::{AsyncSqliteConnection, AsyncSqlitePool, DieselError};
use super::records::{AnswerRecord, EventRecord, RunRecord, SourceRecord, StepRecord};
use crate::models::{
    Answer, PipelineEvent, ResearchRun, ResearchStep, RunStatus, Source, StepType,
};
use crate::schema::{answers, pipeline_events, research_runs, research_steps, sources};

/// A run with all owned children eagerly loaded.
#[derive(Debug, Clone)]
pub struct RunDetail {
    pub run: ResearchRun,
    /// Ordered by `step_index`.
    pub steps: Vec<ResearchStep>,
    /// Insertion order.
    pub sources: Vec<Source>,
    pub answer: Option<Answer>,
    pub events: Vec<PipelineEvent>,
}

/// Run-status change applied together with a step commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunTransition {
    /// Leave the run status alone.
    None,
    /// `pending -> running` (no-op for any other current status).
    RunningIfPending,
    /// Mark the run completed.
    Completed,
}

/// Content written back to an existing source by the reader stage.
#[derive(Debug, Clone)]
pub struct SourceContentUpdate {
    pub id: Uuid,
    pub raw_content: String,
    pub summary: String,
}

/// Everything one stage persists, committed atomically.
#[derive(Debug, Clone)]
pub struct StepCommit {
    pub step: ResearchStep,
    pub new_sources: Vec<Source>,
    pub source_updates: Vec<SourceContentUpdate>,
    pub answer: Option<Answer>,
    pub transition: RunTransition,
}

impl StepCommit {
    pub fn new(step: ResearchStep) -> Self {
        Self {
            step,
            new_sources: Vec::new(),
            source_updates: Vec::new(),
            answer: None,
            transition: RunTransition::None,
        }
    }

    pub fn with_new_sources(mut self, sources: Vec<Source>) -> Self {
        self.new_sources = sources;
        self
    }

    pub fn with_source_updates(mut self, updates: Vec<SourceContentUpdate>) -> Self {
        self.source_updates = updates;
        self
    }

    pub fn with_answer(mut self, answer: Answer) -> Self {
        self.answer = Some(answer);
        self
    }

    pub fn with_transition(mut self, transition: RunTransition) -> Self {
        self.transition = transition;
        self
    }
}

fn to_json_text(value: &serde_json::Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

async fn insert_step(
    conn: &mut AsyncSqliteConnection,
    step: &ResearchStep,
) -> Result<(), DieselError> {
    diesel::insert_into(research_steps::table)
        .values((
            research_steps::id.eq(step.id.to_string()),
            research_steps::run_id.eq(step.run_id.to_string()),
            research_steps::step_index.eq(step.step_index),
            research_steps::step_type.eq(step.step_type.as_str()),
            research_steps::status.eq(step.status.as_str()),
            research_steps::started_at.eq(step.started_at.map(|dt| dt.to_rfc3339())),
            research_steps::completed_at.eq(step.completed_at.map(|dt| dt.to_rfc3339())),
            research_steps::error_message.eq(step.error_message.clone()),
            research_steps::input.eq(step.input.as_ref().map(to_json_text)),
            research_steps::output.eq(step.output.as_ref().map(to_json_text)),
            research_steps::created_at.eq(step.created_at.to_rfc3339()),
        ))
        .execute(conn)
        .await?;
    Ok(())
}

async fn insert_source(
    conn: &mut AsyncSqliteConnection,
    source: &Source,
) -> Result<(), DieselError> {
    diesel::insert_into(sources::table)
        .values((
            sources::id.eq(source.id.to_string()),
            sources::run_id.eq(source.run_id.to_string()),
            sources::url.eq(source.url.clone()),
            sources::title.eq(source.title.clone()),
            sources::raw_content.eq(source.raw_content.clone()),
            sources::summary.eq(source.summary.clone()),
            sources::relevance_score.eq(source.relevance_score),
            sources::extra_metadata.eq(source.extra_metadata.as_ref().map(to_json_text)),
            sources::created_at.eq(source.created_at.to_rfc3339()),
        ))
        .execute(conn)
        .await?;
    Ok(())
}

async fn apply_transition(
    conn: &mut AsyncSqliteConnection,
    run_id: Uuid,
    transition: RunTransition,
) -> Result<(), DieselError> {
    let now = chrono::Utc::now().to_rfc3339();
    match transition {
        RunTransition::None => {}
        RunTransition::RunningIfPending => {
            diesel::update(
                research_runs::table
                    .filter(research_runs::id.eq(run_id.to_string()))
                    .filter(research_runs::status.eq(RunStatus::Pending.as_str())),
            )
            .set((
                research_runs::status.eq(RunStatus::Running.as_str()),
                research_runs::updated_at.eq(&now),
            ))
            .execute(conn)
            .await?;
        }
        RunTransition::Completed => {
            diesel::update(research_runs::table.filter(research_runs::id.eq(run_id.to_string())))
                .set((
                    research_runs::status.eq(RunStatus::Completed.as_str()),
                    research_runs::updated_at.eq(&now),
                ))
                .execute(conn)
                .await?;
        }
    }
    Ok(())
}

/// Repository for research runs with compile-time query checking.
#[derive(Clone)]
pub struct ResearchRepository {
    pool: AsyncSqlitePool,
}

impl ResearchRepository {
    /// Create a new repository with an existing pool.
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new run together with its seeded planner step.
    pub async fn insert_run(
        &self,
        run: &ResearchRun,
        planner_step: &ResearchStep,
    ) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<(), DieselError, _>(|conn| {
            async move {
                diesel::insert_into(research_runs::table)
                    .values((
                        research_runs::id.eq(run.id.to_string()),
                        research_runs::query.eq(run.query.clone()),
                        research_runs::title.eq(run.title.clone()),
                        research_runs::status.eq(run.status.as_str()),
                        research_runs::model_provider.eq(run.model_provider.clone()),
                        research_runs::error_message.eq(run.error_message.clone()),
                        research_runs::created_at.eq(run.created_at.to_rfc3339()),
                        research_runs::updated_at.eq(run.updated_at.to_rfc3339()),
                    ))
                    .execute(conn)
                    .await?;

                insert_step(conn, planner_step).await
            }
            .scope_boxed()
        })
        .await
    }

    /// Get a run by id.
    pub async fn get_run(&self, id: Uuid) -> Result<Option<ResearchRun>, DieselError> {
        let mut conn = self.pool.get().await?;

        research_runs::table
            .find(id.to_string())
            .first::<RunRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(ResearchRun::from))
    }

    /// List runs, newest first.
    pub async fn list_runs(&self, limit: i64, offset: i64) -> Result<Vec<ResearchRun>, DieselError> {
        let mut conn = self.pool.get().await?;

        research_runs::table
            .order(research_runs::created_at.desc())
            .limit(limit)
            .offset(offset)
            .load::<RunRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(ResearchRun::from).collect())
    }

    /// Canonical detail loader: run + steps + sources + answer + events.
    pub async fn get_detail(&self, id: Uuid) -> Result<Option<RunDetail>, DieselError> {
        let mut conn = self.pool.get().await?;
        let run_id = id.to_string();

        let run = match research_runs::table
            .find(&run_id)
            .first::<RunRecord>(&mut conn)
            .await
            .optional()?
        {
            Some(record) => ResearchRun::from(record),
            None => return Ok(None),
        };

        let steps = research_steps::table
            .filter(research_steps::run_id.eq(&run_id))
            .order(research_steps::step_index.asc())
            .load::<StepRecord>(&mut conn)
            .await?
            .into_iter()
            .map(ResearchStep::from)
            .collect();

        let sources = sources::table
            .filter(sources::run_id.eq(&run_id))
            .order((sources::created_at.asc(), sources::id.asc()))
            .load::<SourceRecord>(&mut conn)
            .await?
            .into_iter()
            .map(Source::from)
            .collect();

        let answer = answers::table
            .filter(answers::run_id.eq(&run_id))
            .first::<AnswerRecord>(&mut conn)
            .await
            .optional()?
            .map(Answer::from);

        let events = pipeline_events::table
            .filter(pipeline_events::run_id.eq(&run_id))
            .order(pipeline_events::created_at.asc())
            .load::<EventRecord>(&mut conn)
            .await?
            .into_iter()
            .map(PipelineEvent::from)
            .collect();

        Ok(Some(RunDetail {
            run,
            steps,
            sources,
            answer,
            events,
        }))
    }

    /// Check whether the run already has a step of the given type.
    pub async fn has_step_type(
        &self,
        run_id: Uuid,
        step_type: StepType,
    ) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        let found = research_steps::table
            .filter(research_steps::run_id.eq(run_id.to_string()))
            .filter(research_steps::step_type.eq(step_type.as_str()))
            .select(research_steps::id)
            .first::<String>(&mut conn)
            .await
            .optional()?;

        Ok(found.is_some())
    }

    /// Next step index: `max(existing) + 1`, or 0 if the run has no steps.
    pub async fn next_step_index(&self, run_id: Uuid) -> Result<i32, DieselError> {
        let mut conn = self.pool.get().await?;

        let max_index: Option<i32> = research_steps::table
            .filter(research_steps::run_id.eq(run_id.to_string()))
            .select(diesel::dsl::max(research_steps::step_index))
            .first(&mut conn)
            .await?;

        Ok(max_index.map(|i| i + 1).unwrap_or(0))
    }

    /// All sources for a run in insertion order.
    pub async fn sources_for_run(&self, run_id: Uuid) -> Result<Vec<Source>, DieselError> {
        let mut conn = self.pool.get().await?;

        sources::table
            .filter(sources::run_id.eq(run_id.to_string()))
            .order((sources::created_at.asc(), sources::id.asc()))
            .load::<SourceRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(Source::from).collect())
    }

    /// Apply a stage's results in a single transaction.
    pub async fn commit_step(&self, commit: &StepCommit) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        let run_id = commit.step.run_id;

        conn.transaction::<(), DieselError, _>(|conn| {
            async move {
                insert_step(conn, &commit.step).await?;

                for source in &commit.new_sources {
                    insert_source(conn, source).await?;
                }

                for update in &commit.source_updates {
                    diesel::update(sources::table.find(update.id.to_string()))
                        .set((
                            sources::raw_content.eq(update.raw_content.clone()),
                            sources::summary.eq(update.summary.clone()),
                        ))
                        .execute(conn)
                        .await?;
                }

                if let Some(answer) = &commit.answer {
                    diesel::insert_into(answers::table)
                        .values((
                            answers::id.eq(answer.id.to_string()),
                            answers::run_id.eq(answer.run_id.to_string()),
                            answers::content.eq(answer.content.clone()),
                            answers::citations.eq(answer.citations.as_ref().map(to_json_text)),
                            answers::created_at.eq(answer.created_at.to_rfc3339()),
                        ))
                        .execute(conn)
                        .await?;
                }

                apply_transition(conn, run_id, commit.transition).await
            }
            .scope_boxed()
        })
        .await
    }

    /// Mark a run failed with an error message.
    pub async fn mark_run_failed(&self, run_id: Uuid, message: &str) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;

        diesel::update(research_runs::table.filter(research_runs::id.eq(run_id.to_string())))
            .set((
                research_runs::status.eq(RunStatus::Failed.as_str()),
                research_runs::error_message.eq(message),
                research_runs::updated_at.eq(chrono::Utc::now().to_rfc3339()),
            ))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Append a pipeline event. Uses its own connection so events commit
    /// independently of any stage transaction.
    pub async fn append_event(&self, event: &PipelineEvent) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(pipeline_events::table)
            .values((
                pipeline_events::id.eq(event.id.to_string()),
                pipeline_events::run_id.eq(event.run_id.to_string()),
                pipeline_events::event_type.eq(event.event_type.as_str()),
                pipeline_events::mode.eq(event.mode.as_str()),
                pipeline_events::stage.eq(event.stage.clone()),
                pipeline_events::duration_ms.eq(event.duration_ms),
                pipeline_events::error_message.eq(event.error_message.clone()),
                pipeline_events::created_at.eq(event.created_at.to_rfc3339()),
            ))
            .execute(&mut conn)
            .await?;

        Ok(())
    }
}
