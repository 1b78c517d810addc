//! Diesel ORM records for database tables.
//!
//! These provide compile-time type checking for queries; `From<Record>`
//! conversions rebuild the domain models. JSON columns are stored as
//! serialized TEXT and parsed leniently on the way out.

use diesel::prelude::*;
use uuid::Uuid;

use super::{parse_datetime, parse_datetime_opt};
use crate::models::{
    Answer, EventType, ExecutionMode, PipelineEvent, ResearchRun, ResearchStep, RunStatus, Source,
    StepStatus, StepType,
};
use crate::schema;

fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_json_opt(s: Option<String>) -> Option<serde_json::Value> {
    s.and_then(|s| serde_json::from_str(&s).ok())
}

/// Research run record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::research_runs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RunRecord {
    pub id: String,
    pub query: String,
    pub title: Option<String>,
    pub status: String,
    pub model_provider: String,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<RunRecord> for ResearchRun {
    fn from(record: RunRecord) -> Self {
        ResearchRun {
            id: parse_uuid(&record.id),
            query: record.query,
            title: record.title,
            status: RunStatus::from_str(&record.status).unwrap_or(RunStatus::Pending),
            model_provider: record.model_provider,
            error_message: record.error_message,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

/// Research step record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::research_steps)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StepRecord {
    pub id: String,
    pub run_id: String,
    pub step_index: i32,
    pub step_type: String,
    pub status: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub error_message: Option<String>,
    pub input: Option<String>,
    pub output: Option<String>,
    pub created_at: String,
}

impl From<StepRecord> for ResearchStep {
    fn from(record: StepRecord) -> Self {
        ResearchStep {
            id: parse_uuid(&record.id),
            run_id: parse_uuid(&record.run_id),
            step_index: record.step_index,
            step_type: StepType::from_str(&record.step_type).unwrap_or(StepType::Planner),
            status: StepStatus::from_str(&record.status).unwrap_or(StepStatus::Pending),
            started_at: parse_datetime_opt(record.started_at),
            completed_at: parse_datetime_opt(record.completed_at),
            error_message: record.error_message,
            input: parse_json_opt(record.input),
            output: parse_json_opt(record.output),
            created_at: parse_datetime(&record.created_at),
        }
    }
}

/// Source record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::sources)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SourceRecord {
    pub id: String,
    pub run_id: String,
    pub url: String,
    pub title: String,
    pub raw_content: Option<String>,
    pub summary: Option<String>,
    pub relevance_score: Option<f64>,
    pub extra_metadata: Option<String>,
    pub created_at: String,
}

impl From<SourceRecord> for Source {
    fn from(record: SourceRecord) -> Self {
        Source {
            id: parse_uuid(&record.id),
            run_id: parse_uuid(&record.run_id),
            url: record.url,
            title: record.title,
            raw_content: record.raw_content,
            summary: record.summary,
            relevance_score: record.relevance_score,
            extra_metadata: parse_json_opt(record.extra_metadata),
            created_at: parse_datetime(&record.created_at),
        }
    }
}

/// Answer record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::answers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AnswerRecord {
    pub id: String,
    pub run_id: String,
    pub content: String,
    pub citations: Option<String>,
    pub created_at: String,
}

impl From<AnswerRecord> for Answer {
    fn from(record: AnswerRecord) -> Self {
        Answer {
            id: parse_uuid(&record.id),
            run_id: parse_uuid(&record.run_id),
            content: record.content,
            citations: parse_json_opt(record.citations),
            created_at: parse_datetime(&record.created_at),
        }
    }
}

/// Pipeline event record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::pipeline_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EventRecord {
    pub id: String,
    pub run_id: String,
    pub event_type: String,
    pub mode: String,
    pub stage: Option<String>,
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
    pub created_at: String,
}

impl From<EventRecord> for PipelineEvent {
    fn from(record: EventRecord) -> Self {
        PipelineEvent {
            id: parse_uuid(&record.id),
            run_id: parse_uuid(&record.run_id),
            event_type: EventType::from_str(&record.event_type).unwrap_or(EventType::Started),
            mode: ExecutionMode::from_str(&record.mode).unwrap_or(ExecutionMode::Dummy),
            stage: record.stage,
            duration_ms: record.duration_ms,
            error_message: record.error_message,
            created_at: parse_datetime(&record.created_at),
        }
    }
}
