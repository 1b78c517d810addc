//! Stage runners: searcher, reader, and synthesizer, real and dummy.
//!
//! Every stage follows the same skeleton: load the run, check the
//! precondition matrix, allocate the next step index, do the work with
//! timestamps around it, then persist everything through one StepCommit.
//! An error raised during work commits nothing.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde_json::json;
use tokio::sync::Semaphore;
use tracing::{debug, info};
use uuid::Uuid;

use super::orchestrator::PipelineOrchestrator;
use super::synthesis;
use crate::error::{PipelineError, Result};
use crate::fetcher::{basic_summary, extract_text_from_html, truncate_chars};
use crate::llm::GenerateOptions;
use crate::models::{Answer, ResearchStep, Source, StepType};
use crate::repository::{RunTransition, SourceContentUpdate, StepCommit};

/// Bound for raw page text persisted on a source.
const MAX_RAW_CONTENT_CHARS: usize = 20_000;

/// Bound for the per-source summary.
const MAX_SUMMARY_CHARS: usize = 900;

/// Concurrent fetches allowed inside the reader stage.
const READER_CONCURRENCY: usize = 4;

/// How many per-URL failures are kept in the reader step output.
const MAX_RECORDED_FAILURES: usize = 10;

fn slugify(query: &str) -> String {
    let slug: String = query.to_lowercase().replace(' ', "-").chars().take(50).collect();
    if slug.is_empty() {
        "research-topic".to_string()
    } else {
        slug
    }
}

fn source_ids(sources: &[Source]) -> Vec<String> {
    sources.iter().map(|s| s.id.to_string()).collect()
}

impl PipelineOrchestrator {
    /// Dummy searcher: appends a completed search step plus three canned
    /// sources derived from the query. Same preconditions as the real one.
    pub async fn run_dummy_search(&self, run_id: Uuid) -> Result<()> {
        let run = self.require_run(run_id).await?;

        // Rule: don't run search twice (keeps UI and pipeline clean)
        if self.repo.has_step_type(run_id, StepType::Searcher).await? {
            return Err(PipelineError::InvalidState(
                "Search has already been run for this research run.".to_string(),
            ));
        }
        if !self.repo.has_step_type(run_id, StepType::Planner).await? {
            return Err(PipelineError::InvalidState(
                "Planner step missing; cannot run search.".to_string(),
            ));
        }

        let next_index = self.repo.next_step_index(run_id).await?;
        let now = Utc::now();

        let step = ResearchStep::completed(
            run.id,
            next_index,
            StepType::Searcher,
            now,
            now,
            Some(json!({ "query": run.query })),
            Some(json!({
                "notes": "Dummy searcher v0 - no real web search performed.",
                "hint": "Later this will hit a search API and populate real sources.",
            })),
        );

        let slug = slugify(&run.query);
        let sources = vec![
            Source::new(
                run.id,
                format!("https://example.com/articles/{slug}-overview"),
                "High-level overview related to your research question".to_string(),
            )
            .with_summary("Overview article (dummy source for dev/testing).")
            .with_relevance_score(0.9)
            .with_metadata(json!({ "source_type": "overview", "dummy": true })),
            Source::new(
                run.id,
                format!("https://example.com/blog/{slug}-tradeoffs"),
                "Discussion of tradeoffs and practical considerations".to_string(),
            )
            .with_summary("Tradeoffs and pros/cons (dummy source for dev/testing).")
            .with_relevance_score(0.8)
            .with_metadata(json!({ "source_type": "discussion", "dummy": true })),
            Source::new(
                run.id,
                format!("https://example.com/docs/{slug}-reference"),
                "Reference documentation or spec-style material".to_string(),
            )
            .with_summary("Reference-style material (dummy source for dev/testing).")
            .with_relevance_score(0.75)
            .with_metadata(json!({ "source_type": "reference", "dummy": true })),
        ];

        self.repo
            .commit_step(
                &StepCommit::new(step)
                    .with_new_sources(sources)
                    .with_transition(RunTransition::RunningIfPending),
            )
            .await?;

        info!("Dummy search committed for run {}", run_id);
        Ok(())
    }

    /// Dummy reader: stamps canned raw content and summaries on every
    /// source attached to the run.
    pub async fn run_dummy_reader(&self, run_id: Uuid) -> Result<()> {
        let run = self.require_run(run_id).await?;

        if self.repo.has_step_type(run_id, StepType::Reader).await? {
            return Err(PipelineError::InvalidState(
                "Reader has already been run for this research run.".to_string(),
            ));
        }
        if !self.repo.has_step_type(run_id, StepType::Searcher).await? {
            return Err(PipelineError::InvalidState(
                "Run search before reader.".to_string(),
            ));
        }

        let sources = self.repo.sources_for_run(run_id).await?;
        if sources.is_empty() {
            return Err(PipelineError::InvalidState(
                "No sources available to read.".to_string(),
            ));
        }

        let updates: Vec<SourceContentUpdate> = sources
            .iter()
            .map(|src| {
                let label = if src.title.trim().is_empty() {
                    &src.url
                } else {
                    &src.title
                };
                SourceContentUpdate {
                    id: src.id,
                    raw_content: format!(
                        "This is dummy fetched content for source: {label}. \
                         It simulates the full text content retrieved from the web."
                    ),
                    summary: format!(
                        "Summary for {label}. \
                         This represents a condensed version of the source content."
                    ),
                }
            })
            .collect();

        let next_index = self.repo.next_step_index(run_id).await?;
        let now = Utc::now();

        let step = ResearchStep::completed(
            run.id,
            next_index,
            StepType::Reader,
            now,
            now,
            Some(json!({ "source_ids": source_ids(&sources) })),
            Some(json!({ "source_count": sources.len() })),
        );

        self.repo
            .commit_step(
                &StepCommit::new(step)
                    .with_source_updates(updates)
                    .with_transition(RunTransition::RunningIfPending),
            )
            .await?;

        info!("Dummy reader committed for run {}", run_id);
        Ok(())
    }

    /// Dummy synthesizer: emits a templated answer listing the attached
    /// sources and completes the run.
    pub async fn run_dummy_synthesis(&self, run_id: Uuid) -> Result<()> {
        let run = self.require_run(run_id).await?;

        if self.repo.has_step_type(run_id, StepType::Synthesizer).await? {
            return Err(PipelineError::InvalidState(
                "Synthesis has already been run for this research run.".to_string(),
            ));
        }
        if !self.repo.has_step_type(run_id, StepType::Reader).await? {
            return Err(PipelineError::InvalidState(
                "Run reader before synthesis.".to_string(),
            ));
        }

        let sources = self.repo.sources_for_run(run_id).await?;

        let answer_text = if sources.is_empty() {
            "No sources are currently attached to this research run. \
             Run the searcher agent first to collect relevant sources."
                .to_string()
        } else {
            let mut lines: Vec<String> = Vec::new();
            lines.push("This is a dummy synthesized answer based on the attached sources.".into());
            lines.push(String::new());
            lines.push(format!("Research question: {}", run.query));
            lines.push(String::new());
            lines.push("The system considered the following sources:".into());
            for (idx, src) in sources.iter().enumerate() {
                let title = if src.title.trim().is_empty() {
                    &src.url
                } else {
                    &src.title
                };
                lines.push(format!("{}. {} - {}", idx + 1, title, src.url));
                if let Some(summary) = src.summary.as_deref().map(str::trim) {
                    if !summary.is_empty() {
                        lines.push(format!("   Summary: {summary}"));
                    }
                }
            }
            lines.push(String::new());
            lines.push(
                "A proper LLM-backed synthesizer will later read and compare these \
                 sources in detail to produce a nuanced, citation-rich answer."
                    .into(),
            );
            lines.join("\n")
        };

        let next_index = self.repo.next_step_index(run_id).await?;
        let now = Utc::now();

        let step = ResearchStep::completed(
            run.id,
            next_index,
            StepType::Synthesizer,
            now,
            now,
            Some(json!({ "source_ids": source_ids(&sources) })),
            Some(json!({
                "answer": answer_text,
                "notes": "Dummy synthesizer v0 - no real LLM call performed.",
                "source_count": sources.len(),
            })),
        );

        let answer = Answer::new(run.id, answer_text, None);

        self.repo
            .commit_step(
                &StepCommit::new(step)
                    .with_answer(answer)
                    .with_transition(RunTransition::Completed),
            )
            .await?;

        info!("Dummy synthesis committed for run {}", run_id);
        Ok(())
    }

    /// Real searcher: queries the search client and persists one source
    /// per result, in provider order.
    pub async fn run_web_search(&self, run_id: Uuid, limit: usize) -> Result<()> {
        let run = self.require_run(run_id).await?;

        if self.repo.has_step_type(run_id, StepType::Searcher).await? {
            return Err(PipelineError::InvalidState(
                "Search has already been run for this research run.".to_string(),
            ));
        }
        if !self.repo.has_step_type(run_id, StepType::Planner).await? {
            return Err(PipelineError::InvalidState(
                "Planner step missing; cannot run search.".to_string(),
            ));
        }

        let started_at = Utc::now();
        let results = self.search.search(&run.query, limit).await?;
        debug!("Search returned {} results for run {}", results.len(), run_id);

        let provider = self.search.provider_id();
        let sources: Vec<Source> = results
            .iter()
            .map(|r| {
                Source::new(run.id, r.url.clone(), r.title.clone())
                    .with_metadata(json!({ "provider": provider }))
            })
            .collect();

        let next_index = self.repo.next_step_index(run_id).await?;

        let step = ResearchStep::completed(
            run.id,
            next_index,
            StepType::Searcher,
            started_at,
            Utc::now(),
            Some(json!({ "query": run.query, "limit": limit })),
            Some(json!({ "result_count": results.len(), "provider": provider })),
        );

        self.repo
            .commit_step(
                &StepCommit::new(step)
                    .with_new_sources(sources)
                    .with_transition(RunTransition::RunningIfPending),
            )
            .await?;

        info!("Web search committed for run {}", run_id);
        Ok(())
    }

    /// Real reader: fetches unread sources with bounded parallelism.
    ///
    /// Per-URL failures (unsafe URL, transport, empty extraction) are
    /// recorded in the step output and never fail the stage; only
    /// catastrophic errors (database) propagate.
    pub async fn run_web_reader(&self, run_id: Uuid, limit: usize) -> Result<()> {
        let run = self.require_run(run_id).await?;

        if !self.repo.has_step_type(run_id, StepType::Searcher).await? {
            return Err(PipelineError::InvalidState(
                "Run search before reader.".to_string(),
            ));
        }
        if self.repo.has_step_type(run_id, StepType::Reader).await? {
            return Err(PipelineError::InvalidState(
                "Reader has already been run for this research run.".to_string(),
            ));
        }

        let sources = self.repo.sources_for_run(run_id).await?;

        // Read only sources that don't have raw_content yet
        let to_read: Vec<&Source> = sources
            .iter()
            .filter(|s| s.raw_content.is_none())
            .take(limit)
            .collect();

        let started_at = Utc::now();
        let next_index = self.repo.next_step_index(run_id).await?;

        if to_read.is_empty() {
            let step = ResearchStep::completed(
                run.id,
                next_index,
                StepType::Reader,
                started_at,
                Utc::now(),
                Some(json!({ "limit": limit })),
                Some(json!({
                    "attempted": 0,
                    "read_count": 0,
                    "failed_count": 0,
                    "failed": [],
                    "notes": "No unread sources found.",
                })),
            );
            self.repo
                .commit_step(
                    &StepCommit::new(step).with_transition(RunTransition::RunningIfPending),
                )
                .await?;
            return Ok(());
        }

        // Concurrent read with bounded parallelism; keep it small so we
        // don't hammer sites.
        let semaphore = Arc::new(Semaphore::new(READER_CONCURRENCY));

        let reads = to_read.iter().map(|src| {
            let semaphore = Arc::clone(&semaphore);
            let fetcher = self.fetcher.clone();
            let id = src.id;
            let url = src.url.clone();

            async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(err) => return Err((url, format!("Unexpected error: {err}"))),
                };

                let page = match fetcher.fetch_html(&url).await {
                    Ok(page) => page,
                    Err(err) => return Err((url, err.to_string())),
                };

                let text = extract_text_from_html(&page.html);
                let cleaned = text.trim();
                if cleaned.is_empty() {
                    return Err((url, "Empty extracted text".to_string()));
                }

                Ok((
                    id,
                    truncate_chars(cleaned, MAX_RAW_CONTENT_CHARS),
                    basic_summary(cleaned, MAX_SUMMARY_CHARS),
                ))
            }
        });

        let outcomes = join_all(reads).await;

        let mut updates: Vec<SourceContentUpdate> = Vec::new();
        let mut failed: Vec<serde_json::Value> = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok((id, raw_content, summary)) => updates.push(SourceContentUpdate {
                    id,
                    raw_content,
                    summary,
                }),
                Err((url, error)) => failed.push(json!({ "url": url, "error": error })),
            }
        }

        let attempted = to_read.len();
        let read_count = updates.len();
        debug!(
            "Reader for run {}: {}/{} pages read, {} failed",
            run_id,
            read_count,
            attempted,
            failed.len()
        );

        // Completed even if partial; failures are recorded as data
        let step = ResearchStep::completed(
            run.id,
            next_index,
            StepType::Reader,
            started_at,
            Utc::now(),
            Some(json!({ "limit": limit })),
            Some(json!({
                "attempted": attempted,
                "read_count": read_count,
                "failed_count": failed.len(),
                "failed": failed.iter().take(MAX_RECORDED_FAILURES).collect::<Vec<_>>(),
            })),
        );

        self.repo
            .commit_step(
                &StepCommit::new(step)
                    .with_source_updates(updates)
                    .with_transition(RunTransition::RunningIfPending),
            )
            .await?;

        info!("Web reader committed for run {}", run_id);
        Ok(())
    }

    /// Real synthesizer: builds a cited-evidence prompt, calls the LLM,
    /// validates the completion, enforces citations, and completes the run.
    pub async fn run_llm_synthesis(&self, run_id: Uuid) -> Result<()> {
        let run = self.require_run(run_id).await?;

        if self.repo.has_step_type(run_id, StepType::Synthesizer).await? {
            return Err(PipelineError::InvalidState(
                "Synthesis has already been run for this research run.".to_string(),
            ));
        }
        if !self.repo.has_step_type(run_id, StepType::Reader).await? {
            return Err(PipelineError::InvalidState(
                "Run reader before synthesis.".to_string(),
            ));
        }

        let sources = self.repo.sources_for_run(run_id).await?;
        if sources.is_empty() {
            return Err(PipelineError::InvalidState(
                "No sources available for synthesis.".to_string(),
            ));
        }

        let context = synthesis::build_context(&sources);
        let prompt = synthesis::build_prompt(&run.query, &context);

        let started_at = Utc::now();
        let next_index = self.repo.next_step_index(run_id).await?;

        let raw_completion = self
            .llm
            .generate(
                &prompt,
                &GenerateOptions::default().with_max_tokens(synthesis::SYNTHESIS_MAX_TOKENS),
            )
            .await
            .map_err(PipelineError::from)?;

        let (mut payload, parse_error) = synthesis::parse_completion(&raw_completion);
        let report = synthesis::enforce_citations(&mut payload, sources.len());

        payload["_meta"] = json!({
            "raw_completion": raw_completion,
            "parse_error": parse_error,
            "source_count": sources.len(),
            "unique_sources_cited": report.unique_sources_cited,
            "coverage_ratio": report.coverage_ratio,
        });

        let summary_text = payload
            .get("summary")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();

        let citations: serde_json::Map<String, serde_json::Value> = report
            .cited_indices
            .iter()
            .filter_map(|n| {
                sources
                    .get(n - 1)
                    .map(|src| (n.to_string(), json!(src.id.to_string())))
            })
            .collect();

        let step = ResearchStep::completed(
            run.id,
            next_index,
            StepType::Synthesizer,
            started_at,
            Utc::now(),
            Some(json!({
                "source_ids": source_ids(&sources),
                "model_provider": run.model_provider,
            })),
            Some(payload),
        );

        let answer = Answer::new(
            run.id,
            summary_text,
            Some(serde_json::Value::Object(citations)),
        );

        self.repo
            .commit_step(
                &StepCommit::new(step)
                    .with_answer(answer)
                    .with_transition(RunTransition::Completed),
            )
            .await?;

        info!("LLM synthesis committed for run {}", run_id);
        Ok(())
    }
}
