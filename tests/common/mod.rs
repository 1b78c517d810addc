//! Shared test fixtures: throwaway databases and fake collaborators.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use inquiryos::config::Settings;
use inquiryos::error::PipelineError;
use inquiryos::fetcher::WebFetcher;
use inquiryos::llm::{DummyLlmClient, GenerateOptions, LlmClient, LlmError};
use inquiryos::pipeline::PipelineOrchestrator;
use inquiryos::repository::{run_migrations, AsyncSqlitePool, ResearchRepository};
use inquiryos::search::{SearchClient, SearchResult};
use inquiryos::server::AppState;

/// LLM fake that always returns the same completion.
pub struct StaticLlm {
    pub completion: String,
}

impl StaticLlm {
    pub fn new(completion: &str) -> Arc<Self> {
        Arc::new(Self {
            completion: completion.to_string(),
        })
    }
}

#[async_trait]
impl LlmClient for StaticLlm {
    fn provider_name(&self) -> &str {
        "static"
    }

    fn model_name(&self) -> &str {
        "static-model"
    }

    async fn generate(
        &self,
        _prompt: &str,
        _options: &GenerateOptions,
    ) -> Result<String, LlmError> {
        Ok(self.completion.clone())
    }
}

/// Search fake that returns canned results.
pub struct StaticSearch {
    pub results: Vec<SearchResult>,
}

impl StaticSearch {
    pub fn new(results: Vec<(&str, &str)>) -> Arc<Self> {
        Arc::new(Self {
            results: results
                .into_iter()
                .map(|(title, url)| SearchResult {
                    title: title.to_string(),
                    url: url.to_string(),
                })
                .collect(),
        })
    }
}

#[async_trait]
impl SearchClient for StaticSearch {
    fn provider_id(&self) -> &'static str {
        "test_search"
    }

    async fn search(
        &self,
        _query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, PipelineError> {
        Ok(self.results.iter().take(limit).cloned().collect())
    }
}

/// Search fake whose backend is always down.
pub struct FailingSearch;

#[async_trait]
impl SearchClient for FailingSearch {
    fn provider_id(&self) -> &'static str {
        "test_search"
    }

    async fn search(
        &self,
        _query: &str,
        _limit: usize,
    ) -> Result<Vec<SearchResult>, PipelineError> {
        Err(PipelineError::Transport(
            "search backend unreachable".to_string(),
        ))
    }
}

/// Create a migrated throwaway database; returns its URL and guard.
pub async fn setup_db() -> (String, TempDir) {
    let dir = TempDir::new().unwrap();
    let db_url = dir.path().join("test.db").display().to_string();
    run_migrations(&db_url).await.unwrap();
    (db_url, dir)
}

/// Build an orchestrator over an existing database.
pub fn orchestrator_on(
    db_url: &str,
    llm: Arc<dyn LlmClient>,
    search: Arc<dyn SearchClient>,
) -> PipelineOrchestrator {
    let repo = ResearchRepository::new(AsyncSqlitePool::new(db_url));
    PipelineOrchestrator::new(
        repo,
        llm,
        search,
        WebFetcher::new(),
        "dummy:test-model".to_string(),
    )
}

/// Orchestrator with the dummy LLM and an empty search backend; enough
/// for everything the dummy pipeline exercises.
pub async fn dummy_orchestrator() -> (PipelineOrchestrator, TempDir) {
    let (db_url, dir) = setup_db().await;
    let orchestrator = orchestrator_on(
        &db_url,
        Arc::new(DummyLlmClient::new("test-model")),
        StaticSearch::new(Vec::new()),
    );
    (orchestrator, dir)
}

/// Router wired to a throwaway database.
pub async fn test_app(
    llm: Arc<dyn LlmClient>,
    search: Arc<dyn SearchClient>,
) -> (axum::Router, TempDir) {
    let (db_url, dir) = setup_db().await;
    let orchestrator = orchestrator_on(&db_url, llm, search);

    let mut settings = Settings::default();
    settings.database_url = db_url;

    let state = AppState {
        orchestrator,
        settings: Arc::new(settings),
    };

    (inquiryos::server::create_router(state), dir)
}
