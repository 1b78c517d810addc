//! HTTP API for the research pipeline.
//!
//! Thin axum handlers over the orchestrator: runs are created, inspected,
//! and executed over JSON; all business rules stay in the pipeline layer.

mod error;
mod handlers;
mod routes;
mod schemas;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::pipeline::PipelineOrchestrator;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: PipelineOrchestrator,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let orchestrator = PipelineOrchestrator::from_settings(settings)?;
        Ok(Self {
            orchestrator,
            settings: Arc::new(settings.clone()),
        })
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tempfile::tempdir;
    use tower::ServiceExt;

    use crate::error::PipelineError;
    use crate::fetcher::WebFetcher;
    use crate::llm::DummyLlmClient;
    use crate::repository::{run_migrations, AsyncSqlitePool, ResearchRepository};
    use crate::search::{SearchClient, SearchResult};

    struct NoSearch;

    #[async_trait::async_trait]
    impl SearchClient for NoSearch {
        fn provider_id(&self) -> &'static str {
            "test_search"
        }

        async fn search(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<SearchResult>, PipelineError> {
            Ok(Vec::new())
        }
    }

    async fn setup_test_app() -> (axum::Router, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db_url = db_path.display().to_string();

        run_migrations(&db_url).await.unwrap();

        let repo = ResearchRepository::new(AsyncSqlitePool::new(&db_url));
        let orchestrator = PipelineOrchestrator::new(
            repo,
            Arc::new(DummyLlmClient::new("test-model")),
            Arc::new(NoSearch),
            WebFetcher::new(),
            "dummy:test-model".to_string(),
        );

        let mut settings = Settings::default();
        settings.database_url = db_url;

        let state = AppState {
            orchestrator,
            settings: Arc::new(settings),
        };

        (create_router(state), dir)
    }

    #[tokio::test]
    async fn test_health_and_ping() {
        let (app, _dir) = setup_test_app().await;

        let response = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::get("/api/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_run_validates_query() {
        let (app, _dir) = setup_test_app().await;

        let response = app
            .clone()
            .oneshot(
                Request::post("/api/v1/research-runs")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query": "   "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = app
            .oneshot(
                Request::post("/api/v1/research-runs")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query": "benefits of hydration"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_unknown_run_is_404() {
        let (app, _dir) = setup_test_app().await;

        for path in [
            "/api/v1/research-runs/not-a-uuid",
            "/api/v1/research-runs/00000000-0000-0000-0000-000000000001",
            "/api/v1/research-runs/00000000-0000-0000-0000-000000000001/detail",
            "/api/v1/research-runs/00000000-0000-0000-0000-000000000001/state",
        ] {
            let response = app
                .clone()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "path: {path}");
        }
    }
}
