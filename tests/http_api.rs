//! HTTP API scenarios driven through the router.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{test_app, StaticSearch};
use inquiryos::llm::DummyLlmClient;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn app() -> (axum::Router, tempfile::TempDir) {
    test_app(
        Arc::new(DummyLlmClient::new("test-model")),
        StaticSearch::new(Vec::new()),
    )
    .await
}

fn post_json(path: &str, body: &str) -> Request<Body> {
    Request::post(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_create_then_dummy_pipeline() {
    let (app, _dir) = app().await;

    // Create
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/research-runs",
            r#"{"query": "benefits of hydration"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let run = body_json(response).await;
    assert_eq!(run["status"], "pending");
    let run_id = run["id"].as_str().unwrap().to_string();

    // Fresh run detail: only the seeded planner step
    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/api/v1/research-runs/{run_id}/detail"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let detail = body_json(response).await;
    assert_eq!(detail["steps"].as_array().unwrap().len(), 1);
    assert_eq!(detail["steps"][0]["step_index"], 0);
    assert_eq!(detail["steps"][0]["step_type"], "planner");

    // Execute in dummy mode
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/research-runs/{run_id}/execute"),
            r#"{"mode": "dummy"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let detail = body_json(response).await;

    assert_eq!(detail["status"], "completed");

    let steps = detail["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 4);
    let types: Vec<&str> = steps
        .iter()
        .map(|s| s["step_type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["planner", "searcher", "reader", "synthesizer"]);

    let sources = detail["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 3);
    for source in sources {
        assert!(source["url"].as_str().unwrap().contains("example.com"));
        assert!(!source["summary"].is_null());
    }

    let events = detail["events"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["event_type"], "started");
    assert_eq!(events[0]["mode"], "dummy");
    assert_eq!(events[1]["event_type"], "completed");
    assert_eq!(events[1]["mode"], "dummy");

    assert!(!detail["answer"].is_null());
}

#[tokio::test]
async fn test_duplicate_dummy_search_conflict() {
    let (app, _dir) = app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/research-runs",
            r#"{"query": "benefits of hydration"}"#,
        ))
        .await
        .unwrap();
    let run_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/research-runs/{run_id}/execute"),
            r#"{"mode": "dummy"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::post(format!("/api/v1/research-runs/{run_id}/search-dummy"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(
        body["detail"],
        "Search has already been run for this research run."
    );
}

#[tokio::test]
async fn test_step_wise_dummy_stages_over_http() {
    let (app, _dir) = app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/research-runs",
            r#"{"query": "rust async runtimes", "title": "Runtimes"}"#,
        ))
        .await
        .unwrap();
    let run = body_json(response).await;
    assert_eq!(run["title"], "Runtimes");
    let run_id = run["id"].as_str().unwrap().to_string();

    // Dummy synthesis before reader is a conflict
    let response = app
        .clone()
        .oneshot(
            Request::post(format!("/api/v1/research-runs/{run_id}/synthesize-dummy"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Search-dummy moves the run to running
    let response = app
        .clone()
        .oneshot(
            Request::post(format!("/api/v1/research-runs/{run_id}/search-dummy"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let detail = body_json(response).await;
    assert_eq!(detail["status"], "running");
    assert_eq!(detail["sources"].as_array().unwrap().len(), 3);

    // State projection reflects the partial pipeline
    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/api/v1/research-runs/{run_id}/state"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let state = body_json(response).await;
    assert_eq!(state["steps"]["planner"]["status"], "completed");
    assert_eq!(state["steps"]["searcher"]["status"], "completed");
    assert_eq!(state["steps"]["reader"]["status"], "pending");
    assert_eq!(state["source_count"], 3);
}

#[tokio::test]
async fn test_list_runs_with_pagination() {
    let (app, _dir) = app().await;

    for i in 0..3 {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/research-runs",
                &format!(r#"{{"query": "question {i}"}}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/v1/research-runs?limit=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let runs = body_json(response).await;
    let runs = runs.as_array().unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0]["query"], "question 2");

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/v1/research-runs?limit=2&offset=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let rest = body_json(response).await;
    assert_eq!(rest.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_execute_rejects_unknown_mode() {
    let (app, _dir) = app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/research-runs",
            r#"{"query": "hydration"}"#,
        ))
        .await
        .unwrap();
    let run_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(post_json(
            &format!("/api/v1/research-runs/{run_id}/execute"),
            r#"{"mode": "turbo"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
