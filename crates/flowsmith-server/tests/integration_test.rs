//! End-to-end tests for the flowchart HTTP API.
//!
//! Requests go through the full router with `tower::ServiceExt::oneshot`;
//! the completion service is replaced by a scripted backend.

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use flowsmith_core::{FlowchartDocument, NodeKind, generate_fallback};
use flowsmith_llm::{ChatBackend, ChatResponse, Choice, CompletionError, Locale, Message};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use flowsmith_server::handlers::SOURCE_HEADER;
use flowsmith_server::router::build_router;
use flowsmith_server::state::AppState;

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Reply {
    Text(&'static str),
    ProviderDown,
    Internal,
}

struct ScriptedBackend {
    reply: Reply,
    prompts: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl ChatBackend for ScriptedBackend {
    fn model_name(&self) -> &str {
        "scripted-model"
    }

    async fn chat(&self, messages: Vec<Message>) -> anyhow::Result<ChatResponse> {
        self.prompts.lock().unwrap().push(messages);
        match self.reply {
            Reply::Text(text) => Ok(ChatResponse {
                id: "scripted".to_string(),
                choices: vec![Choice {
                    index: 0,
                    message: Message::assistant(text),
                    finish_reason: Some("stop".to_string()),
                }],
                usage: None,
            }),
            Reply::ProviderDown => Err(CompletionError::Provider {
                status: 401,
                body: "invalid api key".to_string(),
            }
            .into()),
            Reply::Internal => anyhow::bail!("template registry poisoned"),
        }
    }
}

struct TestApp {
    router: Router,
    prompts: Arc<Mutex<Vec<Vec<Message>>>>,
}

fn test_app(reply: Reply) -> TestApp {
    let prompts = Arc::new(Mutex::new(Vec::new()));
    let backend = ScriptedBackend {
        reply,
        prompts: Arc::clone(&prompts),
    };
    TestApp {
        router: build_router(AppState::new(backend, Locale::En)),
        prompts,
    }
}

/// Sends a POST request with a raw body and returns (status, headers, json).
async fn post_raw(app: &Router, path: &str, body: String) -> (StatusCode, HeaderMap, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!(null));
    (status, headers, json)
}

async fn post_json(app: &Router, path: &str, body: Value) -> (StatusCode, HeaderMap, Value) {
    post_raw(app, path, body.to_string()).await
}

async fn generate(app: &Router, description: &str) -> (StatusCode, HeaderMap, Value) {
    post_json(app, "/api/generate-flow", json!({ "description": description })).await
}

fn source_header(headers: &HeaderMap) -> &str {
    headers
        .get(SOURCE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

fn document(body: Value) -> FlowchartDocument {
    serde_json::from_value(body).expect("response should be a flowchart document")
}

// ---------------------------------------------------------------------------
// Request validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_description_is_rejected() {
    let app = test_app(Reply::Text("{}"));

    for body in [
        json!({ "description": "" }),
        json!({ "description": "   \n" }),
        json!({}),
    ] {
        let (status, _, json) = post_json(&app.router, "/api/generate-flow", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().is_some_and(|e| !e.is_empty()));
    }

    // The completion service is never consulted.
    assert!(app.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let app = test_app(Reply::Text("{}"));
    let (status, _, json) =
        post_raw(&app.router, "/api/generate-flow", "{\"description\":".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn model_flowchart_is_returned() {
    let app = test_app(Reply::Text(
        r#"Sure! ```json
{"nodes": [
  {"id": "start", "type": "start", "data": {"label": "Start"}, "position": {"x": 250, "y": 0}},
  {"id": "review", "type": "process", "data": {"label": "Review"}, "position": {"x": 250, "y": 100}},
  {"id": "end", "type": "end", "data": {"label": "End"}, "position": {"x": 250, "y": 200}}
],
"edges": [
  {"id": "e1", "source": "start", "target": "review", "animated": true},
  {"id": "e2", "source": "review", "target": "end"}
]}
```"#,
    ));

    let (status, headers, body) = generate(&app.router, "Review a document").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(source_header(&headers), "model");

    let doc = document(body);
    assert_eq!(doc.nodes.len(), 3);
    assert_eq!(doc.edges.len(), 2);
    assert!(doc.edges[0].animated);
}

#[tokio::test]
async fn unterminated_fence_and_string_data_keep_the_model_graph() {
    let app = test_app(Reply::Text(
        r#"```json
{"nodes": [
  {"id": "s", "type": "start", "data": "Begin", "position": {"x": 0, "y": 0}},
  {"id": "e", "type": "end", "data": {"label": "Done", "type": "end"}, "position": {"x": 0, "y": 100}}
],
"edges": [{"id": "s-e", "source": "s", "target": "e"}]}"#,
    ));

    let (status, headers, body) = generate(&app.router, "anything").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(source_header(&headers), "model");
    assert_eq!(body["nodes"][0]["data"]["label"], "Begin");
    assert_eq!(body["nodes"][1]["data"]["type"], "end");
    assert_eq!(document(body).edges.len(), 1);
}

#[tokio::test]
async fn unparseable_completion_returns_fallback() {
    let app = test_app(Reply::Text("not json at all"));
    let description = "Customer places an order and pays";

    let (status, headers, body) = generate(&app.router, description).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(source_header(&headers), "fallback");
    assert_eq!(body, serde_json::to_value(generate_fallback(description)).unwrap());
}

#[tokio::test]
async fn unknown_node_type_becomes_process() {
    let app = test_app(Reply::Text(
        r#"{"nodes": [{"id": "n1", "type": "bogus", "data": {"label": "X"}, "position": {"x": 0, "y": 0}}], "edges": []}"#,
    ));

    let (status, headers, body) = generate(&app.router, "anything").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(source_header(&headers), "model");
    assert_eq!(body["nodes"][0]["type"], "process");
    assert_eq!(document(body).nodes[0].kind, NodeKind::Process);
}

#[tokio::test]
async fn dangling_edge_is_dropped() {
    let app = test_app(Reply::Text(
        r#"{"nodes": [
            {"id": "a", "type": "start", "data": {"label": "A"}, "position": {"x": 0, "y": 0}},
            {"id": "b", "type": "end", "data": {"label": "B"}, "position": {"x": 0, "y": 100}}
        ], "edges": [
            {"id": "a-b", "source": "a", "target": "b"},
            {"id": "a-ghost", "source": "a", "target": "ghost"}
        ]}"#,
    ));

    let (status, _, body) = generate(&app.router, "anything").await;
    assert_eq!(status, StatusCode::OK);
    let doc = document(body);
    assert_eq!(doc.edges.len(), 1);
    assert_eq!(doc.edges[0].id, "a-b");
}

#[tokio::test]
async fn provider_failure_returns_fallback() {
    let app = test_app(Reply::ProviderDown);
    let description = "新用户注册账号";

    let (status, headers, body) = generate(&app.router, description).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(source_header(&headers), "fallback");
    assert_eq!(document(body), generate_fallback(description));
}

#[tokio::test]
async fn internal_failure_is_a_server_error() {
    let app = test_app(Reply::Internal);

    let (status, _, body) = generate(&app.router, "anything").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("template registry poisoned"), "{}", error);
}

#[tokio::test]
async fn request_locale_selects_the_prompt_language() {
    let app = test_app(Reply::Text("not json at all"));

    let (status, _, _) = post_json(
        &app.router,
        "/api/generate-flow",
        json!({ "description": "报销流程", "locale": "zh-CN" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let prompts = app.prompts.lock().unwrap();
    let system = prompts[0][0].text_content().unwrap();
    assert!(system.starts_with("你是一个专业的流程图设计师"));
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_model() {
    let app = test_app(Reply::Text("{}"));
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json, json!({ "status": "ok", "model": "scripted-model" }));
}
