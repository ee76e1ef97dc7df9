//! HTTP handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use flowsmith_llm::{ChatBackend, Locale, generate_flowchart};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Tells the client whether the graph came from the model or the fallback.
pub const SOURCE_HEADER: &str = "x-flowchart-source";

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub locale: Option<Locale>,
}

/// Generates a flowchart from a process description.
///
/// `POST /api/generate-flow`
///
/// The description is read once here and reused if generation falls back.
pub async fn generate_flow<B: ChatBackend + 'static>(
    State(state): State<AppState<B>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let description = request
        .description
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Please provide process description".to_string()))?;
    let locale = request.locale.unwrap_or(state.default_locale);

    let request_id = Uuid::new_v4();
    let generation = generate_flowchart(state.backend.as_ref(), &description, locale)
        .instrument(info_span!("generate_flow", %request_id))
        .await?;

    info!(
        %request_id,
        source = generation.source.as_str(),
        nodes = generation.document.nodes.len(),
        edges = generation.document.edges.len(),
        "Flowchart ready"
    );

    Ok((
        [(SOURCE_HEADER, generation.source.as_str())],
        Json(generation.document),
    )
        .into_response())
}

/// Liveness probe.
///
/// `GET /api/health`
pub async fn health<B: ChatBackend + 'static>(State(state): State<AppState<B>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": state.backend.model_name(),
    }))
}
