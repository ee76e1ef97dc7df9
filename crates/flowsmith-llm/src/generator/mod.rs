mod parse;
mod prompt;


use crate::{ChatBackend, CompletionError};
use anyhow::Result;
use flowsmith_core::{FlowchartDocument, generate_fallback};
use parse::interpret_completion;
use prompt::flowchart_messages;
use std::fmt;
use tracing::{debug, info, warn};

pub use parse::CompletionFailure;
pub use prompt::Locale;

// ── Public types ────────────────────────────────────────────────

/// Where the returned flowchart came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationSource {
    Model,
    Fallback(FallbackReason),
}

impl GenerationSource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, GenerationSource::Fallback(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationSource::Model => "model",
            GenerationSource::Fallback(_) => "fallback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The completion service could not be reached or answered with an error.
    Provider,
    EmptyResponse,
    InvalidJson,
    /// Parsed, but structurally unusable.
    Rejected,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FallbackReason::Provider => "provider error",
            FallbackReason::EmptyResponse => "empty response",
            FallbackReason::InvalidJson => "invalid JSON",
            FallbackReason::Rejected => "failed validation",
        })
    }
}

/// Result of generating a flowchart.
#[derive(Debug)]
pub struct Generation {
    pub document: FlowchartDocument,
    pub source: GenerationSource,
    pub warnings: Vec<String>,
}

impl Generation {
    fn fallback(description: &str, reason: FallbackReason, detail: String) -> Self {
        warn!("Using fallback flowchart ({}): {}", reason, detail);
        Self {
            document: generate_fallback(description),
            source: GenerationSource::Fallback(reason),
            warnings: vec![detail],
        }
    }
}

// ── Pipeline ────────────────────────────────────────────────────

/// Generate a flowchart for `description` with the given backend.
///
/// Upstream failures (provider errors, empty or unparseable completions,
/// structurally invalid graphs) are not errors: they produce the fallback
/// flowchart. Only errors that do not come from the completion service are
/// returned. The request is attempted exactly once.
pub async fn generate_flowchart(
    backend: &impl ChatBackend,
    description: &str,
    locale: Locale,
) -> Result<Generation> {
    let messages = flowchart_messages(description, locale);

    info!(
        model = backend.model_name(),
        locale = locale.as_str(),
        "Generating flowchart for: {}",
        description
    );
    debug!(
        "Flowchart system prompt length: {} chars",
        messages[0].text_content().map_or(0, str::len)
    );

    let response = match backend.chat(messages).await {
        Ok(response) => response,
        Err(e) if is_upstream_failure(&e) => {
            return Ok(Generation::fallback(
                description,
                FallbackReason::Provider,
                format!("{:#}", e),
            ));
        }
        Err(e) => return Err(e.context("Flowchart generation failed")),
    };

    let content = response.first_text().unwrap_or_default();
    debug!("Flowchart raw output: {}", content);

    match interpret_completion(content) {
        Ok(sanitized) => {
            let warnings: Vec<String> = sanitized.warnings.iter().map(|w| w.to_string()).collect();
            info!(
                "Generated flowchart: {} nodes, {} edges, {} warnings",
                sanitized.document.nodes.len(),
                sanitized.document.edges.len(),
                warnings.len()
            );
            Ok(Generation {
                document: sanitized.into_document(),
                source: GenerationSource::Model,
                warnings,
            })
        }
        Err(failure) => Ok(Generation::fallback(
            description,
            failure.reason(),
            failure.to_string(),
        )),
    }
}

/// Whether `err` was raised by the completion service rather than by us.
pub fn is_upstream_failure(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.downcast_ref::<CompletionError>().is_some())
}
