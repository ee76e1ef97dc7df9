use flowsmith_core::{Rejection, Sanitized, sanitize};
use serde_json::Value;
use thiserror::Error;

use super::FallbackReason;

/// Why a completion could not be used as a flowchart.
#[derive(Debug, Error)]
pub enum CompletionFailure {
    #[error("Completion was empty")]
    Empty,

    #[error("Completion is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Completion failed flowchart validation: {0}")]
    Rejected(#[from] Rejection),
}

impl CompletionFailure {
    pub fn reason(&self) -> FallbackReason {
        match self {
            CompletionFailure::Empty => FallbackReason::EmptyResponse,
            CompletionFailure::InvalidJson(_) => FallbackReason::InvalidJson,
            CompletionFailure::Rejected(_) => FallbackReason::Rejected,
        }
    }
}

/// Extract JSON from text that may be wrapped in markdown code fences.
///
/// The opening and closing fences are stripped independently, so an
/// unterminated ```` ```json ```` block still yields its body. A fence only
/// counts as opening when it comes before the first `{` or `[`.
pub(crate) fn extract_json(text: &str) -> &str {
    let mut body = text.trim();

    let json_start = body.find(['{', '[']).unwrap_or(body.len());
    if let Some(start) = body.find("```").filter(|&start| start < json_start) {
        body = &body[start + 3..];
        body = body.strip_prefix("json").unwrap_or(body);
    }
    if let Some(end) = body.find("```") {
        body = &body[..end];
    }

    body.trim()
}

/// Turn raw completion text into a sanitized flowchart.
pub(crate) fn interpret_completion(content: &str) -> Result<Sanitized, CompletionFailure> {
    let json_str = extract_json(content);
    if json_str.is_empty() {
        return Err(CompletionFailure::Empty);
    }
    let raw: Value = serde_json::from_str(json_str)?;
    Ok(sanitize(&raw)?)
}
