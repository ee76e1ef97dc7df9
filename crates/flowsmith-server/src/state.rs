//! Shared application state.
//!
//! Requests share nothing mutable: the state is the completion backend and
//! the default prompt locale, both read-only.

use std::sync::Arc;

use flowsmith_llm::{ChatBackend, Locale};

pub struct AppState<B> {
    pub backend: Arc<B>,
    pub default_locale: Locale,
}

impl<B: ChatBackend> AppState<B> {
    pub fn new(backend: B, default_locale: Locale) -> Self {
        Self {
            backend: Arc::new(backend),
            default_locale,
        }
    }
}

// Manual impl: `derive` would require `B: Clone`.
impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            default_locale: self.default_locale,
        }
    }
}
