//! Scripted provider for tests and offline runs

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::time::Instant;

type Responder = dyn Fn(&str) -> Result<String, ProviderError> + Send + Sync;

/// A provider that answers every request from a closure over the prompt.
///
/// Records the start instant and prompt of every call so tests can assert on
/// throttling and on what each stage asked for.
pub struct MockProvider {
    name: String,
    responder: Box<Responder>,
    finish_reason: FinishReason,
    calls: AtomicUsize,
    call_starts: Mutex<Vec<Instant>>,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self {
            name: "mock".to_string(),
            responder: Box::new(responder),
            finish_reason: FinishReason::Stop,
            calls: AtomicUsize::new(0),
            call_starts: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with the same text
    pub fn with_response(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Always fail with a server error
    pub fn failing() -> Self {
        Self::new(|_| {
            Err(ProviderError::Api {
                status: 500,
                message: "mock upstream failure".into(),
            })
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Report this finish reason on every successful reply
    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        self.finish_reason = reason;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Start instants of every call, in call order
    pub fn call_starts(&self) -> Vec<Instant> {
        self.call_starts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Prompts received, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_starts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Instant::now());

        let prompt = request.last_user_text().to_string();
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.clone());

        let text = (self.responder)(&prompt)?;
        Ok(CompletionResponse {
            id: format!("mock-{}", n),
            model: request.model.unwrap_or_else(|| self.default_model().to_string()),
            usage: Usage {
                prompt_tokens: prompt.len() / 4,
                completion_tokens: text.len() / 4,
                total_tokens: (prompt.len() + text.len()) / 4,
            },
            content: Some(text),
            finish_reason: self.finish_reason,
        })
    }
}
