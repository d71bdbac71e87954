//! Stage agents.
//!
//! Each stage turns the previous stage's output into its own, degrading
//! through [`crate::tiers::degrade`], and appends exactly one conversation
//! message before returning.

pub mod architect;
pub mod developer;
pub mod planner;
pub mod reviewer;
pub mod tester;

use crate::catalog::Category;
use crate::config::PipelineConfig;
use crate::tiers::Degraded;
use projcraft_error::Result;
use projcraft_runtime::{extract, ExtractionFailure, GenerationParams, LlmProvider, RateLimitedClient, Structured};
use serde_json::{json, Map, Value};

/// What every stage gets to see
pub struct StageContext<'a, P> {
    pub client: &'a RateLimitedClient<P>,
    pub config: &'a PipelineConfig,
    pub request: &'a str,
    pub category: Category,
}

impl<P> Clone for StageContext<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for StageContext<'_, P> {}

impl<'a, P: LlmProvider> StageContext<'a, P> {
    pub fn new(client: &'a RateLimitedClient<P>, config: &'a PipelineConfig, request: &'a str) -> Self {
        Self {
            client,
            config,
            request,
            category: Category::classify(request),
        }
    }

    /// Send a JSON prompt and return the raw reply
    pub(crate) async fn ask_text(&self, prompt: &Value, params: &GenerationParams) -> Result<String> {
        let prompt = prompt.to_string();
        tracing::debug!(prompt_chars = prompt.len(), "model call");
        self.client.call_with(&prompt, params).await
    }

    /// Send a JSON prompt and extract the structured payload of the reply
    pub(crate) async fn ask(&self, prompt: &Value, params: &GenerationParams) -> Result<Structured> {
        let text = self.ask_text(prompt, params).await?;
        extract(&text).map_err(ExtractionFailure::into_error)
    }
}

/// Conversation metadata recording which tier answered
pub(crate) fn tier_metadata<T>(result: &Degraded<T>) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("tier".into(), json!(result.tier));
    if !result.failures.is_empty() {
        let failures: Vec<String> = result.failures.iter().map(|e| e.to_string()).collect();
        metadata.insert("failures".into(), json!(failures));
    }
    metadata
}
