//! # Rate-Limited Model Client
//!
//! Every model call in a process goes through one [`RateLimiter`], which
//! spaces call starts by a minimum interval. [`RateLimitedClient`] wraps a
//! provider with that limiter and a single cooldown-then-retry for upstream
//! rate limits.
//!
//! The client never panics and never lets a provider failure escape as
//! anything other than a `projcraft_error::Error` value.

use crate::error::{Error, Result};
use crate::provider::{ChatMessage, CompletionRequest, FinishReason, LlmProvider, ProviderError, UsageTracker};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default minimum spacing between call starts
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(6);

/// Default wait after an upstream rate-limit response
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Sampling parameters for a single call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: usize,
}

impl GenerationParams {
    pub const fn new(temperature: f32, max_output_tokens: usize) -> Self {
        Self {
            temperature,
            max_output_tokens,
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::new(0.3, 3000)
    }
}

// ============================================================================
// Rate limiter
// ============================================================================

/// Shared clock enforcing a minimum interval between outbound calls.
///
/// Callers queue on the inner mutex, so concurrent callers (developer
/// workers, or separate pipelines sharing one limiter) start their calls one
/// interval apart. The timestamp is taken when a call is released, not when
/// it finishes.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: tokio::sync::Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: tokio::sync::Mutex::new(None),
        }
    }

    pub fn shared(min_interval: Duration) -> Arc<Self> {
        Arc::new(Self::new(min_interval))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a call may start, then stamp the start time.
    pub async fn acquire(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                debug!(wait_ms = (ready_at - now).as_millis() as u64, "rate limiter waiting");
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Hold every caller back for `cooldown`, then stamp the start time of
    /// the retry that follows.
    pub async fn cooldown(&self, cooldown: Duration) {
        let mut last = self.last_call.lock().await;
        tokio::time::sleep(cooldown).await;
        *last = Some(Instant::now());
    }

    /// Start instant of the most recent call, if any
    pub async fn last_call_time(&self) -> Option<Instant> {
        *self.last_call.lock().await
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

// ============================================================================
// Client
// ============================================================================

/// A provider behind the shared limiter with the one-retry rate-limit policy
pub struct RateLimitedClient<P> {
    provider: P,
    limiter: Arc<RateLimiter>,
    cooldown: Duration,
    system_prompt: Option<String>,
    usage: Mutex<UsageTracker>,
}

impl<P: LlmProvider> RateLimitedClient<P> {
    pub fn new(provider: P, limiter: Arc<RateLimiter>) -> Self {
        Self {
            provider,
            limiter,
            cooldown: DEFAULT_COOLDOWN,
            system_prompt: None,
            usage: Mutex::new(UsageTracker::new()),
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Prepend a system message to every call
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Snapshot of token usage so far
    pub fn usage(&self) -> UsageTracker {
        self.usage.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Call the model with default sampling parameters
    pub async fn call(&self, prompt: &str) -> Result<String> {
        self.call_with(prompt, &GenerationParams::default()).await
    }

    /// Call the model.
    ///
    /// - waits on the shared limiter first
    /// - an upstream rate limit triggers one cooldown and one retry; a second
    ///   failure of any kind is `rate_limit_retry_failed`
    /// - a content-policy block is `content_policy_violation`, never retried
    /// - every other failure keeps the provider's message
    pub async fn call_with(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        self.limiter.acquire().await;

        let err = match self.attempt(prompt, params).await {
            Ok(text) => return Ok(text),
            Err(err) => err,
        };

        if err.is_content_policy() {
            warn!(provider = self.provider.name(), "prompt rejected by content policy");
            return Err(Error::content_policy_violation().with_operation("client::call"));
        }

        if !err.is_rate_limited() {
            return Err(err.into_error().with_operation("client::call"));
        }

        warn!(
            provider = self.provider.name(),
            cooldown_secs = self.cooldown.as_secs(),
            "rate limited, cooling down before one retry"
        );
        self.limiter.cooldown(self.cooldown).await;

        match self.attempt(prompt, params).await {
            Ok(text) => Ok(text),
            Err(retry_err) if retry_err.is_content_policy() => {
                Err(Error::content_policy_violation().with_operation("client::call"))
            }
            Err(retry_err) => Err(Error::rate_limit_retry_failed()
                .with_operation("client::call")
                .with_context("retry_error", retry_err.to_string())
                .set_source(retry_err)),
        }
    }

    async fn attempt(&self, prompt: &str, params: &GenerationParams) -> std::result::Result<String, ProviderError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(prompt));

        let request = CompletionRequest::new(messages)
            .with_temperature(params.temperature)
            .with_max_tokens(params.max_output_tokens);

        debug!(provider = self.provider.name(), prompt_chars = prompt.len(), "model call");
        let response = self.provider.complete(request).await?;

        self.usage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .track(&response.model, &response.usage);

        if response.finish_reason == FinishReason::ContentFilter {
            return Err(ProviderError::ContentPolicy("finish reason content_filter".into()));
        }

        response
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProviderError::Other("empty response from model".into()))
    }
}
