//! # LLM Provider Interface
//!
//! A trait-based abstraction for the text-generation backends the pipeline
//! talks to.
//!
//! ## Design
//! - `LlmProvider` trait defines the core interface
//! - Implementations for OpenAI-compatible servers, Anthropic and Gemini
//! - `MockProvider` drives the pipeline in tests without touching the network
//! - `AnyProvider` picks an implementation from a `ProviderConfig` at runtime

pub mod anthropic;
pub mod gemini;
pub mod mock;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use openai::OpenAIProvider;

use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Core Types
// ============================================================================

/// A chat message sent to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Request parameters for a completion
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
    pub stop: Option<Vec<String>>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Text of the last user message, empty if there is none
    pub fn last_user_text(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub id: String,
    pub model: String,
    pub content: Option<String>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Unknown,
}

/// Token usage information
#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Error type for provider operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Network/connection error
    Network(String),
    /// API returned an error
    Api { status: u16, message: String },
    /// Failed to parse response
    Parse(String),
    /// Rate limited
    RateLimited { retry_after: Option<u64> },
    /// The prompt or the answer was blocked by a safety filter
    ContentPolicy(String),
    /// Invalid request
    InvalidRequest(String),
    /// Model not found
    ModelNotFound(String),
    /// Authentication failed
    AuthenticationFailed,
    /// Other error
    Other(String),
}

impl ProviderError {
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status == 429,
            _ => false,
        }
    }

    pub fn is_content_policy(&self) -> bool {
        matches!(self, Self::ContentPolicy(_))
    }

    /// Convert into a projcraft `Error`, keeping this value as the source.
    pub fn into_error(self) -> Error {
        let kind = match &self {
            Self::Network(_) => ErrorKind::NetworkFailed,
            Self::Api { status, .. } if *status >= 500 => ErrorKind::ProviderUnavailable,
            Self::Api { .. } => ErrorKind::InferenceFailed,
            Self::Parse(_) => ErrorKind::ParseFailed,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::ContentPolicy(_) => ErrorKind::ContentRejected,
            Self::InvalidRequest(_) => ErrorKind::InvalidArgument,
            Self::ModelNotFound(_) => ErrorKind::ConfigInvalid,
            Self::AuthenticationFailed => ErrorKind::ConfigInvalid,
            Self::Other(_) => ErrorKind::InferenceFailed,
        };
        Error::new(kind, self.to_string()).set_source(self)
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(e) => write!(f, "Network error: {}", e),
            Self::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            Self::Parse(e) => write!(f, "Parse error: {}", e),
            Self::RateLimited { retry_after } => {
                write!(f, "Rate limited")?;
                if let Some(secs) = retry_after {
                    write!(f, " (retry after {}s)", secs)?;
                }
                Ok(())
            }
            Self::ContentPolicy(reason) => write!(f, "Blocked by content policy: {}", reason),
            Self::InvalidRequest(e) => write!(f, "Invalid request: {}", e),
            Self::ModelNotFound(m) => write!(f, "Model not found: {}", m),
            Self::AuthenticationFailed => write!(f, "Authentication failed"),
            Self::Other(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ProviderError {}

/// The main LLM provider trait
#[allow(async_fn_in_trait)]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "openai", "gemini")
    fn name(&self) -> &str;

    /// Get the default model
    fn default_model(&self) -> &str;

    /// Send a completion request and get a full response
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;

    /// Simple prompt -> response helper
    async fn prompt(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)]);
        let response = self.complete(request).await?;
        response.content.ok_or_else(|| ProviderError::Other("No content in response".into()))
    }
}

/// Runtime-selected provider, built from a `ProviderConfig`
pub enum AnyProvider {
    OpenAI(OpenAIProvider),
    Anthropic(AnthropicProvider),
    Gemini(GeminiProvider),
}

impl AnyProvider {
    pub fn from_config(config: ProviderConfig) -> Result<Self, ProviderError> {
        Ok(match config.provider_type {
            ProviderType::OpenAI | ProviderType::Local => Self::OpenAI(OpenAIProvider::new(config)?),
            ProviderType::Anthropic => Self::Anthropic(AnthropicProvider::new(config)?),
            ProviderType::Gemini => Self::Gemini(GeminiProvider::new(config)?),
        })
    }
}

impl LlmProvider for AnyProvider {
    fn name(&self) -> &str {
        match self {
            Self::OpenAI(p) => p.name(),
            Self::Anthropic(p) => p.name(),
            Self::Gemini(p) => p.name(),
        }
    }

    fn default_model(&self) -> &str {
        match self {
            Self::OpenAI(p) => p.default_model(),
            Self::Anthropic(p) => p.default_model(),
            Self::Gemini(p) => p.default_model(),
        }
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        match self {
            Self::OpenAI(p) => p.complete(request).await,
            Self::Anthropic(p) => p.complete(request).await,
            Self::Gemini(p) => p.complete(request).await,
        }
    }
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for creating providers
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    pub headers: HashMap<String, String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    OpenAI,
    Anthropic,
    Gemini,
    Local,
}

impl ProviderType {
    /// Environment variable holding the API key for this provider type
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderType::OpenAI => Some("OPENAI_API_KEY"),
            ProviderType::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderType::Gemini => Some("GEMINI_API_KEY"),
            ProviderType::Local => None,
        }
    }
}

impl std::str::FromStr for ProviderType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderType::OpenAI),
            "anthropic" => Ok(ProviderType::Anthropic),
            "gemini" | "google" => Ok(ProviderType::Gemini),
            "local" => Ok(ProviderType::Local),
            other => Err(Error::config_invalid(format!("unknown provider '{}'", other))
                .with_context("provider", other)),
        }
    }
}

impl ProviderConfig {
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::OpenAI,
            api_key: Some(api_key.into()),
            base_url: Some("https://api.openai.com/v1".into()),
            default_model: Some("gpt-4o".into()),
            headers: HashMap::new(),
            timeout_secs: Some(120),
        }
    }

    pub fn anthropic(api_key: impl Into<String>) -> Self {
        let mut headers = HashMap::new();
        headers.insert("anthropic-version".into(), "2023-06-01".into());

        Self {
            provider_type: ProviderType::Anthropic,
            api_key: Some(api_key.into()),
            base_url: Some("https://api.anthropic.com/v1".into()),
            default_model: Some("claude-sonnet-4-20250514".into()),
            headers,
            timeout_secs: Some(120),
        }
    }

    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::Gemini,
            api_key: Some(api_key.into()),
            base_url: Some("https://generativelanguage.googleapis.com/v1beta".into()),
            default_model: Some("gemini-2.5-flash".into()),
            headers: HashMap::new(),
            timeout_secs: Some(120),
        }
    }

    /// An OpenAI-compatible server such as vLLM or Ollama
    pub fn local(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::Local,
            api_key: None,
            base_url: Some(base_url.into()),
            default_model: Some(model.into()),
            headers: HashMap::new(),
            timeout_secs: Some(300),
        }
    }

    /// Build a config for `provider_type`, reading the API key from the environment
    pub fn from_env(provider_type: ProviderType) -> Result<Self, Error> {
        let key = match provider_type.api_key_env() {
            Some(var) => std::env::var(var).map_err(|_| {
                Error::config_invalid(format!("{} is not set", var)).with_context("env", var)
            })?,
            None => String::new(),
        };
        Ok(match provider_type {
            ProviderType::OpenAI => Self::openai(key),
            ProviderType::Anthropic => Self::anthropic(key),
            ProviderType::Gemini => Self::gemini(key),
            ProviderType::Local => Self::local("http://localhost:11434/v1", "llama3.1"),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

/// Shared reqwest client construction for the HTTP providers
pub(crate) fn http_client(config: &ProviderConfig) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_secs.unwrap_or(120)))
        .build()
        .map_err(|e| ProviderError::Other(format!("failed to create HTTP client: {}", e)))
}

/// Map a non-success HTTP status to a provider error
pub(crate) fn status_error(status: u16, body: String) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited { retry_after: None },
        401 | 403 => ProviderError::AuthenticationFailed,
        404 => ProviderError::ModelNotFound(body),
        400 if body.to_lowercase().contains("safety") || body.to_lowercase().contains("content policy") => {
            ProviderError::ContentPolicy(body)
        }
        _ => ProviderError::Api { status, message: body },
    }
}

// ============================================================================
// Usage Tracking
// ============================================================================

/// Tracks token usage across multiple calls
#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    pub total_calls: usize,
    pub total_prompt_tokens: usize,
    pub total_completion_tokens: usize,
    pub by_model: HashMap<String, Usage>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, model: &str, usage: &Usage) {
        self.total_calls += 1;
        self.total_prompt_tokens += usage.prompt_tokens;
        self.total_completion_tokens += usage.completion_tokens;

        let entry = self.by_model.entry(model.to_string()).or_default();
        entry.prompt_tokens += usage.prompt_tokens;
        entry.completion_tokens += usage.completion_tokens;
        entry.total_tokens += usage.total_tokens;
    }

    pub fn total_tokens(&self) -> usize {
        self.total_prompt_tokens + self.total_completion_tokens
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_constructors() {
        let sys = ChatMessage::system("JSON.");
        assert_eq!(sys.role, Role::System);
        assert_eq!(sys.content, "JSON.");

        let user = ChatMessage::user("Hello");
        assert_eq!(user.role, Role::User);

        let asst = ChatMessage::assistant("Hi there!");
        assert_eq!(asst.role, Role::Assistant);
    }

    #[test]
    fn test_completion_request_builder() {
        let request = CompletionRequest::new(vec![
            ChatMessage::system("JSON."),
            ChatMessage::user("first"),
            ChatMessage::assistant("ok"),
            ChatMessage::user("second"),
        ])
        .with_model("gemini-2.5-flash")
        .with_temperature(0.3)
        .with_max_tokens(3000);

        assert_eq!(request.model, Some("gemini-2.5-flash".into()));
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.max_tokens, Some(3000));
        assert_eq!(request.last_user_text(), "second");
    }

    #[test]
    fn test_provider_config() {
        let config = ProviderConfig::openai("sk-test");
        assert_eq!(config.provider_type, ProviderType::OpenAI);
        assert_eq!(config.default_model, Some("gpt-4o".into()));

        let config = ProviderConfig::anthropic("sk-ant-test");
        assert_eq!(config.provider_type, ProviderType::Anthropic);
        assert!(config.headers.contains_key("anthropic-version"));

        let config = ProviderConfig::gemini("key").with_model("gemini-2.0-flash");
        assert_eq!(config.provider_type, ProviderType::Gemini);
        assert_eq!(config.default_model.as_deref(), Some("gemini-2.0-flash"));
    }

    #[test]
    fn test_provider_type_from_str() {
        assert_eq!("Gemini".parse::<ProviderType>().unwrap(), ProviderType::Gemini);
        assert_eq!("local".parse::<ProviderType>().unwrap(), ProviderType::Local);
        let err = "bard".parse::<ProviderType>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(status_error(429, String::new()).is_rate_limited());
        assert_eq!(status_error(401, String::new()), ProviderError::AuthenticationFailed);
        assert!(status_error(400, "blocked for SAFETY".into()).is_content_policy());
        assert!(matches!(status_error(500, "boom".into()), ProviderError::Api { status: 500, .. }));
    }

    #[test]
    fn test_provider_error_into_error() {
        let err = ProviderError::RateLimited { retry_after: Some(60) }.into_error();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert!(err.is_retryable());
        assert!(err.message().contains("retry after 60s"));

        let err = ProviderError::ContentPolicy("SAFETY".into()).into_error();
        assert_eq!(err.kind(), ErrorKind::ContentRejected);
        assert!(!err.is_retryable());

        let err = ProviderError::Api { status: 503, message: "overloaded".into() }.into_error();
        assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
    }

    #[test]
    fn test_usage_tracker() {
        let mut tracker = UsageTracker::new();

        tracker.track("gemini-2.5-flash", &Usage {
            prompt_tokens: 100,
            completion_tokens: 50,
            total_tokens: 150,
        });

        tracker.track("gemini-2.5-flash", &Usage {
            prompt_tokens: 200,
            completion_tokens: 100,
            total_tokens: 300,
        });

        assert_eq!(tracker.total_calls, 2);
        assert_eq!(tracker.total_tokens(), 450);
        assert_eq!(tracker.by_model["gemini-2.5-flash"].total_tokens, 450);
    }
}
