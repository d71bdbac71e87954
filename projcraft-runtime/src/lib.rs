//! # projcraft runtime
//!
//! The pieces of the project generator that talk to the outside world.
//!
//! ## Core Concepts
//! - **Provider**: Trait-based LLM communication (OpenAI-compatible, Anthropic, Gemini, mock)
//! - **Client**: One shared rate limiter and a one-retry policy for upstream rate limits
//! - **Extract**: Recover a JSON object from chatty model output
//! - **Storage**: The workspace generated files are written to

pub mod client;
pub mod error;
pub mod extract;
pub mod provider;
pub mod storage;

pub use client::{GenerationParams, RateLimitedClient, RateLimiter, DEFAULT_COOLDOWN, DEFAULT_MIN_INTERVAL};
pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use extract::{extract, strip_code_fences, ExtractionFailure, Structured};
pub use provider::{
    AnthropicProvider, AnyProvider, ChatMessage, CompletionRequest, CompletionResponse,
    FinishReason, GeminiProvider, LlmProvider, MockProvider, OpenAIProvider, ProviderConfig,
    ProviderError, ProviderType, Role, Usage, UsageTracker,
};
pub use storage::{normalize_path, ArtifactStorage, DirWorkspace, MemoryWorkspace, Workspace};
